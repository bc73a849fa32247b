use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::models::{OrderStatus, OrderType, TransactionType};

/// Domain events emitted by the services after each successful mutation.
///
/// Purely observational: no consumer is required for correctness. The feed
/// exists so a UI shell or audit sink can react to ledger changes without
/// polling the collections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Catalog events
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),

    // Ledger events
    TransactionRecorded {
        transaction_id: Uuid,
        tx_type: TransactionType,
        line_count: usize,
    },
    TransactionUpdated(Uuid),
    TransactionDeleted(Uuid),

    // Order events
    OrderCreated(Uuid),
    OrderUpdated(Uuid),
    OrderDeleted(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: OrderStatus,
        new_status: OrderStatus,
    },
    OrderFulfilled {
        order_id: Uuid,
        order_type: OrderType,
        transaction_id: Uuid,
    },

    // Opname events
    OpnameCompleted {
        opname_id: Uuid,
        adjusted_products: usize,
    },
    OpnameDrafted(Uuid),

    // Partner / location events
    PartnerCreated(Uuid),
    PartnerUpdated(Uuid),
    PartnerDeleted(Uuid),
    LocationCreated(Uuid),
    LocationDeleted(Uuid),

    // Account events
    UserCreated(String),
    UserUpdated(String),
    UserDeleted(String),
    UserLoggedIn(String),
    UserLoggedOut(String),

    SettingsUpdated,
    DataReset,
}

/// A recorded event with its emission timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event: Event,
    pub emitted_at: DateTime<Utc>,
}

const EVENT_LOG_CAPACITY: usize = 1024;

/// In-process event feed. Synchronous outbox: sends append to a bounded log
/// that the host application drains at its own pace; the oldest entries are
/// dropped once the capacity is reached.
#[derive(Debug, Clone, Default)]
pub struct EventSender {
    log: Arc<Mutex<VecDeque<EventEnvelope>>>,
}

impl EventSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event to the feed. Never fails; emission must not be able
    /// to veto a mutation that already happened.
    pub fn send(&self, event: Event) {
        debug!(?event, "domain event");
        let mut log = self.log.lock();
        if log.len() == EVENT_LOG_CAPACITY {
            log.pop_front();
        }
        log.push_back(EventEnvelope {
            event,
            emitted_at: Utc::now(),
        });
    }

    /// Removes and returns everything emitted since the last drain.
    pub fn drain(&self) -> Vec<EventEnvelope> {
        self.log.lock().drain(..).collect()
    }

    pub fn pending(&self) -> usize {
        self.log.lock().len()
    }
}
