use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PartnerType {
    Supplier,
    Customer,
}

/// A supplier or customer. Referenced by id from transactions and orders;
/// deleting a partner does not cascade into either.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partner {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub partner_type: PartnerType,
    pub contact: String,
    pub address: String,
    pub email: String,
}

impl Partner {
    pub fn new(
        name: impl Into<String>,
        partner_type: PartnerType,
        contact: impl Into<String>,
        address: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            partner_type,
            contact: contact.into(),
            address: address.into(),
            email: email.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partner_type_uses_wire_spelling() {
        assert_eq!(PartnerType::Supplier.to_string(), "SUPPLIER");
        let json = serde_json::to_string(&PartnerType::Customer).unwrap();
        assert_eq!(json, "\"CUSTOMER\"");
    }
}
