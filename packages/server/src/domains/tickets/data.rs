use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::rules::validate_quantity;
use crate::common::{ParticipantId, ValidationErrors};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTicketRequest {
    pub participant_id: ParticipantId,
    pub quantity: i32,
    #[serde(default)]
    pub purchased_at: Option<DateTime<Utc>>,
}

/// Partial update. The check-in flag is not editable here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTicketRequest {
    #[serde(default)]
    pub participant_id: Option<ParticipantId>,
    #[serde(default)]
    pub quantity: Option<i32>,
    #[serde(default)]
    pub purchased_at: Option<DateTime<Utc>>,
}

impl CreateTicketRequest {
    pub fn validate(self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_quantity(self.quantity, &mut errors);
        errors.finish(self)
    }
}

impl UpdateTicketRequest {
    pub fn validate(self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(quantity) = self.quantity {
            validate_quantity(quantity, &mut errors);
        }
        errors.finish(self)
    }

    pub fn is_empty(&self) -> bool {
        self.participant_id.is_none() && self.quantity.is_none() && self.purchased_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_checks_quantity() {
        let request = CreateTicketRequest {
            participant_id: ParticipantId::new(),
            quantity: 3,
            purchased_at: None,
        };
        assert!(request.validate().unwrap_err().has("quantity"));
    }

    #[test]
    fn update_without_quantity_is_valid() {
        let request = UpdateTicketRequest::default();
        assert!(request.is_empty());
        assert!(request.validate().is_ok());

        let bad = UpdateTicketRequest {
            quantity: Some(0),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn deserializes_from_json() {
        let id = ParticipantId::new();
        let json = format!(r#"{{"participant_id":"{}","quantity":2}}"#, id);
        let request: CreateTicketRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(request.participant_id, id);
        assert_eq!(request.quantity, 2);
        assert!(request.purchased_at.is_none());
    }
}
