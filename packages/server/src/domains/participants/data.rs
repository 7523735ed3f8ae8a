//! Request and response shapes for the participant API.

use serde::{Deserialize, Serialize};

use super::models::Participant;
use crate::common::validation::{is_cpf, is_ra, is_rf};
use crate::common::ValidationErrors;
use crate::domains::checkins::models::Checkin;
use crate::domains::tickets::models::Ticket;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateParticipantRequest {
    pub name: String,
    pub cpf: String,
    #[serde(default)]
    pub ra: Option<String>,
    #[serde(default)]
    pub rf: Option<String>,
}

/// Partial update. A blank `ra` or `rf` clears the field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateParticipantRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cpf: Option<String>,
    #[serde(default)]
    pub ra: Option<String>,
    #[serde(default)]
    pub rf: Option<String>,
}

/// Trimmed, checked participant fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewParticipant {
    pub name: String,
    pub cpf: String,
    pub ra: Option<String>,
    pub rf: Option<String>,
}

/// Checked update. `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipantChanges {
    pub name: Option<String>,
    pub cpf: Option<String>,
    pub ra: Option<Option<String>>,
    pub rf: Option<Option<String>>,
}

fn check_name(name: &str, errors: &mut ValidationErrors) -> String {
    let name = name.trim();
    if name.is_empty() {
        errors.add("name", "name is required");
    }
    name.to_string()
}

fn check_cpf(cpf: &str, errors: &mut ValidationErrors) -> String {
    let cpf = cpf.trim();
    if !is_cpf(cpf) {
        errors.add("cpf", "CPF must have exactly 11 digits");
    }
    cpf.to_string()
}

fn check_optional(
    value: Option<&str>,
    field: &str,
    message: &str,
    valid: fn(&str) -> bool,
    errors: &mut ValidationErrors,
) -> Option<String> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    if !valid(value) {
        errors.add(field, message);
    }
    Some(value.to_string())
}

const RA_MESSAGE: &str = "RA must have exactly 6 digits";
const RF_MESSAGE: &str = "RF must have exactly 4 digits";

impl CreateParticipantRequest {
    pub fn validate(&self) -> Result<NewParticipant, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = check_name(&self.name, &mut errors);
        let cpf = check_cpf(&self.cpf, &mut errors);
        let ra = check_optional(self.ra.as_deref(), "ra", RA_MESSAGE, is_ra, &mut errors);
        let rf = check_optional(self.rf.as_deref(), "rf", RF_MESSAGE, is_rf, &mut errors);

        errors.finish(NewParticipant { name, cpf, ra, rf })
    }
}

impl UpdateParticipantRequest {
    pub fn validate(&self) -> Result<ParticipantChanges, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = self.name.as_deref().map(|n| check_name(n, &mut errors));
        let cpf = self.cpf.as_deref().map(|c| check_cpf(c, &mut errors));
        let ra = self
            .ra
            .as_deref()
            .map(|ra| check_optional(Some(ra), "ra", RA_MESSAGE, is_ra, &mut errors));
        let rf = self
            .rf
            .as_deref()
            .map(|rf| check_optional(Some(rf), "rf", RF_MESSAGE, is_rf, &mut errors));

        errors.finish(ParticipantChanges { name, cpf, ra, rf })
    }
}

impl ParticipantChanges {
    pub fn apply(self, participant: &mut Participant) {
        if let Some(name) = self.name {
            participant.name = name;
        }
        if let Some(cpf) = self.cpf {
            participant.cpf = cpf;
        }
        if let Some(ra) = self.ra {
            participant.ra = ra;
        }
        if let Some(rf) = self.rf {
            participant.rf = rf;
        }
    }
}

/// A participant together with everything recorded against them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantDetail {
    #[serde(flatten)]
    pub participant: Participant,
    pub tickets: Vec<Ticket>,
    pub checkins: Vec<Checkin>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub q: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(name: &str, cpf: &str, ra: Option<&str>, rf: Option<&str>) -> CreateParticipantRequest {
        CreateParticipantRequest {
            name: name.to_string(),
            cpf: cpf.to_string(),
            ra: ra.map(str::to_string),
            rf: rf.map(str::to_string),
        }
    }

    #[test]
    fn valid_create_is_trimmed() {
        let new = create("  Ana Souza ", " 11111111111 ", Some("123456"), Some(""))
            .validate()
            .unwrap();
        assert_eq!(
            new,
            NewParticipant {
                name: "Ana Souza".into(),
                cpf: "11111111111".into(),
                ra: Some("123456".into()),
                rf: None,
            }
        );
    }

    #[test]
    fn every_bad_field_is_reported() {
        let errors = create(" ", "111.111.111-11", Some("12345"), Some("12a4"))
            .validate()
            .unwrap_err();
        assert!(errors.has("name"));
        assert!(errors.has("cpf"));
        assert!(errors.has("ra"));
        assert!(errors.has("rf"));
        assert_eq!(errors.fields().len(), 4);
    }

    #[test]
    fn update_blank_optional_clears() {
        let changes = UpdateParticipantRequest {
            ra: Some("".into()),
            rf: Some("0420".into()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(changes.ra, Some(None));
        assert_eq!(changes.rf, Some(Some("0420".into())));
        assert_eq!(changes.name, None);
        assert_eq!(changes.cpf, None);
    }

    #[test]
    fn update_rejects_bad_cpf() {
        let errors = UpdateParticipantRequest {
            cpf: Some("123".into()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert!(errors.has("cpf"));
    }

    #[test]
    fn apply_changes() {
        let mut participant = Participant::new("Ana".into(), "11111111111".into(), Some("123456".into()), None);
        ParticipantChanges {
            name: Some("Ana Maria".into()),
            ra: Some(None),
            rf: Some(Some("1234".into())),
            ..Default::default()
        }
        .apply(&mut participant);

        assert_eq!(participant.name, "Ana Maria");
        assert_eq!(participant.cpf, "11111111111");
        assert_eq!(participant.ra, None);
        assert_eq!(participant.rf.as_deref(), Some("1234"));
    }
}
