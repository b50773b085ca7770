//! Read-only views derived from an [`AppState`] snapshot.

use shared::domain::AppState;

mod sql;

pub use sql::{generate_sql, sql_literal, COMPANY_ID};

/// Pretty-printed JSON of the whole state, keys in camelCase.
pub fn state_json(state: &AppState) -> serde_json::Result<String> {
    serde_json::to_string_pretty(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::{CompanyAssignment, Contact, ContactId, Role};

    #[test]
    fn state_json_uses_camel_case_keys() {
        let contact_id = ContactId::new();
        let state = AppState {
            company_name: "Acme".into(),
            contacts: vec![Contact {
                id: contact_id,
                name: "Ada".into(),
                email: "ada@example.com".into(),
            }],
            owner_assignments: vec![CompanyAssignment {
                contact_id,
                role: Role::Owner,
            }],
            ..AppState::default()
        };

        let json = state_json(&state).expect("serialize");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(value["companyName"], "Acme");
        assert_eq!(value["ownerAssignments"][0]["contactId"], contact_id.to_string());
        assert_eq!(value["ownerAssignments"][0]["role"], "Owner");
        assert!(value["workspaceSeniorManagerAssignments"].is_array());
        assert!(value["recipientAssignments"].is_array());
    }
}
