//! Wire types for the external contacts directory.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEmailAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryContact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email_addresses: Vec<DirectoryEmailAddress>,
}

impl DirectoryContact {
    /// The address of the first email entry. A contact whose first entry has
    /// no address yields `None`, even when later entries do.
    pub fn primary_email(&self) -> Option<&str> {
        self.email_addresses
            .first()
            .and_then(|e| e.address.as_deref())
            .filter(|address| !address.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryPage {
    #[serde(default)]
    pub value: Vec<DirectoryContact>,
    #[serde(
        rename = "@odata.nextLink",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub next_link: Option<String>,
}

impl DirectoryPage {
    /// The continuation link, ignoring an empty string.
    pub fn continuation(&self) -> Option<&str> {
        self.next_link.as_deref().filter(|link| !link.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_page_with_next_link_and_missing_fields() {
        let raw = r#"{
            "value": [
                {"id": "1", "displayName": "Alpha", "emailAddresses": [{"address": "alpha@example.com"}]},
                {"id": "2", "displayName": "NoEmail"}
            ],
            "@odata.nextLink": "https://graph.microsoft.com/v1.0/me/contacts?$skip=50"
        }"#;
        let page: DirectoryPage = serde_json::from_str(raw).expect("decode page");
        assert_eq!(page.value.len(), 2);
        assert_eq!(page.value[0].primary_email(), Some("alpha@example.com"));
        assert_eq!(page.value[1].primary_email(), None);
        assert!(page.continuation().is_some());
    }

    #[test]
    fn primary_email_only_considers_the_first_entry() {
        let raw = r#"{"emailAddresses": [{}, {"address": "second@example.com"}]}"#;
        let contact: DirectoryContact = serde_json::from_str(raw).expect("decode contact");
        assert_eq!(contact.primary_email(), None);

        let contact = DirectoryContact {
            id: None,
            display_name: None,
            email_addresses: vec![
                DirectoryEmailAddress {
                    address: Some(String::new()),
                },
                DirectoryEmailAddress {
                    address: Some("second@example.com".into()),
                },
            ],
        };
        assert_eq!(contact.primary_email(), None);
    }

    #[test]
    fn empty_next_link_is_not_a_continuation() {
        let page: DirectoryPage =
            serde_json::from_str(r#"{"value": [], "@odata.nextLink": ""}"#).expect("decode");
        assert_eq!(page.continuation(), None);
    }
}
