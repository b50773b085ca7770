//! Declarative org layout files.
//!
//! ```toml
//! company = "Acme"
//! owners = ["ada@example.com"]
//!
//! [[contacts]]
//! name = "Ada"
//! email = "ada@example.com"
//!
//! [[workspaces]]
//! name = "Sales"
//! admins = ["ada@example.com"]
//! senior_managers = []
//!
//! [[workspaces.clients]]
//! name = "Globex"
//! account_managers = ["ada@example.com"]
//! recipients = []
//! ```
//!
//! People are referenced by email, matched case-insensitively against the
//! store's contacts after any imports have run.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use shared::{domain::ContactId, error::ErrorNotice};
use storage::{Outcome, StateStore};
use tracing::warn;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Layout {
    pub company: Option<String>,
    #[serde(default)]
    pub contacts: Vec<LayoutContact>,
    #[serde(default)]
    pub owners: Vec<String>,
    #[serde(default)]
    pub workspaces: Vec<LayoutWorkspace>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutContact {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutWorkspace {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub admins: Vec<String>,
    #[serde(default)]
    pub senior_managers: Vec<String>,
    #[serde(default)]
    pub clients: Vec<LayoutClient>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutClient {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub account_managers: Vec<String>,
    #[serde(default)]
    pub recipients: Vec<String>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct LayoutSummary {
    pub contacts_added: usize,
    pub workspaces: usize,
    pub clients: usize,
    pub assignments: usize,
    /// One message per entry that could not be applied.
    pub skipped: Vec<String>,
}

impl LayoutSummary {
    fn count(&mut self, outcome: Outcome) {
        if outcome.is_applied() {
            self.assignments += 1;
        }
    }
}

pub fn parse_layout(raw: &str) -> Result<Layout> {
    toml::from_str(raw).context("invalid layout file")
}

pub async fn load_layout(path: &Path) -> Result<Layout> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read layout file '{}'", path.display()))?;
    parse_layout(&raw).with_context(|| format!("in layout file '{}'", path.display()))
}

/// Adds the layout's contacts, workspaces, and clients to `store` and assigns
/// roles. Entries naming unknown people are skipped and reported.
pub fn apply_layout(store: &mut StateStore, layout: &Layout) -> LayoutSummary {
    let mut summary = LayoutSummary::default();

    if let Some(company) = &layout.company {
        store.set_company_name(company.trim());
    }

    for contact in &layout.contacts {
        match store.add_contact_checked(&contact.name, &contact.email) {
            Ok(_) => summary.contacts_added += 1,
            Err(error) => {
                warn!(email = %contact.email, %error, "skipping layout contact");
                summary.skipped.push(ErrorNotice::from(error).message);
            }
        }
    }

    for email in &layout.owners {
        if let Some(contact_id) = resolve(store, email, &mut summary) {
            let outcome = store.assign_owner(contact_id);
            summary.count(outcome);
        }
    }

    for workspace in &layout.workspaces {
        let workspace_id = store.add_workspace();
        store.rename_workspace(workspace_id, workspace.name.trim());
        summary.workspaces += 1;

        for email in &workspace.admins {
            if let Some(contact_id) = resolve(store, email, &mut summary) {
                let outcome = store.assign_workspace_admin(workspace_id, contact_id);
                summary.count(outcome);
            }
        }
        for email in &workspace.senior_managers {
            if let Some(contact_id) = resolve(store, email, &mut summary) {
                let outcome = store.assign_senior_manager(workspace_id, contact_id);
                summary.count(outcome);
            }
        }

        for client in &workspace.clients {
            let Some(client_id) = store.add_client(workspace_id) else {
                continue;
            };
            store.rename_client(workspace_id, client_id, client.name.trim());
            summary.clients += 1;

            for email in &client.account_managers {
                if let Some(contact_id) = resolve(store, email, &mut summary) {
                    let outcome = store.assign_account_manager(workspace_id, client_id, contact_id);
                    summary.count(outcome);
                }
            }
            for email in &client.recipients {
                if let Some(contact_id) = resolve(store, email, &mut summary) {
                    let outcome = store.assign_recipient(workspace_id, client_id, contact_id);
                    summary.count(outcome);
                }
            }
        }
    }

    summary
}

fn resolve(store: &StateStore, email: &str, summary: &mut LayoutSummary) -> Option<ContactId> {
    let found = store.find_contact_by_email(email).map(|c| c.id);
    if found.is_none() {
        warn!(%email, "layout references an unknown contact");
        summary.skipped.push(format!("no contact with email {email}"));
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        company = "Acme"
        owners = ["ada@example.com", "ghost@example.com"]

        [[contacts]]
        name = "Ada"
        email = "ada@example.com"

        [[contacts]]
        name = "Bob"
        email = "BOB@example.com"

        [[contacts]]
        name = "Broken"
        email = "not-an-email"

        [[workspaces]]
        name = "Sales"
        admins = ["ada@example.com"]
        senior_managers = ["bob@example.com", "bob@example.com"]

        [[workspaces.clients]]
        name = "Globex"
        account_managers = ["bob@example.com"]
        recipients = ["ada@example.com", "contact@example.com"]

        [[workspaces]]
        name = "Support"
    "#;

    #[test]
    fn applies_a_full_layout() {
        let layout = parse_layout(SAMPLE).expect("parse");
        let mut store = StateStore::new();
        let summary = apply_layout(&mut store, &layout);

        assert_eq!(summary.contacts_added, 2);
        assert_eq!(summary.workspaces, 2);
        assert_eq!(summary.clients, 1);
        // owner, admin, senior manager (once), account manager, two recipients
        assert_eq!(summary.assignments, 6);
        assert_eq!(summary.skipped.len(), 2);

        let state = store.state();
        assert_eq!(state.company_name, "Acme");
        assert_eq!(state.workspaces[0].name, "Sales");
        assert_eq!(state.workspaces[0].clients[0].name, "Globex");
        assert_eq!(state.workspaces[1].name, "Support");
        assert_eq!(state.workspace_senior_manager_assignments.len(), 1);
        assert_eq!(state.recipient_assignments.len(), 2);
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(parse_layout("compnay = \"typo\"").is_err());
    }

    #[test]
    fn empty_layout_changes_nothing() {
        let layout = parse_layout("").expect("parse");
        let mut store = StateStore::new();
        let before = store.snapshot();
        let summary = apply_layout(&mut store, &layout);
        assert_eq!(summary, LayoutSummary::default());
        assert_eq!(*before, *store.snapshot());
    }
}
