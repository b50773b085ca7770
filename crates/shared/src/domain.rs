use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_newtype!(ContactId);
id_newtype!(WorkspaceId);
id_newtype!(ClientId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Owner,
    WorkspaceAdmin,
    SeniorManager,
    AccountManager,
    Recipient,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Owner => "Owner",
            Role::WorkspaceAdmin => "WorkspaceAdmin",
            Role::SeniorManager => "SeniorManager",
            Role::AccountManager => "AccountManager",
            Role::Recipient => "Recipient",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    pub email: String,
}

/// A `{name, email}` pair produced by an importer; it gets an id only once it
/// is merged into the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateContact {
    pub name: String,
    pub email: String,
}

impl CandidateContact {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    pub clients: Vec<Client>,
}

impl Workspace {
    pub fn has_client(&self, client_id: ClientId) -> bool {
        self.clients.iter().any(|c| c.id == client_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyAssignment {
    pub contact_id: ContactId,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceAssignment {
    pub workspace_id: WorkspaceId,
    pub contact_id: ContactId,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientAssignment {
    pub client_id: ClientId,
    pub contact_id: ContactId,
    pub role: Role,
}

/// Root aggregate. Every field is replaced wholesale on reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub company_name: String,
    pub contacts: Vec<Contact>,
    pub workspaces: Vec<Workspace>,
    pub owner_assignments: Vec<CompanyAssignment>,
    pub workspace_admin_assignments: Vec<WorkspaceAssignment>,
    pub workspace_senior_manager_assignments: Vec<WorkspaceAssignment>,
    pub account_manager_assignments: Vec<ClientAssignment>,
    pub recipient_assignments: Vec<ClientAssignment>,
}

impl AppState {
    pub fn contact(&self, contact_id: ContactId) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.id == contact_id)
    }

    pub fn workspace(&self, workspace_id: WorkspaceId) -> Option<&Workspace> {
        self.workspaces.iter().find(|w| w.id == workspace_id)
    }

    /// True when the contact appears in any of the five assignment tables.
    pub fn has_any_role(&self, contact_id: ContactId) -> bool {
        self.owner_assignments
            .iter()
            .any(|a| a.contact_id == contact_id)
            || self
                .workspace_admin_assignments
                .iter()
                .chain(&self.workspace_senior_manager_assignments)
                .any(|a| a.contact_id == contact_id)
            || self
                .account_manager_assignments
                .iter()
                .chain(&self.recipient_assignments)
                .any(|a| a.contact_id == contact_id)
    }
}
