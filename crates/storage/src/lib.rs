use std::{collections::HashSet, sync::Arc};

use shared::{
    domain::{
        AppState, CandidateContact, Client, ClientAssignment, ClientId, CompanyAssignment,
        Contact, ContactId, Role, Workspace, WorkspaceAssignment, WorkspaceId,
    },
    email::{is_valid_email, normalize_email},
    error::ValidationError,
};
use tokio::sync::watch;
use tracing::{debug, info};

pub const SEED_CONTACT_NAME: &str = "Example User";
pub const SEED_CONTACT_EMAIL: &str = "contact@example.com";

/// Whether a mutation produced a new snapshot. Operations on ids that do not
/// exist, or that would duplicate an existing row, report `Unchanged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Unchanged,
}

impl Outcome {
    pub fn is_applied(self) -> bool {
        self == Outcome::Applied
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkspaceRole {
    Admin,
    SeniorManager,
}

impl WorkspaceRole {
    fn role(self) -> Role {
        match self {
            WorkspaceRole::Admin => Role::WorkspaceAdmin,
            WorkspaceRole::SeniorManager => Role::SeniorManager,
        }
    }

    fn table(self, state: &mut AppState) -> &mut Vec<WorkspaceAssignment> {
        match self {
            WorkspaceRole::Admin => &mut state.workspace_admin_assignments,
            WorkspaceRole::SeniorManager => &mut state.workspace_senior_manager_assignments,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClientRole {
    AccountManager,
    Recipient,
}

impl ClientRole {
    fn role(self) -> Role {
        match self {
            ClientRole::AccountManager => Role::AccountManager,
            ClientRole::Recipient => Role::Recipient,
        }
    }

    fn table(self, state: &mut AppState) -> &mut Vec<ClientAssignment> {
        match self {
            ClientRole::AccountManager => &mut state.account_manager_assignments,
            ClientRole::Recipient => &mut state.recipient_assignments,
        }
    }
}

/// Single source of truth for the organization layout.
///
/// Each applied mutation builds the next [`AppState`] and swaps it in as a new
/// snapshot; snapshots handed out earlier are never touched. Observers get
/// every applied snapshot through [`StateStore::subscribe`].
#[derive(Debug)]
pub struct StateStore {
    state: Arc<AppState>,
    seed_contact_id: ContactId,
    updates: watch::Sender<Arc<AppState>>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    pub fn new() -> Self {
        let seed_contact_id = ContactId::new();
        let state = Arc::new(seed_state(seed_contact_id));
        let (updates, _) = watch::channel(Arc::clone(&state));
        Self {
            state,
            seed_contact_id,
            updates,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn snapshot(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<AppState>> {
        self.updates.subscribe()
    }

    pub fn seed_contact_id(&self) -> ContactId {
        self.seed_contact_id
    }

    /// Lowercased emails of every current contact.
    pub fn existing_emails(&self) -> HashSet<String> {
        self.state
            .contacts
            .iter()
            .map(|c| normalize_email(&c.email))
            .collect()
    }

    pub fn find_contact_by_email(&self, email: &str) -> Option<&Contact> {
        let wanted = normalize_email(email);
        self.state
            .contacts
            .iter()
            .find(|c| normalize_email(&c.email) == wanted)
    }

    fn apply(&mut self, op: &'static str, mutate: impl FnOnce(&mut AppState) -> bool) -> Outcome {
        let mut next = AppState::clone(&self.state);
        if !mutate(&mut next) {
            debug!(op, "mutation left state unchanged");
            return Outcome::Unchanged;
        }
        self.commit(next);
        debug!(op, "state updated");
        Outcome::Applied
    }

    fn commit(&mut self, next: AppState) {
        self.state = Arc::new(next);
        self.updates.send_replace(Arc::clone(&self.state));
    }

    pub fn set_company_name(&mut self, name: impl Into<String>) -> Outcome {
        let name = name.into();
        self.apply("set_company_name", |state| {
            if state.company_name == name {
                return false;
            }
            state.company_name = name;
            true
        })
    }

    pub fn add_contact(&mut self, name: impl Into<String>, email: impl Into<String>) -> ContactId {
        let id = ContactId::new();
        let contact = Contact {
            id,
            name: name.into(),
            email: email.into(),
        };
        self.apply("add_contact", |state| {
            state.contacts.push(contact);
            true
        });
        id
    }

    /// Add-contact form path: trims both fields and rejects blank fields,
    /// malformed emails, and emails already held by a contact.
    pub fn add_contact_checked(
        &mut self,
        name: &str,
        email: &str,
    ) -> Result<ContactId, ValidationError> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if email.is_empty() {
            return Err(ValidationError::MissingField("email"));
        }
        if !is_valid_email(email) {
            return Err(ValidationError::InvalidEmail(email.to_string()));
        }
        if self.existing_emails().contains(&normalize_email(email)) {
            return Err(ValidationError::DuplicateEmail(email.to_string()));
        }
        Ok(self.add_contact(name, email))
    }

    /// Bulk add. Every candidate gets a fresh id; no de-duplication happens
    /// here.
    pub fn import_contacts(
        &mut self,
        candidates: impl IntoIterator<Item = CandidateContact>,
    ) -> Vec<ContactId> {
        let contacts: Vec<Contact> = candidates
            .into_iter()
            .map(|c| Contact {
                id: ContactId::new(),
                name: c.name,
                email: c.email,
            })
            .collect();
        let ids: Vec<ContactId> = contacts.iter().map(|c| c.id).collect();
        self.apply("import_contacts", |state| {
            if contacts.is_empty() {
                return false;
            }
            state.contacts.extend(contacts);
            true
        });
        info!(count = ids.len(), "imported contacts");
        ids
    }

    pub fn remove_contact(&mut self, contact_id: ContactId) -> Outcome {
        self.apply("remove_contact", |state| {
            let mut changed = retain_changed(&mut state.contacts, |c| c.id != contact_id);
            changed |= retain_changed(&mut state.owner_assignments, |a| a.contact_id != contact_id);
            changed |= retain_changed(&mut state.workspace_admin_assignments, |a| {
                a.contact_id != contact_id
            });
            changed |= retain_changed(&mut state.workspace_senior_manager_assignments, |a| {
                a.contact_id != contact_id
            });
            changed |= retain_changed(&mut state.account_manager_assignments, |a| {
                a.contact_id != contact_id
            });
            changed |= retain_changed(&mut state.recipient_assignments, |a| {
                a.contact_id != contact_id
            });
            changed
        })
    }

    pub fn add_workspace(&mut self) -> WorkspaceId {
        let id = WorkspaceId::new();
        self.apply("add_workspace", |state| {
            state.workspaces.push(Workspace {
                id,
                name: String::new(),
                clients: Vec::new(),
            });
            true
        });
        id
    }

    pub fn rename_workspace(
        &mut self,
        workspace_id: WorkspaceId,
        name: impl Into<String>,
    ) -> Outcome {
        let name = name.into();
        self.apply("rename_workspace", |state| {
            match state.workspaces.iter_mut().find(|w| w.id == workspace_id) {
                Some(workspace) if workspace.name != name => {
                    workspace.name = name;
                    true
                }
                _ => false,
            }
        })
    }

    /// Removes the workspace, its clients, and every assignment scoped to
    /// either.
    pub fn remove_workspace(&mut self, workspace_id: WorkspaceId) -> Outcome {
        self.apply("remove_workspace", |state| {
            let Some(index) = state.workspaces.iter().position(|w| w.id == workspace_id) else {
                return false;
            };
            let removed = state.workspaces.remove(index);
            let client_ids: HashSet<ClientId> = removed.clients.iter().map(|c| c.id).collect();

            state
                .workspace_admin_assignments
                .retain(|a| a.workspace_id != workspace_id);
            state
                .workspace_senior_manager_assignments
                .retain(|a| a.workspace_id != workspace_id);
            state
                .account_manager_assignments
                .retain(|a| !client_ids.contains(&a.client_id));
            state
                .recipient_assignments
                .retain(|a| !client_ids.contains(&a.client_id));
            debug!(%workspace_id, clients = client_ids.len(), "cascaded workspace removal");
            true
        })
    }

    /// Returns `None` and changes nothing when the workspace does not exist.
    pub fn add_client(&mut self, workspace_id: WorkspaceId) -> Option<ClientId> {
        let id = ClientId::new();
        self.apply("add_client", |state| {
            match state.workspaces.iter_mut().find(|w| w.id == workspace_id) {
                Some(workspace) => {
                    workspace.clients.push(Client {
                        id,
                        name: String::new(),
                    });
                    true
                }
                None => false,
            }
        })
        .is_applied()
        .then_some(id)
    }

    pub fn rename_client(
        &mut self,
        workspace_id: WorkspaceId,
        client_id: ClientId,
        name: impl Into<String>,
    ) -> Outcome {
        let name = name.into();
        self.apply("rename_client", |state| {
            let client = state
                .workspaces
                .iter_mut()
                .find(|w| w.id == workspace_id)
                .and_then(|w| w.clients.iter_mut().find(|c| c.id == client_id));
            match client {
                Some(client) if client.name != name => {
                    client.name = name;
                    true
                }
                _ => false,
            }
        })
    }

    pub fn remove_client(&mut self, workspace_id: WorkspaceId, client_id: ClientId) -> Outcome {
        self.apply("remove_client", |state| {
            let Some(workspace) = state.workspaces.iter_mut().find(|w| w.id == workspace_id) else {
                return false;
            };
            if !retain_changed(&mut workspace.clients, |c| c.id != client_id) {
                return false;
            }
            state
                .account_manager_assignments
                .retain(|a| a.client_id != client_id);
            state.recipient_assignments.retain(|a| a.client_id != client_id);
            true
        })
    }

    pub fn assign_owner(&mut self, contact_id: ContactId) -> Outcome {
        self.apply("assign_owner", |state| {
            if state.contact(contact_id).is_none()
                || state
                    .owner_assignments
                    .iter()
                    .any(|a| a.contact_id == contact_id)
            {
                return false;
            }
            state.owner_assignments.push(CompanyAssignment {
                contact_id,
                role: Role::Owner,
            });
            true
        })
    }

    pub fn assign_workspace_admin(
        &mut self,
        workspace_id: WorkspaceId,
        contact_id: ContactId,
    ) -> Outcome {
        self.assign_in_workspace(WorkspaceRole::Admin, workspace_id, contact_id)
    }

    pub fn assign_senior_manager(
        &mut self,
        workspace_id: WorkspaceId,
        contact_id: ContactId,
    ) -> Outcome {
        self.assign_in_workspace(WorkspaceRole::SeniorManager, workspace_id, contact_id)
    }

    pub fn assign_account_manager(
        &mut self,
        workspace_id: WorkspaceId,
        client_id: ClientId,
        contact_id: ContactId,
    ) -> Outcome {
        self.assign_in_client(ClientRole::AccountManager, workspace_id, client_id, contact_id)
    }

    pub fn assign_recipient(
        &mut self,
        workspace_id: WorkspaceId,
        client_id: ClientId,
        contact_id: ContactId,
    ) -> Outcome {
        self.assign_in_client(ClientRole::Recipient, workspace_id, client_id, contact_id)
    }

    fn assign_in_workspace(
        &mut self,
        scope: WorkspaceRole,
        workspace_id: WorkspaceId,
        contact_id: ContactId,
    ) -> Outcome {
        self.apply("assign_workspace_role", |state| {
            if state.contact(contact_id).is_none() || state.workspace(workspace_id).is_none() {
                return false;
            }
            let table = scope.table(state);
            if table
                .iter()
                .any(|a| a.workspace_id == workspace_id && a.contact_id == contact_id)
            {
                return false;
            }
            table.push(WorkspaceAssignment {
                workspace_id,
                contact_id,
                role: scope.role(),
            });
            true
        })
    }

    fn assign_in_client(
        &mut self,
        scope: ClientRole,
        workspace_id: WorkspaceId,
        client_id: ClientId,
        contact_id: ContactId,
    ) -> Outcome {
        self.apply("assign_client_role", |state| {
            let client_known = state
                .workspace(workspace_id)
                .is_some_and(|w| w.has_client(client_id));
            if !client_known || state.contact(contact_id).is_none() {
                return false;
            }
            let table = scope.table(state);
            if table
                .iter()
                .any(|a| a.client_id == client_id && a.contact_id == contact_id)
            {
                return false;
            }
            table.push(ClientAssignment {
                client_id,
                contact_id,
                role: scope.role(),
            });
            true
        })
    }

    pub fn remove_owner_assignment(&mut self, contact_id: ContactId) -> Outcome {
        self.apply("remove_owner_assignment", |state| {
            retain_changed(&mut state.owner_assignments, |a| a.contact_id != contact_id)
        })
    }

    pub fn remove_workspace_admin_assignment(
        &mut self,
        workspace_id: WorkspaceId,
        contact_id: ContactId,
    ) -> Outcome {
        self.unassign_in_workspace(WorkspaceRole::Admin, workspace_id, contact_id)
    }

    pub fn remove_senior_manager_assignment(
        &mut self,
        workspace_id: WorkspaceId,
        contact_id: ContactId,
    ) -> Outcome {
        self.unassign_in_workspace(WorkspaceRole::SeniorManager, workspace_id, contact_id)
    }

    pub fn remove_account_manager_assignment(
        &mut self,
        client_id: ClientId,
        contact_id: ContactId,
    ) -> Outcome {
        self.unassign_in_client(ClientRole::AccountManager, client_id, contact_id)
    }

    pub fn remove_recipient_assignment(
        &mut self,
        client_id: ClientId,
        contact_id: ContactId,
    ) -> Outcome {
        self.unassign_in_client(ClientRole::Recipient, client_id, contact_id)
    }

    fn unassign_in_workspace(
        &mut self,
        scope: WorkspaceRole,
        workspace_id: WorkspaceId,
        contact_id: ContactId,
    ) -> Outcome {
        self.apply("remove_workspace_role", |state| {
            retain_changed(scope.table(state), |a| {
                !(a.workspace_id == workspace_id && a.contact_id == contact_id)
            })
        })
    }

    fn unassign_in_client(
        &mut self,
        scope: ClientRole,
        client_id: ClientId,
        contact_id: ContactId,
    ) -> Outcome {
        self.apply("remove_client_role", |state| {
            retain_changed(scope.table(state), |a| {
                !(a.client_id == client_id && a.contact_id == contact_id)
            })
        })
    }

    /// Back to the initial seed: no company name, the seed contact, nothing
    /// else. The seed contact keeps the same id across resets.
    pub fn reset(&mut self) {
        self.commit(seed_state(self.seed_contact_id));
        info!("state reset to seed");
    }
}

fn seed_state(seed_contact_id: ContactId) -> AppState {
    AppState {
        contacts: vec![Contact {
            id: seed_contact_id,
            name: SEED_CONTACT_NAME.to_string(),
            email: SEED_CONTACT_EMAIL.to_string(),
        }],
        ..AppState::default()
    }
}

fn retain_changed<T>(items: &mut Vec<T>, keep: impl FnMut(&T) -> bool) -> bool {
    let before = items.len();
    items.retain(keep);
    items.len() != before
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
