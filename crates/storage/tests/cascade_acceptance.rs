use std::collections::HashSet;

use shared::domain::{AppState, ClientId, ContactId, WorkspaceId};
use storage::StateStore;

/// Every assignment row must point at a live contact and a live scope.
fn assert_no_dangling_references(state: &AppState) {
    let contacts: HashSet<ContactId> = state.contacts.iter().map(|c| c.id).collect();
    let workspaces: HashSet<WorkspaceId> = state.workspaces.iter().map(|w| w.id).collect();
    let clients: HashSet<ClientId> = state
        .workspaces
        .iter()
        .flat_map(|w| w.clients.iter().map(|c| c.id))
        .collect();

    for row in &state.owner_assignments {
        assert!(contacts.contains(&row.contact_id), "dangling owner row");
    }
    for row in state
        .workspace_admin_assignments
        .iter()
        .chain(&state.workspace_senior_manager_assignments)
    {
        assert!(contacts.contains(&row.contact_id), "dangling workspace contact");
        assert!(workspaces.contains(&row.workspace_id), "dangling workspace scope");
    }
    for row in state
        .account_manager_assignments
        .iter()
        .chain(&state.recipient_assignments)
    {
        assert!(contacts.contains(&row.contact_id), "dangling client contact");
        assert!(clients.contains(&row.client_id), "dangling client scope");
    }
}

fn assert_no_duplicate_rows(state: &AppState) {
    let owners: HashSet<_> = state.owner_assignments.iter().map(|a| a.contact_id).collect();
    assert_eq!(owners.len(), state.owner_assignments.len());
    for table in [
        &state.workspace_admin_assignments,
        &state.workspace_senior_manager_assignments,
    ] {
        let pairs: HashSet<_> = table.iter().map(|a| (a.workspace_id, a.contact_id)).collect();
        assert_eq!(pairs.len(), table.len());
    }
    for table in [&state.account_manager_assignments, &state.recipient_assignments] {
        let pairs: HashSet<_> = table.iter().map(|a| (a.client_id, a.contact_id)).collect();
        assert_eq!(pairs.len(), table.len());
    }
}

/// Small deterministic generator so the operation mix is reproducible.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: usize) -> usize {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 33) as usize) % bound.max(1)
    }
}

#[test]
fn mixed_operation_sequences_never_leave_dangling_or_duplicate_rows() {
    for seed in 1..=20u64 {
        let mut rng = Lcg(seed);
        let mut store = StateStore::new();

        for step in 0..300 {
            let state = store.snapshot();
            let contact = (!state.contacts.is_empty())
                .then(|| state.contacts[rng.next(state.contacts.len())].id);
            let workspace = (!state.workspaces.is_empty())
                .then(|| &state.workspaces[rng.next(state.workspaces.len())]);
            let client = workspace.and_then(|w| {
                (!w.clients.is_empty()).then(|| w.clients[rng.next(w.clients.len())].id)
            });
            let workspace_id = workspace.map(|w| w.id);

            match rng.next(14) {
                0 => {
                    store.add_contact(format!("Person {step}"), format!("p{step}@example.com"));
                }
                1 => {
                    store.add_workspace();
                }
                2 => {
                    if let Some(ws) = workspace_id {
                        store.add_client(ws);
                    }
                }
                3 => {
                    if let Some(c) = contact {
                        store.assign_owner(c);
                    }
                }
                4 => {
                    if let (Some(ws), Some(c)) = (workspace_id, contact) {
                        store.assign_workspace_admin(ws, c);
                    }
                }
                5 => {
                    if let (Some(ws), Some(c)) = (workspace_id, contact) {
                        store.assign_senior_manager(ws, c);
                    }
                }
                6 | 7 => {
                    if let (Some(ws), Some(cl), Some(c)) = (workspace_id, client, contact) {
                        store.assign_account_manager(ws, cl, c);
                        store.assign_recipient(ws, cl, c);
                    }
                }
                8 => {
                    if let Some(c) = contact {
                        store.remove_contact(c);
                        assert!(!store.state().has_any_role(c));
                    }
                }
                9 => {
                    if let Some(w) = workspace {
                        let client_ids: Vec<ClientId> = w.clients.iter().map(|c| c.id).collect();
                        store.remove_workspace(w.id);
                        let after = store.state();
                        assert!(after
                            .workspace_admin_assignments
                            .iter()
                            .chain(&after.workspace_senior_manager_assignments)
                            .all(|a| a.workspace_id != w.id));
                        assert!(after
                            .account_manager_assignments
                            .iter()
                            .chain(&after.recipient_assignments)
                            .all(|a| !client_ids.contains(&a.client_id)));
                    }
                }
                10 => {
                    if let (Some(ws), Some(cl)) = (workspace_id, client) {
                        store.remove_client(ws, cl);
                    }
                }
                11 => {
                    if let (Some(cl), Some(c)) = (client, contact) {
                        store.remove_recipient_assignment(cl, c);
                    }
                }
                12 => {
                    if let Some(ws) = workspace_id {
                        store.rename_workspace(ws, format!("Workspace {step}"));
                    }
                }
                _ => {
                    if rng.next(10) == 0 {
                        store.reset();
                        assert!(store.state().workspaces.is_empty());
                        assert!(!store.state().contacts.is_empty());
                    }
                }
            }

            assert_no_dangling_references(store.state());
            assert_no_duplicate_rows(store.state());
        }
    }
}
