//! Illustrative SQL for the current layout. Never executed; the schema is
//! fictional:
//!
//! - `users(id, name, email)`
//! - `pulse_companies(id, name)`
//! - `pulse_workspaces(id, company_id, name)`
//! - `pulse_clients(id, workspace_id, name)`
//! - `pulse_user_companies(user_id, company_id, role)`
//! - `pulse_workspace_user(workspace_id, user_id, role)`
//! - `pulse_user_clients(client_id, user_id, role)`
//! - `pulse_client_recipients(client_id, user_id, role)`

use std::collections::HashSet;

use shared::domain::{AppState, ClientAssignment, ContactId, WorkspaceAssignment};

/// The company is a singleton, so its id is fixed.
pub const COMPANY_ID: u32 = 1;

const UNTITLED_COMPANY: &str = "Untitled Company";
const UNTITLED_WORKSPACE: &str = "Untitled Workspace";
const UNTITLED_CLIENT: &str = "Untitled Client";

/// Renders `state` as INSERT statements in a fixed section order. Rows follow
/// the store's insertion order, so the same state always yields the same text.
pub fn generate_sql(state: &AppState) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push("-- Company".into());
    lines.push(format!(
        "INSERT INTO pulse_companies (id, name) VALUES ({COMPANY_ID}, {});",
        sql_literal(or_default(&state.company_name, UNTITLED_COMPANY))
    ));
    lines.push(String::new());

    lines.push("-- Users (with roles)".into());
    let with_roles = contacts_with_roles(state);
    for contact in state.contacts.iter().filter(|c| with_roles.contains(&c.id)) {
        lines.push(format!(
            "INSERT INTO users (id, name, email) VALUES ({}, {}, {});",
            sql_literal(&contact.id.to_string()),
            sql_literal(&contact.name),
            sql_literal(&contact.email)
        ));
    }
    lines.push(String::new());

    lines.push("-- Workspaces".into());
    for workspace in &state.workspaces {
        let workspace_id = workspace.id.to_string();
        lines.push(format!(
            "INSERT INTO pulse_workspaces (id, company_id, name) VALUES ({}, {COMPANY_ID}, {});",
            sql_literal(&workspace_id),
            sql_literal(or_default(&workspace.name, UNTITLED_WORKSPACE))
        ));
        for client in &workspace.clients {
            lines.push(format!(
                "INSERT INTO pulse_clients (id, workspace_id, name) VALUES ({}, {}, {});",
                sql_literal(&client.id.to_string()),
                sql_literal(&workspace_id),
                sql_literal(or_default(&client.name, UNTITLED_CLIENT))
            ));
        }
    }
    lines.push(String::new());

    lines.push("-- Company Owner Assignments".into());
    for row in &state.owner_assignments {
        lines.push(format!(
            "INSERT INTO pulse_user_companies (user_id, company_id, role) VALUES ({}, {COMPANY_ID}, {});",
            sql_literal(&row.contact_id.to_string()),
            sql_literal(row.role.as_str())
        ));
    }
    lines.push(String::new());

    workspace_section(
        &mut lines,
        "-- Workspace Admin Assignments",
        &state.workspace_admin_assignments,
    );
    workspace_section(
        &mut lines,
        "-- Workspace Senior Manager Assignments",
        &state.workspace_senior_manager_assignments,
    );
    client_section(
        &mut lines,
        "-- Client Account Manager Assignments",
        "pulse_user_clients",
        &state.account_manager_assignments,
    );
    client_section(
        &mut lines,
        "-- Client Recipient Assignments",
        "pulse_client_recipients",
        &state.recipient_assignments,
    );

    lines.push(
        "-- NOTE: This SQL is illustrative only and may need adaptation for actual schema constraints."
            .into(),
    );

    lines.join("\n")
}

fn workspace_section(lines: &mut Vec<String>, heading: &str, rows: &[WorkspaceAssignment]) {
    lines.push(heading.to_string());
    for row in rows {
        lines.push(format!(
            "INSERT INTO pulse_workspace_user (workspace_id, user_id, role) VALUES ({}, {}, {});",
            sql_literal(&row.workspace_id.to_string()),
            sql_literal(&row.contact_id.to_string()),
            sql_literal(row.role.as_str())
        ));
    }
    lines.push(String::new());
}

fn client_section(lines: &mut Vec<String>, heading: &str, table: &str, rows: &[ClientAssignment]) {
    lines.push(heading.to_string());
    for row in rows {
        lines.push(format!(
            "INSERT INTO {table} (client_id, user_id, role) VALUES ({}, {}, {});",
            sql_literal(&row.client_id.to_string()),
            sql_literal(&row.contact_id.to_string()),
            sql_literal(row.role.as_str())
        ));
    }
    lines.push(String::new());
}

fn contacts_with_roles(state: &AppState) -> HashSet<ContactId> {
    state
        .owner_assignments
        .iter()
        .map(|a| a.contact_id)
        .chain(
            state
                .workspace_admin_assignments
                .iter()
                .chain(&state.workspace_senior_manager_assignments)
                .map(|a| a.contact_id),
        )
        .chain(
            state
                .account_manager_assignments
                .iter()
                .chain(&state.recipient_assignments)
                .map(|a| a.contact_id),
        )
        .collect()
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

/// Single-quoted SQL string literal; embedded quotes are doubled.
pub fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
#[path = "tests/sql_tests.rs"]
mod tests;
