use super::*;

use std::{
    env, fs,
    time::{SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use client_core::{DirectoryError, DirectoryOptions, PageFetcher};
use shared::protocol::{DirectoryContact, DirectoryEmailAddress, DirectoryPage};

struct OnePageFetcher {
    page: DirectoryPage,
}

#[async_trait]
impl PageFetcher for OnePageFetcher {
    async fn fetch_page(&self, _link: &str, _token: &str) -> Result<DirectoryPage, DirectoryError> {
        Ok(self.page.clone())
    }
}

fn importer(emails: &[&str]) -> ContactImporter {
    let value = emails
        .iter()
        .map(|email| DirectoryContact {
            id: None,
            display_name: None,
            email_addresses: vec![DirectoryEmailAddress {
                address: Some(email.to_string()),
            }],
        })
        .collect();
    let page = DirectoryPage {
        value,
        next_link: None,
    };
    ContactImporter::new(Arc::new(OnePageFetcher { page }), DirectoryOptions::default())
}

fn temp_file(stem: &str, ext: &str, contents: &str) -> PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("onboard_{stem}_{suffix}.{ext}"));
    fs::write(&path, contents).expect("write temp file");
    path
}

#[test]
fn cli_parses_sources_for_each_view() {
    let cli = Cli::try_parse_from([
        "onboard", "--config", "custom.toml", "sql", "--csv", "people.csv", "--directory",
    ])
    .expect("parse");
    assert_eq!(cli.config, PathBuf::from("custom.toml"));
    let Command::Sql(sources) = cli.command else {
        panic!("expected sql subcommand");
    };
    assert_eq!(sources.csv, Some(PathBuf::from("people.csv")));
    assert!(sources.directory);
    assert_eq!(sources.layout, None);

    let cli = Cli::try_parse_from(["onboard", "state", "--layout", "org.toml"]).expect("parse");
    assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
    assert!(matches!(cli.command, Command::State(ref s) if s.layout.is_some() && !s.directory));
}

#[tokio::test]
async fn assembles_imports_then_layout() {
    let csv = temp_file("people", "csv", "name,email\nAda,ada@example.com\nBob,bob@example.com\n");
    let layout = temp_file(
        "layout",
        "toml",
        r#"
        company = "Acme"
        owners = ["ada@example.com"]

        [[workspaces]]
        name = "Sales"
        admins = ["dir@example.com"]
        "#,
    );
    let sources = Sources {
        csv: Some(csv.clone()),
        directory: true,
        layout: Some(layout.clone()),
    };

    let mut store = StateStore::new();
    assemble(&mut store, &importer(&["dir@example.com", "ADA@example.com"]), &sources, "token")
        .await
        .expect("assemble");

    let state = store.state();
    // seed + two csv rows + one new directory contact
    assert_eq!(state.contacts.len(), 4);
    assert_eq!(state.company_name, "Acme");
    assert_eq!(state.owner_assignments.len(), 1);
    assert_eq!(state.workspace_admin_assignments.len(), 1);

    let sql = projection::generate_sql(state);
    assert!(sql.contains("'Acme'"));
    assert!(sql.contains("'Sales'"));

    fs::remove_file(csv).expect("cleanup");
    fs::remove_file(layout).expect("cleanup");
}

#[tokio::test]
async fn failed_imports_do_not_abort() {
    let sources = Sources {
        csv: Some(env::temp_dir().join("onboard_missing_input.csv")),
        directory: true,
        layout: None,
    };
    let mut store = StateStore::new();
    assemble(&mut store, &importer(&["dir@example.com"]), &sources, "  ")
        .await
        .expect("import errors are reported, not returned");
    assert_eq!(store.state().contacts.len(), 1);
}

#[tokio::test]
async fn missing_layout_file_is_an_error() {
    let sources = Sources {
        layout: Some(env::temp_dir().join("onboard_missing_layout.toml")),
        ..Sources::default()
    };
    let mut store = StateStore::new();
    let err = assemble(&mut store, &importer(&[]), &sources, "")
        .await
        .expect_err("layout read fails");
    assert!(err.to_string().contains("failed to read layout file"));
}
