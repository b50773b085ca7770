use std::{fs, path::Path};

use client_core::directory::{DEFAULT_CONTACTS_PATH, DEFAULT_DIRECTORY_BASE_URL, DEFAULT_PAGE_CAP};
use client_core::DirectoryOptions;
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "onboard.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub directory_base_url: String,
    pub directory_contacts_path: String,
    pub directory_page_cap: usize,
    pub directory_access_token: Option<String>,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            directory_base_url: DEFAULT_DIRECTORY_BASE_URL.into(),
            directory_contacts_path: DEFAULT_CONTACTS_PATH.into(),
            directory_page_cap: DEFAULT_PAGE_CAP,
            directory_access_token: None,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn directory_options(&self) -> DirectoryOptions {
        DirectoryOptions {
            first_link: self.directory_contacts_path.clone(),
            page_cap: self.directory_page_cap,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    directory_base_url: Option<String>,
    directory_contacts_path: Option<String>,
    directory_page_cap: Option<usize>,
    directory_access_token: Option<String>,
    log_filter: Option<String>,
}

/// Defaults, then the TOML file at `path` (if present), then environment.
pub fn load_settings(path: &Path) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file(&mut settings, file_cfg),
            Err(error) => {
                warn!(path = %path.display(), %error, "ignoring unparseable settings file")
            }
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.directory_base_url {
        settings.directory_base_url = v;
    }
    if let Some(v) = file_cfg.directory_contacts_path {
        settings.directory_contacts_path = v;
    }
    if let Some(v) = file_cfg.directory_page_cap {
        settings.directory_page_cap = v;
    }
    if let Some(v) = file_cfg.directory_access_token {
        settings.directory_access_token = Some(v);
    }
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("DIRECTORY_BASE_URL") {
        settings.directory_base_url = v;
    }
    if let Some(v) = var("APP__DIRECTORY_BASE_URL") {
        settings.directory_base_url = v;
    }

    if let Some(v) = var("DIRECTORY_CONTACTS_PATH") {
        settings.directory_contacts_path = v;
    }
    if let Some(v) = var("APP__DIRECTORY_CONTACTS_PATH") {
        settings.directory_contacts_path = v;
    }

    if let Some(v) = var("DIRECTORY_PAGE_CAP").or_else(|| var("APP__DIRECTORY_PAGE_CAP")) {
        match v.parse::<usize>() {
            Ok(parsed) => settings.directory_page_cap = parsed,
            Err(_) => warn!(value = %v, "ignoring non-numeric directory page cap"),
        }
    }

    if let Some(v) = var("DIRECTORY_ACCESS_TOKEN") {
        settings.directory_access_token = Some(v);
    }
    if let Some(v) = var("APP__DIRECTORY_ACCESS_TOKEN") {
        settings.directory_access_token = Some(v);
    }

    if let Some(v) = var("APP__LOG_FILTER") {
        settings.log_filter = v;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
