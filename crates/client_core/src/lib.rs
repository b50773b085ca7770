use std::{
    collections::HashSet,
    fmt,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use shared::{
    domain::{CandidateContact, ContactId},
    email::normalize_email,
    error::{ErrorCode, ErrorNotice},
};
use storage::StateStore;
use thiserror::Error;
use tracing::{info, warn};

pub mod csv_import;
pub mod directory;

pub use csv_import::parse_csv_contacts;
pub use directory::{
    fetch_directory_contacts, DirectoryError, DirectoryOptions, HttpPageFetcher, PageFetcher,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportSource {
    Csv,
    Directory,
}

impl fmt::Display for ImportSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportSource::Csv => f.write_str("CSV file"),
            ImportSource::Directory => f.write_str("directory"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub source: ImportSource,
    pub imported: usize,
    /// Candidates dropped at merge time because their email was already held
    /// by a contact.
    pub skipped: usize,
    pub contact_ids: Vec<ContactId>,
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("another import is already running")]
    InProgress,
    #[error("no access token available for the directory import")]
    MissingToken,
    #[error("failed to read {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error("no new contacts found in {0}")]
    Empty(ImportSource),
}

impl ImportError {
    /// User-facing message for the import boundary. Import failures never
    /// propagate past this point.
    pub fn notice(&self) -> ErrorNotice {
        match self {
            ImportError::InProgress => ErrorNotice::new(
                ErrorCode::Busy,
                "An import is already running; wait for it to finish.",
            ),
            ImportError::MissingToken => ErrorNotice::new(
                ErrorCode::Unauthorized,
                "Sign in to the directory before importing contacts.",
            ),
            ImportError::ReadFile { path, .. } => ErrorNotice::new(
                ErrorCode::Unreadable,
                format!("Could not read {}.", path.display()),
            ),
            ImportError::Directory(DirectoryError::Unauthorized) => ErrorNotice::new(
                ErrorCode::Unauthorized,
                "The directory rejected the access token; sign in again.",
            ),
            ImportError::Directory(err) => ErrorNotice::new(
                ErrorCode::Transport,
                format!("Directory import failed: {err}"),
            ),
            ImportError::Empty(ImportSource::Csv) => ErrorNotice::new(
                ErrorCode::Empty,
                "No new valid contacts found in the CSV file.",
            ),
            ImportError::Empty(ImportSource::Directory) => ErrorNotice::new(
                ErrorCode::Empty,
                "The directory returned no new contacts with email addresses.",
            ),
        }
    }
}

/// Held for the lifetime of one import; a second import cannot start while
/// it is alive.
#[derive(Debug)]
struct ImportGuard {
    flag: Arc<AtomicBool>,
}

impl ImportGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self, ImportError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ImportError::InProgress)?;
        Ok(Self {
            flag: Arc::clone(flag),
        })
    }
}

impl Drop for ImportGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Candidates loaded by an importer, not yet merged into a store.
#[derive(Debug)]
pub struct PendingImport {
    source: ImportSource,
    candidates: Vec<CandidateContact>,
    _guard: ImportGuard,
}

impl PendingImport {
    pub fn source(&self) -> ImportSource {
        self.source
    }

    pub fn candidates(&self) -> &[CandidateContact] {
        &self.candidates
    }

    /// Merges into `store` with one bulk add. Candidates are re-checked
    /// against the store's current emails, since it may have changed while
    /// the load was suspended.
    pub fn apply(self, store: &mut StateStore) -> Result<ImportReport, ImportError> {
        let source = self.source;
        let mut known = store.existing_emails();
        let total = self.candidates.len();
        let fresh: Vec<CandidateContact> = self
            .candidates
            .into_iter()
            .filter(|c| known.insert(normalize_email(&c.email)))
            .collect();
        let skipped = total - fresh.len();

        if fresh.is_empty() {
            warn!(%source, skipped, "import produced no new contacts");
            return Err(ImportError::Empty(source));
        }

        let contact_ids = store.import_contacts(fresh);
        info!(%source, imported = contact_ids.len(), skipped, "import merged");
        Ok(ImportReport {
            source,
            imported: contact_ids.len(),
            skipped,
            contact_ids,
        })
    }
}

/// Runs the CSV and directory import pipelines. Only one import may be in
/// flight at a time.
pub struct ContactImporter {
    fetcher: Arc<dyn PageFetcher>,
    options: DirectoryOptions,
    in_progress: Arc<AtomicBool>,
}

impl ContactImporter {
    pub fn new(fetcher: Arc<dyn PageFetcher>, options: DirectoryOptions) -> Self {
        Self {
            fetcher,
            options,
            in_progress: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn options(&self) -> &DirectoryOptions {
        &self.options
    }

    pub fn is_importing(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    pub async fn load_csv_file(
        &self,
        path: impl AsRef<Path>,
        existing_emails: &HashSet<String>,
    ) -> Result<PendingImport, ImportError> {
        let guard = ImportGuard::acquire(&self.in_progress)?;
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ImportError::ReadFile {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::pending_csv(&text, existing_emails, guard))
    }

    /// For callers that already hold the file contents.
    pub fn load_csv_text(
        &self,
        text: &str,
        existing_emails: &HashSet<String>,
    ) -> Result<PendingImport, ImportError> {
        let guard = ImportGuard::acquire(&self.in_progress)?;
        Ok(Self::pending_csv(text, existing_emails, guard))
    }

    fn pending_csv(
        text: &str,
        existing_emails: &HashSet<String>,
        guard: ImportGuard,
    ) -> PendingImport {
        let candidates = parse_csv_contacts(text, existing_emails);
        info!(candidates = candidates.len(), "parsed csv contacts");
        PendingImport {
            source: ImportSource::Csv,
            candidates,
            _guard: guard,
        }
    }

    pub async fn load_directory(&self, access_token: &str) -> Result<PendingImport, ImportError> {
        let access_token = access_token.trim();
        if access_token.is_empty() {
            return Err(ImportError::MissingToken);
        }
        let guard = ImportGuard::acquire(&self.in_progress)?;
        let candidates = fetch_directory_contacts(
            self.fetcher.as_ref(),
            access_token,
            &self.options.first_link,
            self.options.page_cap,
        )
        .await?;
        info!(candidates = candidates.len(), "fetched directory contacts");
        Ok(PendingImport {
            source: ImportSource::Directory,
            candidates,
            _guard: guard,
        })
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
