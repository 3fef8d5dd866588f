//! Hot-reloadable catalog handle.
//!
//! `CatalogHandle` owns the path of a catalog file and the most recently
//! loaded `AuditCatalog`. Runs take an `Arc` snapshot and keep it for their
//! whole duration; a reload swaps the pointer and never mutates a catalog
//! already handed out.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use threadaudit_contracts::error::ThreadAuditResult;

use crate::catalog::AuditCatalog;

#[derive(Debug)]
pub struct CatalogHandle {
    path: PathBuf,
    current: RwLock<Arc<AuditCatalog>>,
}

impl CatalogHandle {
    /// Load the catalog at `path`. Fails if the initial load fails.
    pub fn open(path: impl Into<PathBuf>) -> ThreadAuditResult<Self> {
        let path = path.into();
        let catalog = AuditCatalog::from_file(&path)?;
        Ok(Self {
            path,
            current: RwLock::new(Arc::new(catalog)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The catalog in effect right now.
    pub fn snapshot(&self) -> Arc<AuditCatalog> {
        Arc::clone(&self.current.read().expect("catalog lock poisoned"))
    }

    /// Re-read the file. On failure the previous catalog stays in effect and
    /// the `Config` error is returned.
    ///
    /// Only catalog-level checks run here. Callers that also derive a report
    /// layout should use [`reload_checked`](Self::reload_checked) so a header
    /// clash is caught before the swap.
    pub fn reload(&self) -> ThreadAuditResult<Arc<AuditCatalog>> {
        self.reload_checked(|_| Ok(()))
    }

    /// Like [`reload`](Self::reload), but `check` must also accept the new
    /// catalog before it replaces the current one.
    ///
    /// ```rust,ignore
    /// handle.reload_checked(|c| ReportLayout::for_catalog(c).map(|_| ()))?;
    /// ```
    pub fn reload_checked<F>(&self, check: F) -> ThreadAuditResult<Arc<AuditCatalog>>
    where
        F: FnOnce(&AuditCatalog) -> ThreadAuditResult<()>,
    {
        let loaded = AuditCatalog::from_file(&self.path)
            .and_then(|catalog| check(&catalog).map(|()| catalog));

        match loaded {
            Ok(catalog) => {
                let catalog = Arc::new(catalog);
                *self.current.write().expect("catalog lock poisoned") = Arc::clone(&catalog);
                info!(
                    path = %self.path.display(),
                    steps = catalog.steps().len(),
                    "catalog reloaded"
                );
                Ok(catalog)
            }
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "catalog reload failed; keeping previous catalog"
                );
                Err(err)
            }
        }
    }
}
