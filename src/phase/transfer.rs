//! File transfer from a mounted session to the destination tree.
//!
//! Works through a snapshot of the manifest sorted smallest-first, so a
//! flaky connection still lands as many fully-verified files as
//! possible before it drops. Each copy is re-verified by size; a copy
//! I/O error ends the session rather than spinning against a failing
//! mount.

use crate::manifest::Manifest;
use crate::phase::{is_mount_accessible, PhaseOutcome};
use crate::reconcile::destination_matches;
use crate::state::{StateFile, TransferState};
use crate::utils::errors::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub struct TransferEngine {
    manifest: Manifest,
    destination_root: PathBuf,
    state: StateFile<TransferState>,
}

impl TransferEngine {
    pub fn new(
        manifest: Manifest,
        destination_root: impl Into<PathBuf>,
        state: StateFile<TransferState>,
    ) -> Self {
        Self {
            manifest,
            destination_root: destination_root.into(),
            state,
        }
    }

    /// Copy every outstanding manifest entry from the mounted volume.
    ///
    /// Returns `Complete` when every entry in the snapshot was either
    /// already satisfied or copy-verified, `Partial` on the first copy
    /// I/O failure, and `Inaccessible` when the mount point failed the
    /// entry check. A size mismatch after a copy is logged and left for
    /// the next reconcile pass; it does not end the session.
    pub fn transfer(&self, mount_point: &Path) -> Result<PhaseOutcome> {
        if !is_mount_accessible(mount_point) {
            warn!("Mount point {} is not accessible", mount_point.display());
            return Ok(PhaseOutcome::Inaccessible);
        }

        // Snapshot once; the manifest is not re-read mid-pass. Stable
        // sort keeps manifest order among equal sizes.
        let mut entries = self.manifest.load()?;
        entries.sort_by_key(|entry| entry.size);

        info!(
            "Transferring {} manifest entries from {} (smallest first)",
            entries.len(),
            mount_point.display()
        );

        let mut state = self.state.load()?;
        for entry in &entries {
            let destination_path = self.destination_root.join(&entry.path);
            if destination_matches(&destination_path, entry.size) {
                debug!("Already exists with correct size, skipping: {}", entry.path);
                continue;
            }

            state.last_attempted_file = entry.path.clone();
            self.state.save(&state)?;

            let source_path = mount_point.join(&entry.path);
            if let Err(e) = self.copy_entry(&source_path, &destination_path) {
                warn!(
                    "Error copying {}: {}. Ending session; it will be retried.",
                    entry.path, e
                );
                return Ok(PhaseOutcome::Partial);
            }

            match fs::metadata(&destination_path) {
                Ok(meta) if meta.len() == entry.size => {
                    state.processed_files += 1;
                    self.state.save(&state)?;
                    info!("Successfully copied: {} ({} bytes)", entry.path, entry.size);
                }
                Ok(meta) => {
                    warn!(
                        "Size mismatch for {} (expected {}, got {}); will retry after reconcile",
                        entry.path,
                        entry.size,
                        meta.len()
                    );
                }
                Err(e) => {
                    warn!(
                        "Could not verify {}: {}; will retry after reconcile",
                        entry.path, e
                    );
                }
            }
        }

        info!("All manifest entries processed");
        Ok(PhaseOutcome::Complete)
    }

    fn copy_entry(&self, source: &Path, destination: &Path) -> std::io::Result<()> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(source, destination)?;
        Ok(())
    }
}
