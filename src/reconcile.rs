//! Manifest reconciliation against the destination tree.
//!
//! Prunes every manifest entry whose destination copy already exists at
//! the right size, then atomically rewrites the manifest with whatever
//! is left. Runs entirely against local state, so it needs no device.

use crate::manifest::Manifest;
use crate::utils::errors::Result;
use std::path::Path;
use tracing::info;

/// Whether a destination file satisfies a manifest entry.
///
/// Size equality is the sole oracle: no checksum is computed, trading
/// byte-exact certainty for speed. A corrupted file at coincidentally
/// the right size passes.
pub fn destination_matches(destination_path: &Path, expected_size: u64) -> bool {
    match std::fs::metadata(destination_path) {
        Ok(meta) => meta.is_file() && meta.len() == expected_size,
        Err(_) => false,
    }
}

/// Drop satisfied entries from the manifest; return how many remain.
///
/// Entry order is preserved. Malformed manifest lines were already
/// discarded (with diagnostics) by the loader, so a corrupt line can
/// never fail the pass.
pub fn reconcile(manifest: &Manifest, destination_root: &Path) -> Result<usize> {
    let entries = manifest.load()?;
    let total = entries.len();

    let retained: Vec<_> = entries
        .into_iter()
        .filter(|entry| !destination_matches(&destination_root.join(&entry.path), entry.size))
        .collect();

    manifest.replace(&retained)?;
    info!(
        "Reconciled manifest: {} of {} entries remain to copy",
        retained.len(),
        total
    );
    Ok(retained.len())
}
