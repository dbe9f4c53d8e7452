//! Mounted phases: the work the session loop runs while the device is
//! attached.

pub mod enumerate;
pub mod transfer;

/// Outcome of one phase invocation against a mounted session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOutcome {
    /// No work of this kind remains anywhere. The loop may terminate.
    Complete,
    /// The session ended early (device vanished, copy failed); work may
    /// remain for a future session.
    Partial,
    /// The mount point failed the entry accessibility check. Treated
    /// the same as a mid-session disconnect.
    Inaccessible,
}

/// Check that a mount point is traversable and non-empty.
///
/// An empty directory means the mount helper never attached the device
/// filesystem (the mount target is always created fresh and empty), so
/// emptiness counts as inaccessible.
pub fn is_mount_accessible(mount_point: &std::path::Path) -> bool {
    match std::fs::read_dir(mount_point) {
        Ok(mut entries) => entries.next().is_some(),
        Err(_) => false,
    }
}
