//! Device enumeration with a durable, resumable frontier.
//!
//! Walks the mounted volume in a fixed order (directories in depth-first
//! pre-order with lexicographically sorted siblings, files sorted within
//! each directory) and appends one manifest entry per file. The walk
//! state is saved after every append, so a session that dies mid-walk
//! resumes at the exact file it stopped at.

use crate::manifest::{FileDescriptor, Manifest};
use crate::phase::{is_mount_accessible, PhaseOutcome};
use crate::state::{StateFile, WalkState};
use crate::utils::errors::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub struct Enumerator {
    manifest: Manifest,
    state: StateFile<WalkState>,
}

impl Enumerator {
    pub fn new(manifest: Manifest, state: StateFile<WalkState>) -> Self {
        Self { manifest, state }
    }

    /// Walk the mounted volume, appending every file past the resume
    /// frontier to the manifest.
    ///
    /// Returns `Complete` when the whole tree was walked, `Partial` when
    /// the volume became unreadable mid-walk, and `Inaccessible` when
    /// the mount point failed the entry check.
    pub fn enumerate(&self, mount_point: &Path) -> Result<PhaseOutcome> {
        if !is_mount_accessible(mount_point) {
            warn!("Mount point {} is not accessible", mount_point.display());
            return Ok(PhaseOutcome::Inaccessible);
        }

        let mut state = self.state.load()?;
        let mut appender = self.manifest.appender()?;

        // Both fields empty means a fresh walk; last_path alone can be
        // empty when the frontier sits in the volume root.
        let resuming = !(state.last_path.is_empty() && state.last_file.is_empty());
        let resume_dir = PathBuf::from(&state.last_path);

        if resuming {
            info!(
                "Enumerating {} (resuming after {:?} in {:?}, {} files seen)",
                mount_point.display(),
                state.last_file,
                state.last_path,
                state.files_seen
            );
        } else {
            info!("Enumerating {}", mount_point.display());
        }

        for entry in WalkDir::new(mount_point).sort_by_file_name() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Walk interrupted: {}", e);
                    return Ok(PhaseOutcome::Partial);
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }

            let rel_dir = entry
                .path()
                .strip_prefix(mount_point)
                .unwrap_or(entry.path())
                .to_path_buf();

            // Path's component-wise Ord matches the walk order exactly:
            // directories strictly before the frontier are already done.
            if resuming && rel_dir < resume_dir {
                continue;
            }
            let at_resume_dir = resuming && rel_dir == resume_dir;

            let names = match list_file_names_sorted(entry.path()) {
                Ok(names) => names,
                Err(e) => {
                    warn!("Lost access to {}: {}", entry.path().display(), e);
                    return Ok(PhaseOutcome::Partial);
                }
            };

            for name in &names {
                if at_resume_dir && name.as_str() <= state.last_file.as_str() {
                    continue;
                }

                let file_path = entry.path().join(name);
                let size = match fs::metadata(&file_path) {
                    Ok(meta) => meta.len(),
                    Err(e) => {
                        warn!("Lost access to {}: {}", file_path.display(), e);
                        return Ok(PhaseOutcome::Partial);
                    }
                };

                let relative_path = rel_dir.join(name).to_string_lossy().into_owned();
                appender.append(&FileDescriptor {
                    path: relative_path.clone(),
                    size,
                })?;
                debug!("Recorded {} ({} bytes)", relative_path, size);

                state.last_file = name.clone();
                state.last_path = rel_dir.to_string_lossy().into_owned();
                state.files_seen += 1;
                self.state.save(&state)?;
            }

            // A directory with nothing to contribute still advances the
            // frontier, so it is never re-walked on resume. The frontier
            // directory itself is left alone: clearing last_file there
            // would forget which files were already recorded.
            if names.is_empty() && !at_resume_dir {
                state.last_file.clear();
                state.last_path = rel_dir.to_string_lossy().into_owned();
                self.state.save(&state)?;
                debug!("Directory {:?} had no files; frontier advanced", state.last_path);
            }
        }

        info!("Enumeration complete: {} files recorded", state.files_seen);
        Ok(PhaseOutcome::Complete)
    }
}

/// List the plain-file names in a directory, sorted lexicographically.
///
/// Symlinks are resolved; symlinks to directories and broken symlinks
/// are skipped, matching the walker's file-only view of the volume.
fn list_file_names_sorted(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            continue;
        }
        if file_type.is_symlink() {
            match fs::metadata(entry.path()) {
                Ok(meta) if meta.is_file() => {}
                _ => {
                    debug!("Skipping non-file symlink {}", entry.path().display());
                    continue;
                }
            }
        }
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_enumerator(state_dir: &Path) -> Enumerator {
        Enumerator::new(
            Manifest::new(state_dir.join("manifest.jsonl")),
            StateFile::new(state_dir.join("walk_state.json")),
        )
    }

    /// Builds:
    /// ```text
    /// mount/
    ///   zz_root.jpg
    ///   a/1.jpg  a/2.jpg
    ///   b/empty/          (no files)
    ///   c/3.jpg
    /// ```
    fn populate_mount(mount: &Path) {
        fs::write(mount.join("zz_root.jpg"), vec![0u8; 4]).unwrap();
        fs::create_dir(mount.join("a")).unwrap();
        fs::write(mount.join("a/1.jpg"), vec![0u8; 1]).unwrap();
        fs::write(mount.join("a/2.jpg"), vec![0u8; 2]).unwrap();
        fs::create_dir_all(mount.join("b/empty")).unwrap();
        fs::create_dir(mount.join("c")).unwrap();
        fs::write(mount.join("c/3.jpg"), vec![0u8; 3]).unwrap();
    }

    fn paths(entries: &[FileDescriptor]) -> Vec<&str> {
        entries.iter().map(|e| e.path.as_str()).collect()
    }

    #[test]
    fn test_full_walk_is_sorted_and_directory_grouped() -> Result<()> {
        let mount = TempDir::new().unwrap();
        let state_dir = TempDir::new().unwrap();
        populate_mount(mount.path());

        let enumerator = make_enumerator(state_dir.path());
        assert_eq!(enumerator.enumerate(mount.path())?, PhaseOutcome::Complete);

        let entries = Manifest::new(state_dir.path().join("manifest.jsonl")).load()?;
        assert_eq!(
            paths(&entries),
            vec!["zz_root.jpg", "a/1.jpg", "a/2.jpg", "c/3.jpg"]
        );
        assert_eq!(entries[3].size, 3);
        Ok(())
    }

    #[test]
    fn test_empty_mount_is_inaccessible() -> Result<()> {
        let mount = TempDir::new().unwrap();
        let state_dir = TempDir::new().unwrap();
        let enumerator = make_enumerator(state_dir.path());
        assert_eq!(
            enumerator.enumerate(mount.path())?,
            PhaseOutcome::Inaccessible
        );
        Ok(())
    }

    #[test]
    fn test_resume_mid_directory_yields_exact_remainder() -> Result<()> {
        let mount = TempDir::new().unwrap();
        let state_dir = TempDir::new().unwrap();
        populate_mount(mount.path());

        // Reference: what an uninterrupted pass produces.
        let reference_dir = TempDir::new().unwrap();
        make_enumerator(reference_dir.path()).enumerate(mount.path())?;
        let full = Manifest::new(reference_dir.path().join("manifest.jsonl")).load()?;

        // Simulate an interruption after the first two files by seeding
        // the frontier at a/1.jpg.
        let state: StateFile<WalkState> = StateFile::new(state_dir.path().join("walk_state.json"));
        state.save(&WalkState {
            last_file: "1.jpg".to_string(),
            files_seen: 2,
            last_path: "a".to_string(),
        })?;

        let enumerator = make_enumerator(state_dir.path());
        assert_eq!(enumerator.enumerate(mount.path())?, PhaseOutcome::Complete);

        let resumed = Manifest::new(state_dir.path().join("manifest.jsonl")).load()?;
        assert_eq!(paths(&resumed), paths(&full)[2..].to_vec());
        assert_eq!(state.load()?.files_seen, 4);
        Ok(())
    }

    #[test]
    fn test_resume_in_root_skips_recorded_root_files() -> Result<()> {
        let mount = TempDir::new().unwrap();
        let state_dir = TempDir::new().unwrap();
        fs::write(mount.path().join("a.jpg"), b"xx").unwrap();
        fs::write(mount.path().join("b.jpg"), b"yyy").unwrap();

        // Frontier sits in the volume root, after a.jpg.
        let state: StateFile<WalkState> = StateFile::new(state_dir.path().join("walk_state.json"));
        state.save(&WalkState {
            last_file: "a.jpg".to_string(),
            files_seen: 1,
            last_path: String::new(),
        })?;

        let enumerator = make_enumerator(state_dir.path());
        assert_eq!(enumerator.enumerate(mount.path())?, PhaseOutcome::Complete);

        let entries = Manifest::new(state_dir.path().join("manifest.jsonl")).load()?;
        assert_eq!(paths(&entries), vec!["b.jpg"]);
        Ok(())
    }

    #[test]
    fn test_empty_directory_advances_frontier() -> Result<()> {
        let mount = TempDir::new().unwrap();
        let state_dir = TempDir::new().unwrap();
        fs::create_dir(mount.path().join("a")).unwrap();
        fs::write(mount.path().join("a/1.jpg"), b"x").unwrap();
        fs::create_dir(mount.path().join("b")).unwrap();
        // b is empty and sorts after every file-bearing directory

        let enumerator = make_enumerator(state_dir.path());
        assert_eq!(enumerator.enumerate(mount.path())?, PhaseOutcome::Complete);

        let state: StateFile<WalkState> = StateFile::new(state_dir.path().join("walk_state.json"));
        let walk_state = state.load()?;
        assert_eq!(walk_state.last_path, "b");
        assert_eq!(walk_state.last_file, "");

        // Resuming from that frontier re-records nothing.
        let entries_before = Manifest::new(state_dir.path().join("manifest.jsonl")).load()?;
        enumerator.enumerate(mount.path())?;
        let entries_after = Manifest::new(state_dir.path().join("manifest.jsonl")).load()?;
        assert_eq!(entries_before, entries_after);
        Ok(())
    }

    #[test]
    #[cfg(unix)]
    fn test_unreadable_directory_ends_walk_as_partial() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let mount = TempDir::new().unwrap();
        let state_dir = TempDir::new().unwrap();
        fs::create_dir(mount.path().join("a")).unwrap();
        fs::write(mount.path().join("a/1.jpg"), b"x").unwrap();
        fs::create_dir(mount.path().join("b")).unwrap();
        fs::create_dir(mount.path().join("c")).unwrap();
        fs::write(mount.path().join("c/2.jpg"), b"yy").unwrap();

        // Make b unlistable, as a vanished or faulting volume would be.
        let locked = mount.path().join("b");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            // Running as root, where mode bits don't deny reads; the
            // failure cannot be staged this way.
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return Ok(());
        }

        let enumerator = make_enumerator(state_dir.path());
        let outcome = enumerator.enumerate(mount.path())?;
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(outcome, PhaseOutcome::Partial);

        // Everything before the failing directory was recorded and the
        // frontier points at the last successful file, so a later
        // session resumes from there.
        let entries = Manifest::new(state_dir.path().join("manifest.jsonl")).load()?;
        assert_eq!(paths(&entries), vec!["a/1.jpg"]);
        let state: StateFile<WalkState> = StateFile::new(state_dir.path().join("walk_state.json"));
        let walk_state = state.load()?;
        assert_eq!(walk_state.last_path, "a");
        assert_eq!(walk_state.last_file, "1.jpg");
        Ok(())
    }

    #[test]
    fn test_rerun_after_completion_appends_nothing_new_below_frontier() -> Result<()> {
        let mount = TempDir::new().unwrap();
        let state_dir = TempDir::new().unwrap();
        populate_mount(mount.path());

        let enumerator = make_enumerator(state_dir.path());
        enumerator.enumerate(mount.path())?;
        let first = Manifest::new(state_dir.path().join("manifest.jsonl")).load()?;

        enumerator.enumerate(mount.path())?;
        let second = Manifest::new(state_dir.path().join("manifest.jsonl")).load()?;
        assert_eq!(first, second);
        Ok(())
    }
}
