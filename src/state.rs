//! Durable resume state for the enumeration and transfer phases.
//!
//! Each phase persists a small JSON document after every unit of
//! progress. The resumption guarantee hangs entirely on these writes, so
//! a failed save is the one error class that propagates as fatal.

use crate::utils::errors::Result;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::marker::PhantomData;
use std::path::PathBuf;

/// Enumeration frontier.
///
/// `last_path` is the last directory visited, relative to the mount
/// point; `last_file` the last file recorded within it. Everything at or
/// before that position (directories ordered component-wise, files
/// lexically within a directory) is already in the manifest. An empty
/// `last_file` marks a directory that completed without contributing any
/// files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkState {
    pub last_file: String,
    pub files_seen: u64,
    pub last_path: String,
}

/// Transfer progress, parallel to [`WalkState`].
///
/// `last_attempted_file` is written before each copy starts, so an
/// operator inspecting state after a crash can see which file was in
/// flight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferState {
    pub last_attempted_file: String,
    pub processed_files: u64,
}

/// A JSON file holding one state value.
///
/// A missing file loads as `T::default()` (fresh start); saves go
/// through a sibling temp file and an atomic rename so the previous
/// state survives a crash mid-write.
#[derive(Debug, Clone)]
pub struct StateFile<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T> StateFile<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn load(&self) -> Result<T> {
        match File::open(&self.path) {
            Ok(file) => Ok(serde_json::from_reader(file)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, value: &T) -> Result<()> {
        let tmp_path = self.path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            serde_json::to_writer(&mut writer, value)?;
            writer.flush()?;
        }
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}
