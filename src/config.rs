//! Configuration management for the courier.
//!
//! Loads configuration from a TOML file; the defaults operate relative
//! to the current working directory, matching single-operator use where
//! the courier is started inside the destination tree.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub courier: CourierConfig,
    pub device: DeviceConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourierConfig {
    /// Root directory files are copied into
    #[serde(default = "default_destination_root")]
    pub destination_root: PathBuf,

    /// Directory session mount points are created under
    #[serde(default = "default_session_root")]
    pub session_root: PathBuf,

    /// Durable manifest of discovered files (JSON lines)
    #[serde(default = "default_manifest_file")]
    pub manifest_file: PathBuf,

    /// Enumeration resume state
    #[serde(default = "default_walk_state_file")]
    pub walk_state_file: PathBuf,

    /// Transfer progress state
    #[serde(default = "default_transfer_state_file")]
    pub transfer_state_file: PathBuf,

    /// Seconds to wait between device-presence polls
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Command that prints a non-empty line when the device is reachable
    #[serde(default = "default_probe_command")]
    pub probe_command: Vec<String>,

    /// Command that mounts the device; the mount directory is appended
    #[serde(default = "default_mount_command")]
    pub mount_command: Vec<String>,

    /// Command that unmounts; the mount directory is appended
    #[serde(default = "default_unmount_command")]
    pub unmount_command: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default values
fn default_destination_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_session_root() -> PathBuf {
    PathBuf::from("temp")
}

fn default_manifest_file() -> PathBuf {
    PathBuf::from("manifest.jsonl")
}

fn default_walk_state_file() -> PathBuf {
    PathBuf::from("walk_state.json")
}

fn default_transfer_state_file() -> PathBuf {
    PathBuf::from("transfer_state.json")
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_probe_command() -> Vec<String> {
    vec!["idevice_id".to_string(), "-l".to_string()]
}

fn default_mount_command() -> Vec<String> {
    vec!["ifuse".to_string()]
}

fn default_unmount_command() -> Vec<String> {
    vec!["fusermount".to_string(), "-u".to_string()]
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            courier: CourierConfig {
                destination_root: default_destination_root(),
                session_root: default_session_root(),
                manifest_file: default_manifest_file(),
                walk_state_file: default_walk_state_file(),
                transfer_state_file: default_transfer_state_file(),
                poll_interval_secs: default_poll_interval_secs(),
            },
            device: DeviceConfig {
                probe_command: default_probe_command(),
                mount_command: default_mount_command(),
                unmount_command: default_unmount_command(),
            },
            log: LogConfig {
                level: default_log_level(),
            },
        }
    }
}
