use crate::host::SnapshotFile;
use crate::models::CraftingSettings;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;

/// Default data directory, relative to the working directory
pub const DATA_DIR: &str = "AutoCraft Data";

pub const SETTINGS_FILE: &str = "AutoCraft Settings.yaml";
pub const SNAPSHOT_FILE: &str = "Inventory Snapshot.yaml";

/// Configuration manager for loading and saving YAML files.
///
/// Manages two files inside the data directory:
/// - Settings (`AutoCraft Settings.yaml`): delays, currency toggles, score weights
/// - Snapshot (`Inventory Snapshot.yaml`): a captured inventory and currency tab
///   used by the dry-run host
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    settings_path: Utf8PathBuf,
    snapshot_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified data directory.
    ///
    /// The directory is created if it does not exist.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            settings_path: config_dir.join(SETTINGS_FILE),
            snapshot_path: config_dir.join(SNAPSHOT_FILE),
            config_dir,
        })
    }

    /// Load the crafting settings.
    ///
    /// # Returns
    /// The validated settings, or defaults if the file doesn't exist. Every
    /// currency gets an explicit toggle entry.
    pub fn load_settings(&self) -> Result<CraftingSettings> {
        let mut settings = if self.settings_path.exists() {
            let settings: CraftingSettings = read_yaml(&self.settings_path, "settings")?;
            tracing::info!("Loaded settings from {}", self.settings_path);
            settings
        } else {
            tracing::warn!(
                "Settings file not found at {}, using defaults",
                self.settings_path
            );
            CraftingSettings::default()
        };

        settings.currency_enabled.ensure_all();
        Ok(settings.validated())
    }

    /// Save the crafting settings.
    pub fn save_settings(&self, settings: &CraftingSettings) -> Result<()> {
        write_yaml(&self.settings_path, settings, "settings")?;
        tracing::info!("Saved settings to {}", self.settings_path);
        Ok(())
    }

    /// Load the captured snapshot, or `None` if there is none.
    pub fn load_snapshot(&self) -> Result<Option<SnapshotFile>> {
        if !self.snapshot_path.exists() {
            tracing::warn!("Snapshot file not found at {}", self.snapshot_path);
            return Ok(None);
        }

        let snapshot: SnapshotFile = read_yaml(&self.snapshot_path, "snapshot")?;
        tracing::info!(
            "Loaded snapshot from {}: {} items, {} stash entries",
            self.snapshot_path,
            snapshot.inventory.len(),
            snapshot.currency_stash.len()
        );
        Ok(Some(snapshot))
    }

    pub fn save_snapshot(&self, snapshot: &SnapshotFile) -> Result<()> {
        write_yaml(&self.snapshot_path, snapshot, "snapshot")?;
        tracing::info!("Saved snapshot to {}", self.snapshot_path);
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }

    pub fn snapshot_path(&self) -> &Utf8Path {
        &self.snapshot_path
    }
}

fn read_yaml<T: DeserializeOwned>(path: &Utf8Path, what: &str) -> Result<T> {
    let file_contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}: {}", what, path))?;

    serde_yaml_ng::from_str(&file_contents)
        .with_context(|| format!("Failed to parse {}: {}", what, path))
}

fn write_yaml<T: Serialize>(path: &Utf8Path, value: &T, what: &str) -> Result<()> {
    let yaml_string = serde_yaml_ng::to_string(value)
        .with_context(|| format!("Failed to serialize {} to YAML", what))?;

    fs::write(path, yaml_string).with_context(|| format!("Failed to write {}: {}", what, path))
}
