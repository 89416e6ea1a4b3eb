//! Store settings management
//!
//! Stores non-sensitive configuration in a plain JSON file.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::credential::CredentialStore;
use crate::error::SettingsError;
use crate::storage::{KeychainBackend, MemoryBackend, SecureStorageBackend};

/// Which storage backend to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// OS keychain
    #[default]
    Keychain,
    /// In-process map, lost on exit
    Memory,
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "keychain" => Ok(BackendKind::Keychain),
            "memory" => Ok(BackendKind::Memory),
            other => Err(format!("unknown backend: {}", other)),
        }
    }
}

/// Store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreSettings {
    /// Settings file version
    pub version: u32,
    /// Storage backend
    pub backend: BackendKind,
    /// Namespace prepended to service names in the keychain
    pub service_prefix: Option<String>,
    /// Report backend failures from delete instead of ignoring them
    pub strict_delete: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            version: 1,
            backend: BackendKind::Keychain,
            service_prefix: None,
            strict_delete: false,
        }
    }
}

impl StoreSettings {
    /// Build the configured backend
    pub fn backend(&self) -> Arc<dyn SecureStorageBackend> {
        match self.backend {
            BackendKind::Keychain => Arc::new(KeychainBackend::new(self.service_prefix.as_deref())),
            BackendKind::Memory => Arc::new(MemoryBackend::new()),
        }
    }

    /// Open a credential store with these settings
    pub fn open_store(&self) -> CredentialStore {
        let store = CredentialStore::new(self.backend()).with_strict_delete(self.strict_delete);
        debug!("Opened credential store on {}", store.backend_name());
        store
    }
}

/// Settings manager
pub struct SettingsManager {
    settings_file: PathBuf,
    settings: StoreSettings,
}

impl SettingsManager {
    /// Create a new settings manager, falling back to defaults if the
    /// settings file cannot be read
    pub fn new(storage_dir: &Path) -> Self {
        let settings_file = storage_dir.join("settings.json");
        let settings = match Self::load_from_file(&settings_file) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring unreadable settings file {:?}: {}", settings_file, e);
                StoreSettings::default()
            }
        };

        Self {
            settings_file,
            settings,
        }
    }

    /// Create a settings manager, failing if an existing settings file is
    /// unreadable or malformed
    pub fn open(storage_dir: &Path) -> Result<Self, SettingsError> {
        let settings_file = storage_dir.join("settings.json");
        let settings = Self::load_from_file(&settings_file)?;

        Ok(Self {
            settings_file,
            settings,
        })
    }

    /// Open the settings in the platform config directory
    pub fn in_default_dir() -> Result<Self, SettingsError> {
        Self::open(&Self::default_dir()?)
    }

    /// Platform config directory for keystore
    pub fn default_dir() -> Result<PathBuf, SettingsError> {
        ProjectDirs::from("dev", "keystore", "keystore")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or(SettingsError::NoSettingsDir)
    }

    /// Load settings from file
    fn load_from_file(path: &Path) -> Result<StoreSettings, SettingsError> {
        if !path.exists() {
            debug!("No settings file found, using defaults");
            return Ok(StoreSettings::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let settings: StoreSettings = serde_json::from_str(&contents)?;
        debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Save settings to file
    pub async fn save(&self) -> Result<(), SettingsError> {
        if let Some(dir) = self.settings_file.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }

        let contents = serde_json::to_string_pretty(&self.settings)?;

        // Write atomically using temp file
        let temp_path = self.settings_file.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents).await?;
        tokio::fs::rename(&temp_path, &self.settings_file).await?;

        debug!("Saved settings to {:?}", self.settings_file);
        Ok(())
    }

    /// Get current settings
    pub fn get(&self) -> &StoreSettings {
        &self.settings
    }

    /// Get mutable settings
    pub fn get_mut(&mut self) -> &mut StoreSettings {
        &mut self.settings
    }

    /// Update settings and save
    pub async fn update(&mut self, settings: StoreSettings) -> Result<(), SettingsError> {
        self.settings = settings;
        self.save().await
    }

    /// Reset settings to defaults and delete settings file
    pub async fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = StoreSettings::default();

        if self.settings_file.exists() {
            tokio::fs::remove_file(&self.settings_file).await?;
        }

        Ok(())
    }
}
