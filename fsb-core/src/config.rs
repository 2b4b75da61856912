//! src/config.rs
//! ============================================================================
//! # Config: browse defaults and logging settings (directories + TOML)
//!
//! Loads and saves settings as TOML from the platform config path located
//! with [`directories`](https://docs.rs/directories). A missing file is
//! created with defaults on first load.
//!
//! ## Example
//! ```rust,ignore
//! let config = Config::load()?;
//! let session = config.browse.session()?;
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{BrowseError, BrowseResult};
use crate::fs::ext_set::{ExtensionSet, WILDCARD};
use crate::logging::LoggerConfig;
use crate::model::browse_session::BrowseSession;
use crate::model::flags::BrowseFlags;

/// Listing behaviour applied to every session the binary opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowseConfig {
    pub hide_dirs: bool,
    pub hide_files: bool,
    pub show_hidden: bool,
    pub skip_parent: bool,
    pub list_dead: bool,

    /// `["*"]` for everything, a preset name (`["audio"]`), or an explicit
    /// sorted extension list.
    pub extensions: Vec<String>,

    pub start_directory: Option<PathBuf>,
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            hide_dirs: false,
            hide_files: false,
            show_hidden: false,
            skip_parent: false,
            list_dead: false,
            extensions: vec![WILDCARD.to_string()],
            start_directory: None,
        }
    }
}

impl BrowseConfig {
    #[must_use]
    pub fn flags(&self) -> BrowseFlags {
        let mut flags = BrowseFlags::empty();
        flags.set(BrowseFlags::HIDE_DIRS, self.hide_dirs);
        flags.set(BrowseFlags::HIDE_FILES, self.hide_files);
        flags.set(BrowseFlags::SHOW_HIDDEN, self.show_hidden);
        flags.set(BrowseFlags::SKIP_PARENT, self.skip_parent);
        flags.set(BrowseFlags::LIST_DEAD, self.list_dead);
        flags
    }

    /// Resolves the extension filter. A single entry naming a preset
    /// expands to it; `None` means every file is accepted.
    pub fn extension_set(&self) -> BrowseResult<Option<ExtensionSet>> {
        if let [single] = self.extensions.as_slice()
            && let Some(preset) = ExtensionSet::preset(single)
        {
            return ExtensionSet::build(preset.iter().copied());
        }

        let set = ExtensionSet::build(&self.extensions)?;
        if let Some(set) = &set
            && !is_sorted_ignore_case(set.iter())
        {
            return Err(BrowseError::config(
                "extension list must be sorted alphabetically",
            ));
        }
        Ok(set)
    }

    /// A fresh session carrying these settings.
    pub fn session(&self) -> BrowseResult<BrowseSession> {
        Ok(BrowseSession::new(
            self.extension_set()?.map(Arc::new),
            self.flags(),
        ))
    }
}

fn is_sorted_ignore_case<'a>(mut exts: impl Iterator<Item = &'a str>) -> bool {
    let Some(mut prev) = exts.next() else {
        return true;
    };
    for ext in exts {
        if crate::fs::ordering::cmp_ignore_case(prev, ext).is_ge() {
            return false;
        }
        prev = ext;
    }
    true
}

/// Main configuration struct for the application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub browse: BrowseConfig,

    #[serde(default)]
    pub logging: LoggerConfig,
}

impl Config {
    /// Loads config from the platform config dir, writing defaults when the
    /// file does not exist yet.
    ///
    /// The config is expected at `$XDG_CONFIG_HOME/fsb/config.toml`
    /// (Linux), or equivalent on Windows/macOS.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            info!(
                "No config file found at {}, using default configuration. Creating it now.",
                path.display()
            );

            let default_config = Self::default();
            default_config.save_to(&path)?;

            Ok(default_config)
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        info!("Loading config from {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let cfg: Self = toml::from_str(&text).map_err(BrowseError::from)?;

        Ok(cfg)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        info!("Saving config to {}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_str = toml::to_string_pretty(self).map_err(BrowseError::from)?;
        std::fs::write(path, toml_str)
            .with_context(|| format!("Failed to write config {}", path.display()))?;

        Ok(())
    }

    /// Returns the canonical config file path using `directories::ProjectDirs`.
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "fsb", "fsb")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory."))?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }
}
