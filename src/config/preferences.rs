//! Persisted user preferences
//!
//! The preference file is read once when the store is opened and written
//! every time a preference changes. Nothing else reads it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Color scheme of the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Light,
    Dark,
}

impl ColorMode {
    pub fn toggled(self) -> Self {
        match self {
            ColorMode::Light => ColorMode::Dark,
            ColorMode::Dark => ColorMode::Light,
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorMode::Light => write!(f, "light"),
            ColorMode::Dark => write!(f, "dark"),
        }
    }
}

impl FromStr for ColorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(ColorMode::Light),
            "dark" => Ok(ColorMode::Dark),
            _ => Err(format!("Invalid color mode: {}", s)),
        }
    }
}

/// On-disk preference document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Preferences {
    #[serde(default)]
    pub color_mode: ColorMode,
}

/// Read-once, write-on-change preference storage
#[derive(Debug)]
pub struct PreferenceStore {
    path: PathBuf,
    current: Preferences,
}

impl PreferenceStore {
    /// Open the store at `path`.
    ///
    /// A missing, empty or unreadable file yields the defaults so a broken
    /// preference file never prevents startup.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = Self::read(&path).unwrap_or_else(|e| {
            tracing::warn!("Ignoring preference file {}: {:#}", path.display(), e);
            Preferences::default()
        });
        Self { path, current }
    }

    fn read(path: &Path) -> Result<Preferences> {
        if !path.exists() {
            return Ok(Preferences::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Preferences::default());
        }
        serde_yaml::from_str(&content).context("Failed to parse preferences")
    }

    pub fn preferences(&self) -> &Preferences {
        &self.current
    }

    pub fn color_mode(&self) -> ColorMode {
        self.current.color_mode
    }

    /// Set the color mode and persist it
    pub fn set_color_mode(&mut self, mode: ColorMode) -> Result<()> {
        self.current.color_mode = mode;
        self.save()
    }

    /// Flip between light and dark, persist, and return the new mode
    pub fn toggle_color_mode(&mut self) -> Result<ColorMode> {
        let mode = self.current.color_mode.toggled();
        self.set_color_mode(mode)?;
        Ok(mode)
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create directory {}", parent.display())
                })?;
            }
        }
        let yaml = serde_yaml::to_string(&self.current).context("Failed to serialize preferences")?;
        std::fs::write(&self.path, yaml)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        tracing::debug!("Saved preferences to {}", self.path.display());
        Ok(())
    }
}
