// src/theme.rs

use crate::db::{Medium, THEME_KEY};
use crate::error::{EcoError, Result};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

/// What is actually shown once `System` has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appearance {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }

    pub fn resolve(self, system: Appearance) -> Appearance {
        match self {
            Theme::Light => Appearance::Light,
            Theme::Dark => Appearance::Dark,
            Theme::System => system,
        }
    }

    /// Missing or unrecognised values read as `System`.
    pub fn load(medium: &Medium) -> Self {
        medium
            .get_item_or_warn(THEME_KEY)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }

    pub fn save(self, medium: &Medium) -> Result<()> {
        debug!(theme = self.as_str(), "saving theme");
        medium.set_item(THEME_KEY, self.as_str())
    }

    /// Flips between light and dark based on what is currently shown, and
    /// stores the explicit choice.
    pub fn toggle(medium: &Medium, system: Appearance) -> Result<Theme> {
        let next = match Theme::load(medium).resolve(system) {
            Appearance::Light => Theme::Dark,
            Appearance::Dark => Theme::Light,
        };
        next.save(medium)?;
        Ok(next)
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = EcoError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            other => Err(EcoError::InvalidInput(format!(
                "Unknown theme '{}', expected light, dark or system",
                other
            ))),
        }
    }
}

impl fmt::Display for Appearance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Appearance::Light => "light",
            Appearance::Dark => "dark",
        })
    }
}
