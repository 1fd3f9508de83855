//! Player preferences
//!
//! Persisted separately from game saves in LocalStorage, under a key that is
//! shared by every story on the site.

use crate::persistence::{KeyValueStore, StoreError};

/// Color theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// LocalStorage key
    pub const STORAGE_KEY: &'static str = "game-theme";

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Anything but "dark" reads as light, matching what older builds stored
    pub fn from_str(s: &str) -> Self {
        match s {
            "dark" => Theme::Dark,
            _ => Theme::Light,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Class put on `<body>`
    pub fn body_class(&self) -> &'static str {
        match self {
            Theme::Light => "theme-light",
            Theme::Dark => "theme-dark",
        }
    }

    /// Icon shown on the theme toggle button
    pub fn icon(&self) -> &'static str {
        match self {
            Theme::Light => "icon: star",
            Theme::Dark => "icon: bolt",
        }
    }

    /// Load the saved theme, light if none
    pub fn load(store: &impl KeyValueStore) -> Self {
        match store.get(Self::STORAGE_KEY) {
            Some(value) => {
                let theme = Self::from_str(&value);
                log::info!("Loaded {} theme", theme.as_str());
                theme
            }
            None => {
                log::info!("Using default theme");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut impl KeyValueStore) -> Result<(), StoreError> {
        store.set(Self::STORAGE_KEY, self.as_str())?;
        log::info!("Theme saved ({})", self.as_str());
        Ok(())
    }
}
