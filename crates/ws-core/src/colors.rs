//! Activity colours as carried on timeline entries.

use serde::{Deserialize, Serialize};

/// A flat colour triple ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorSet {
    pub background: String,
    pub text: String,
    pub border: String,
}

/// Which colour variant to pick from a themed pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Colours stored either flat or as a light/dark pair.
///
/// Both shapes occur in recorded entries; [`EntryColors::resolve`] reduces
/// either one to a [`ColorSet`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryColors {
    Flat(ColorSet),
    Themed { light: ColorSet, dark: ColorSet },
}

impl EntryColors {
    /// Returns the flat colours for `theme`.
    pub fn resolve(&self, theme: Theme) -> &ColorSet {
        match (self, theme) {
            (Self::Flat(colors), _) => colors,
            (Self::Themed { light, .. }, Theme::Light) => light,
            (Self::Themed { dark, .. }, Theme::Dark) => dark,
        }
    }
}

impl From<ColorSet> for EntryColors {
    fn from(colors: ColorSet) -> Self {
        Self::Flat(colors)
    }
}
