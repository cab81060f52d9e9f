//! Durable UI preferences.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Dashboard display language.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ko,
}

/// The small preference bag persisted next to the history logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub language: Language,
    /// Dense card layout
    pub compact_layout: bool,
    /// Show the reasoning trace panel next to session cards
    pub show_reasoning_panel: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            language: Language::En,
            compact_layout: false,
            show_reasoning_panel: true,
        }
    }
}
