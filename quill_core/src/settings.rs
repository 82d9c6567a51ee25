//! User settings: providers, prompt overrides and custom buttons.
//!
//! Settings are plain data. Loading and saving belong to the host; this
//! module only converts to and from JSON and keeps provider bookkeeping
//! consistent.

use std::collections::BTreeMap;
use std::time::Duration;

use quill_api::OperationKind;
use quill_backend_api::ProviderConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Result;

/// Default overall request timeout in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 60_000;

/// Number of user-defined toolbar buttons.
pub const CUSTOM_BUTTON_SLOTS: usize = 3;

/// Most recent free-form instructions kept for reuse.
pub const CUSTOM_INPUT_HISTORY_LIMIT: usize = 10;

/// A user-defined toolbar button with its own instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomButton {
    /// Operation id, `custom1` to `custom3`.
    pub id: String,
    /// Button label.
    pub name: String,
    /// Icon glyph.
    #[serde(default)]
    pub icon: String,
    /// Instruction sent ahead of the selected text.
    #[serde(default)]
    pub prompt: String,
    /// Whether the button is shown.
    #[serde(default)]
    pub enabled: bool,
}

impl CustomButton {
    fn slot(index: usize, icon: &str) -> Self {
        Self {
            id: format!("custom{}", index + 1),
            name: format!("Custom {}", index + 1),
            icon: icon.to_owned(),
            prompt: String::new(),
            enabled: false,
        }
    }

    /// The three disabled placeholder buttons.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        ["✨", "🔧", "🎯"]
            .iter()
            .enumerate()
            .map(|(index, icon)| Self::slot(index, icon))
            .collect()
    }
}

/// Persistent settings, JSON-compatible with the editor plugin's storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Configured providers.
    pub providers: Vec<ProviderConfig>,
    /// Provider used for new operations.
    pub current_provider_id: Option<String>,
    /// Per-operation instruction overrides.
    pub operation_prompts: BTreeMap<OperationKind, String>,
    /// User-defined buttons.
    pub custom_buttons: Vec<CustomButton>,
    /// Overall request timeout in milliseconds.
    #[serde(rename = "requestTimeout")]
    pub request_timeout_ms: u64,
    /// Recently used free-form instructions, newest first.
    pub custom_input_history: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            current_provider_id: None,
            operation_prompts: BTreeMap::new(),
            custom_buttons: CustomButton::defaults(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            custom_input_history: Vec::new(),
        }
    }
}

impl Settings {
    /// Parse settings JSON, filling absent fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Settings`] when the JSON is invalid.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize settings to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Settings`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Add a provider. The first provider, or one marked default, becomes
    /// the default and current provider.
    pub fn add_provider(&mut self, mut provider: ProviderConfig) {
        if provider.is_default || self.providers.is_empty() {
            for existing in &mut self.providers {
                existing.is_default = false;
            }
            provider.is_default = true;
            self.current_provider_id = Some(provider.id.clone());
        }
        debug!(provider = %provider.id, "provider added");
        self.providers.push(provider);
    }

    /// Replace the provider with the same id. Returns `false` when unknown.
    pub fn update_provider(&mut self, provider: ProviderConfig) -> bool {
        let Some(index) = self.providers.iter().position(|p| p.id == provider.id) else {
            return false;
        };
        if provider.is_default && !self.providers[index].is_default {
            for existing in &mut self.providers {
                existing.is_default = false;
            }
            self.current_provider_id = Some(provider.id.clone());
        }
        self.providers[index] = provider;
        true
    }

    /// Remove a provider, handing the default role to the first remaining
    /// one. Returns the removed provider.
    pub fn remove_provider(&mut self, id: &str) -> Option<ProviderConfig> {
        let index = self.providers.iter().position(|p| p.id == id)?;
        let removed = self.providers.remove(index);

        if self.providers.is_empty() {
            self.current_provider_id = None;
        } else if removed.is_default || self.current_provider_id.as_deref() == Some(id) {
            self.providers[0].is_default = true;
            self.current_provider_id = Some(self.providers[0].id.clone());
        }
        debug!(provider = %id, "provider removed");
        Some(removed)
    }

    /// Make `id` the default and current provider. Unknown ids are ignored.
    pub fn set_current_provider(&mut self, id: &str) -> bool {
        if !self.providers.iter().any(|p| p.id == id) {
            return false;
        }
        for provider in &mut self.providers {
            provider.is_default = provider.id == id;
        }
        self.current_provider_id = Some(id.to_owned());
        true
    }

    /// Provider with the given id.
    #[must_use]
    pub fn provider(&self, id: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.id == id)
    }

    /// Provider selected for new operations.
    #[must_use]
    pub fn current_provider(&self) -> Option<&ProviderConfig> {
        self.current_provider_id
            .as_deref()
            .and_then(|id| self.provider(id))
    }

    /// Instruction for `kind`: user override, then custom button prompt,
    /// then the built-in template. Blank overrides are skipped.
    #[must_use]
    pub fn prompt_for(&self, kind: OperationKind) -> String {
        if let Some(prompt) = self
            .operation_prompts
            .get(&kind)
            .filter(|prompt| !prompt.trim().is_empty())
        {
            return prompt.clone();
        }
        if let Some(button) = kind
            .custom_slot()
            .and_then(|slot| self.custom_buttons.get(slot))
            .filter(|button| !button.prompt.trim().is_empty())
        {
            return button.prompt.clone();
        }
        kind.default_prompt().to_owned()
    }

    /// Overall request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Record a free-form instruction, newest first, without duplicates.
    pub fn remember_custom_input(&mut self, instruction: &str) {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return;
        }
        self.custom_input_history.retain(|entry| entry != instruction);
        self.custom_input_history.insert(0, instruction.to_owned());
        self.custom_input_history.truncate(CUSTOM_INPUT_HISTORY_LIMIT);
    }
}
