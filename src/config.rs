//! Engine configuration and defaults
//!
//! Every field has a serde default, so hosts only send what they override:
//! ```javascript,ignore
//! const script = new ContentScript({ remote_debounce_ms: 600 }, checkGrammar, rewriteText);
//! ```

use serde::{Deserialize, Serialize};
use wasm_bindgen::JsValue;

use crate::annotate::{OverlayTheme, RewriteMode};
use crate::error::ConfigError;

fn default_min_local_chars() -> usize { 3 }
fn default_min_remote_chars() -> usize { 5 }
fn default_min_rewrite_chars() -> usize { 3 }
fn default_remote_debounce_ms() -> f64 { 1000.0 }
fn default_typing_delay_ms() -> f64 { 150.0 }
fn default_success_display_ms() -> f64 { 2000.0 }
fn default_blur_check_delay_ms() -> f64 { 200.0 }
fn default_max_quick_fixes() -> usize { 2 }
fn default_overlay_id() -> String { "ai-highlight-overlay".to_string() }
fn default_ui_root_selector() -> String { "#ai-root".to_string() }

fn default_rewrite_modes() -> Vec<RewriteMode> {
    vec![RewriteMode::Professional, RewriteMode::Concise, RewriteMode::Explained]
}

/// Configuration for the annotation engine and its DOM host
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Texts shorter than this (in characters) get no local spans
    #[serde(default = "default_min_local_chars")]
    pub min_local_chars: usize,
    #[serde(default = "default_min_remote_chars")]
    pub min_remote_chars: usize,
    #[serde(default = "default_min_rewrite_chars")]
    pub min_rewrite_chars: usize,
    /// Idle time before a remote grammar check is issued
    #[serde(default = "default_remote_debounce_ms")]
    pub remote_debounce_ms: f64,
    /// Delay between an input event and the local analysis pass. 0 = immediate.
    #[serde(default = "default_typing_delay_ms")]
    pub typing_delay_ms: f64,
    #[serde(default = "default_success_display_ms")]
    pub success_display_ms: f64,
    /// Wait after a click on the page before checking whether focus left the surface
    #[serde(default = "default_blur_check_delay_ms")]
    pub blur_check_delay_ms: f64,
    #[serde(default = "default_max_quick_fixes")]
    pub max_quick_fixes: usize,
    #[serde(default = "default_rewrite_modes")]
    pub rewrite_modes: Vec<RewriteMode>,
    #[serde(default = "default_overlay_id")]
    pub overlay_id: String,
    /// Clicks inside this element never deactivate the surface
    #[serde(default = "default_ui_root_selector")]
    pub ui_root_selector: String,
    #[serde(default)]
    pub theme: OverlayTheme,
    #[serde(default)]
    pub debug_logging: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_local_chars: default_min_local_chars(),
            min_remote_chars: default_min_remote_chars(),
            min_rewrite_chars: default_min_rewrite_chars(),
            remote_debounce_ms: default_remote_debounce_ms(),
            typing_delay_ms: default_typing_delay_ms(),
            success_display_ms: default_success_display_ms(),
            blur_check_delay_ms: default_blur_check_delay_ms(),
            max_quick_fixes: default_max_quick_fixes(),
            rewrite_modes: default_rewrite_modes(),
            overlay_id: default_overlay_id(),
            ui_root_selector: default_ui_root_selector(),
            theme: OverlayTheme::default(),
            debug_logging: false,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_local_chars == 0 {
            return Err(ConfigError::ZeroThreshold { field: "min_local_chars" });
        }
        if self.min_remote_chars == 0 {
            return Err(ConfigError::ZeroThreshold { field: "min_remote_chars" });
        }
        if self.rewrite_modes.is_empty() {
            return Err(ConfigError::NoRewriteModes);
        }
        Ok(())
    }

    /// Parse from a JS object; `null`/`undefined` yield the defaults
    pub fn from_js(value: JsValue) -> Result<Self, ConfigError> {
        let config: EngineConfig = if value.is_null() || value.is_undefined() {
            EngineConfig::default()
        } else {
            serde_wasm_bindgen::from_value(value).map_err(|e| ConfigError::Parse(e.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn log_level(&self) -> log::LevelFilter {
        if self.debug_logging {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        }
    }
}
