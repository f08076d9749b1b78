//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

/// Environment variable that overrides [`TimerConfig::base_url`].
pub const TIMER_URL_ENV: &str = "STUDY_KIT_TIMER_URL";

/// Environment variable that overrides [`LlmConfig::api_key`].
pub const API_KEY_ENV: &str = "STUDY_KIT_API_KEY";

// ---------------------------------------------------------------------------
// PipelineBackend
// ---------------------------------------------------------------------------

/// Selects where the pipeline stages run.
///
/// | Variant | Extract / Render        | Generate                       |
/// |---------|-------------------------|--------------------------------|
/// | Remote  | study-kit HTTP service  | study-kit HTTP service         |
/// | Local   | in-process              | OpenAI-compatible API directly |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PipelineBackend {
    Remote,
    Local,
}

impl Default for PipelineBackend {
    fn default() -> Self {
        Self::Local
    }
}

// ---------------------------------------------------------------------------
// ServiceConfig
// ---------------------------------------------------------------------------

/// Connection settings for the remote study-kit stage service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL the `/api/...` stage routes hang off.
    pub base_url: String,
    /// Per-request timeout in seconds.  Generation can be slow; keep generous.
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".into(),
            timeout_secs: 120,
        }
    }
}

// ---------------------------------------------------------------------------
// LlmConfig
// ---------------------------------------------------------------------------

/// Settings for the content-generation model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the OpenAI-compatible API endpoint.
    ///
    /// - OpenAI: `https://api.openai.com`
    /// - Ollama (OpenAI mode): `http://localhost:11434`
    pub base_url: String,
    /// API key: `None` for local providers.
    pub api_key: Option<String>,
    /// Model identifier sent to the API.
    pub model: String,
    /// Sampling temperature (0.0 – 1.0).
    pub temperature: f32,
    /// Maximum seconds to wait for a response before timing out.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".into(),
            api_key: None,
            model: "gpt-4o-mini".into(),
            temperature: 0.4,
            timeout_secs: 90,
        }
    }
}

// ---------------------------------------------------------------------------
// TimerConfig
// ---------------------------------------------------------------------------

/// Settings for the remote pomodoro timer service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Base address of the timer service (`/pomodoro/...` routes).
    pub base_url: String,
    /// How often the status endpoint is polled, in milliseconds.
    pub poll_interval_ms: u64,
    /// Length of a focus period in seconds.
    pub work_secs: u64,
    /// Length of a break period in seconds.
    pub break_secs: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001".into(),
            poll_interval_ms: 500,
            work_secs: 25 * 60,
            break_secs: 5 * 60,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// Settings for spoken playback of the summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// External TTS program (e.g. `"espeak-ng"`, `"say"`).  `None` disables
    /// speech; the pipeline then produces a text fallback instead of audio.
    pub command: Option<String>,
    /// Extra arguments placed before the text argument.
    pub args: Vec<String>,
    /// Relative speaking rate; 1.0 is the engine's normal speed.
    pub rate: f32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            rate: 0.8,
        }
    }
}

// ---------------------------------------------------------------------------
// PipelineConfig
// ---------------------------------------------------------------------------

/// Settings for the study-kit content pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Where the stages run.
    pub backend: PipelineBackend,
    /// Characters of extracted text forwarded to generation before truncation.
    pub max_generation_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            backend: PipelineBackend::default(),
            max_generation_chars: 8000,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use study_kit::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Pipeline settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Remote stage service.
    #[serde(default)]
    pub service: ServiceConfig,
    /// Content-generation model.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Pomodoro timer service.
    #[serde(default)]
    pub timer: TimerConfig,
    /// Spoken summary playback.
    #[serde(default)]
    pub speech: SpeechConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// so callers never need to special-case a missing file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup.  Empty values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup(TIMER_URL_ENV) {
            self.timer.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(key) = lookup(API_KEY_ENV) {
            self.llm.api_key = Some(key);
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
