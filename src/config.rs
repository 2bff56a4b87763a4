use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `[runtime].mode`.
pub const RUNTIME_MODE_ENV: &str = "CLONETIME_ENV";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7340".to_string()
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    Development,
    #[default]
    Production,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub mode: RuntimeMode,
}

impl RuntimeConfig {
    /// `force` may bypass the cache only outside production.
    pub fn allows_cache_bypass(&self) -> bool {
        self.mode == RuntimeMode::Development
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CrawlerConfig {
    /// Try headless Chromium before plain HTTP. Needs the `browser` feature.
    #[serde(default = "default_true")]
    pub browser: bool,
    #[serde(default)]
    pub chrome_executable: Option<PathBuf>,
    #[serde(default = "default_render_timeout_secs")]
    pub render_timeout_secs: u64,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    #[serde(default = "default_min_content_chars")]
    pub min_content_chars: usize,
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
    #[serde(default = "default_extra_paths")]
    pub extra_paths: Vec<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            browser: default_true(),
            chrome_executable: None,
            render_timeout_secs: default_render_timeout_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            max_pages: default_max_pages(),
            min_content_chars: default_min_content_chars(),
            max_content_chars: default_max_content_chars(),
            extra_paths: default_extra_paths(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_render_timeout_secs() -> u64 {
    10
}
fn default_fetch_timeout_secs() -> u64 {
    15
}
fn default_max_pages() -> usize {
    5
}
fn default_min_content_chars() -> usize {
    100
}
fn default_max_content_chars() -> usize {
    5000
}
fn default_extra_paths() -> Vec<String> {
    [
        "/features",
        "/pricing",
        "/docs",
        "/help",
        "/about",
        "/how-it-works",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; Clonetime/1.0)".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Filled from `api_key_env` at load time when not set in the file.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_prompt_char_budget")]
    pub prompt_char_budget: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_base: default_api_base(),
            api_key_env: default_api_key_env(),
            api_key: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_llm_timeout_secs(),
            prompt_char_budget: default_prompt_char_budget(),
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_model() -> String {
    "gpt-4".to_string()
}
fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_temperature() -> f64 {
    0.3
}
fn default_max_tokens() -> u32 {
    2000
}
fn default_llm_timeout_secs() -> u64 {
    60
}
fn default_prompt_char_budget() -> usize {
    clonetime_core::prompt::DEFAULT_PROMPT_CHAR_BUDGET
}

impl LlmConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

impl Config {
    /// Defaults for everything, with the database at `db_path`, the model
    /// disabled, and the browser off. Used by tests and ad-hoc commands.
    pub fn minimal(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db: DbConfig {
                path: db_path.into(),
            },
            server: ServerConfig::default(),
            runtime: RuntimeConfig::default(),
            crawler: CrawlerConfig {
                browser: false,
                ..CrawlerConfig::default()
            },
            llm: LlmConfig {
                provider: "disabled".to_string(),
                ..LlmConfig::default()
            },
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    resolve_env(&mut config)?;
    validate(&config)?;

    Ok(config)
}

/// Apply environment overrides: runtime mode and the model API key.
fn resolve_env(config: &mut Config) -> Result<()> {
    if let Ok(mode) = std::env::var(RUNTIME_MODE_ENV) {
        config.runtime.mode = match mode.to_lowercase().as_str() {
            "development" | "dev" => RuntimeMode::Development,
            "production" | "prod" => RuntimeMode::Production,
            other => anyhow::bail!(
                "{} must be development or production, got '{}'",
                RUNTIME_MODE_ENV,
                other
            ),
        };
    }

    if config.llm.api_key.is_none() {
        config.llm.api_key = std::env::var(&config.llm.api_key_env)
            .ok()
            .filter(|k| !k.is_empty());
    }
    Ok(())
}

fn validate(config: &Config) -> Result<()> {
    // Validate crawler
    if config.crawler.max_pages == 0 {
        anyhow::bail!("crawler.max_pages must be >= 1");
    }
    if config.crawler.max_content_chars == 0 {
        anyhow::bail!("crawler.max_content_chars must be > 0");
    }
    if let Some(bad) = config.crawler.extra_paths.iter().find(|p| !p.starts_with('/')) {
        anyhow::bail!("crawler.extra_paths entries must start with '/': '{}'", bad);
    }

    // Validate llm
    if !(0.0..=2.0).contains(&config.llm.temperature) {
        anyhow::bail!("llm.temperature must be in [0.0, 2.0]");
    }
    if config.llm.max_tokens == 0 {
        anyhow::bail!("llm.max_tokens must be > 0");
    }
    if config.llm.prompt_char_budget == 0 {
        anyhow::bail!("llm.prompt_char_budget must be > 0");
    }

    match config.llm.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown llm provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    Ok(())
}
