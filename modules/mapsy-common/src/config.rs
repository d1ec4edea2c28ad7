use std::time::Duration;

use anyhow::{bail, Context, Result};

pub const DEFAULT_OLLAMA_API_URL: &str = "https://ai.suhsaechan.kr/api/chat";
pub const DEFAULT_OLLAMA_MODEL: &str = "gemma3:1b-it-qat";
pub const DEFAULT_KAKAO_API_URL: &str = "https://dapi.kakao.com/v2/local/search/address.json";
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_BROWSER_MAX_SESSIONS: usize = 2;

/// Application configuration loaded from environment variables.
/// Built once at startup and handed to each component by value.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Inbound auth
    pub ai_server_api_key: String,

    // Callback
    pub backend_callback_url: String,
    pub backend_api_key: String,

    // LLM
    pub ollama_api_url: String,
    pub ollama_api_key: String,
    pub ollama_model: String,
    pub extraction_max_attempts: u32,

    // Browser
    pub browserless_url: String,
    pub browserless_token: Option<String>,
    pub browser_max_sessions: usize,

    // Geocoding
    pub kakao_rest_api_key: String,
    pub kakao_api_url: String,
    pub nominatim_url: String,

    // Server
    pub web_host: String,
    pub web_port: u16,
    pub environment: String,

    // Timeouts (seconds)
    pub scrape_timeout_secs: u64,
    pub llm_timeout_secs: u64,
    pub callback_timeout_secs: u64,
    pub geocode_timeout_secs: u64,
    pub shutdown_grace_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. `from_env` passes the process environment.
    ///
    /// The callback timeout must be shorter than the scrape and model
    /// timeouts.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{key} must be set"))
        };
        let or_default = |key: &str, default: &str| -> String {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let config = Self {
            ai_server_api_key: required("AI_SERVER_API_KEY")?,
            backend_callback_url: required("BACKEND_CALLBACK_URL")?,
            backend_api_key: required("BACKEND_API_KEY")?,
            ollama_api_url: or_default("OLLAMA_API_URL", DEFAULT_OLLAMA_API_URL),
            ollama_api_key: lookup("OLLAMA_API_KEY").unwrap_or_default(),
            ollama_model: or_default("OLLAMA_MODEL", DEFAULT_OLLAMA_MODEL),
            extraction_max_attempts: parse_or(&lookup, "EXTRACTION_MAX_ATTEMPTS", 3)?,
            browserless_url: required("BROWSERLESS_URL")?,
            browserless_token: lookup("BROWSERLESS_TOKEN").filter(|v| !v.is_empty()),
            browser_max_sessions: parse_or(
                &lookup,
                "BROWSER_MAX_SESSIONS",
                DEFAULT_BROWSER_MAX_SESSIONS,
            )?,
            kakao_rest_api_key: required("KAKAO_REST_API_KEY")?,
            kakao_api_url: or_default("KAKAO_API_URL", DEFAULT_KAKAO_API_URL),
            nominatim_url: or_default("NOMINATIM_URL", DEFAULT_NOMINATIM_URL),
            web_host: or_default("WEB_HOST", "0.0.0.0"),
            web_port: parse_or(&lookup, "WEB_PORT", 8001)?,
            environment: or_default("ENVIRONMENT", "dev"),
            scrape_timeout_secs: parse_or(&lookup, "SCRAPE_TIMEOUT_SECS", 60)?,
            llm_timeout_secs: parse_or(&lookup, "LLM_TIMEOUT_SECS", 120)?,
            callback_timeout_secs: parse_or(&lookup, "CALLBACK_TIMEOUT_SECS", 10)?,
            geocode_timeout_secs: parse_or(&lookup, "GEOCODE_TIMEOUT_SECS", 10)?,
            shutdown_grace_secs: parse_or(&lookup, "SHUTDOWN_GRACE_SECS", 30)?,
        };

        if config.browser_max_sessions == 0 {
            bail!("BROWSER_MAX_SESSIONS must be at least 1");
        }
        let stage_floor = config.scrape_timeout_secs.min(config.llm_timeout_secs);
        if config.callback_timeout_secs >= stage_floor {
            bail!(
                "CALLBACK_TIMEOUT_SECS ({}) must be shorter than the scrape and model timeouts ({}s)",
                config.callback_timeout_secs,
                stage_floor
            );
        }
        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("prod")
    }

    pub fn scrape_timeout(&self) -> Duration {
        Duration::from_secs(self.scrape_timeout_secs)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    pub fn callback_timeout(&self) -> Duration {
        Duration::from_secs(self.callback_timeout_secs)
    }

    pub fn geocode_timeout(&self) -> Duration {
        Duration::from_secs(self.geocode_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    pub fn log_keys(&self) {
        fn preview(val: &str) -> String {
            let n = val.char_indices().nth(5).map(|(i, _)| i).unwrap_or(val.len());
            format!("{}...({} chars)", &val[..n], val.len())
        }
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) if !v.is_empty() => preview(v),
                _ => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded:");
        tracing::info!("  ENVIRONMENT: {}", self.environment);
        tracing::info!("  AI_SERVER_API_KEY: {}", preview(&self.ai_server_api_key));
        tracing::info!("  BACKEND_CALLBACK_URL: {}", self.backend_callback_url);
        tracing::info!("  BACKEND_API_KEY: {}", preview(&self.backend_api_key));
        tracing::info!("  OLLAMA_API_URL: {}", self.ollama_api_url);
        tracing::info!("  OLLAMA_MODEL: {}", self.ollama_model);
        tracing::info!("  KAKAO_REST_API_KEY: {}", preview(&self.kakao_rest_api_key));
        tracing::info!("  BROWSERLESS_URL: {}", self.browserless_url);
        tracing::info!("  BROWSERLESS_TOKEN: {}", preview_opt(&self.browserless_token));
        tracing::info!("  BROWSER_MAX_SESSIONS: {}", self.browser_max_sessions);
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn required_vars() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("AI_SERVER_API_KEY", "inbound-secret"),
            ("BACKEND_CALLBACK_URL", "http://backend/callback"),
            ("BACKEND_API_KEY", "backend-secret"),
            ("KAKAO_REST_API_KEY", "kakao"),
            ("BROWSERLESS_URL", "http://browserless:3000"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<AppConfig> {
        AppConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()))
    }

    #[test]
    fn defaults_fill_optional_values() {
        let config = load(&required_vars()).unwrap();
        assert_eq!(config.ollama_api_url, DEFAULT_OLLAMA_API_URL);
        assert_eq!(config.ollama_model, DEFAULT_OLLAMA_MODEL);
        assert_eq!(config.web_port, 8001);
        assert_eq!(config.extraction_max_attempts, 3);
        assert_eq!(config.callback_timeout(), Duration::from_secs(10));
        assert!(config.browserless_token.is_none());
        assert_eq!(config.browser_max_sessions, DEFAULT_BROWSER_MAX_SESSIONS);
        assert!(!config.is_production());
    }

    #[test]
    fn missing_required_key_is_named() {
        let mut vars = required_vars();
        vars.remove("BACKEND_API_KEY");
        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("BACKEND_API_KEY"));
    }

    #[test]
    fn bad_number_is_rejected() {
        let mut vars = required_vars();
        vars.insert("WEB_PORT", "eighty");
        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("WEB_PORT"));
    }

    #[test]
    fn overrides_apply() {
        let mut vars = required_vars();
        vars.insert("ENVIRONMENT", "prod");
        vars.insert("EXTRACTION_MAX_ATTEMPTS", "5");
        vars.insert("BROWSERLESS_TOKEN", "tok");
        let config = load(&vars).unwrap();
        assert!(config.is_production());
        assert_eq!(config.extraction_max_attempts, 5);
        assert_eq!(config.browserless_token.as_deref(), Some("tok"));
    }

    #[test]
    fn callback_timeout_must_undercut_stage_timeouts() {
        let mut vars = required_vars();
        vars.insert("CALLBACK_TIMEOUT_SECS", "120");
        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("CALLBACK_TIMEOUT_SECS"));

        vars.insert("CALLBACK_TIMEOUT_SECS", "60");
        assert!(load(&vars).is_err());

        vars.insert("CALLBACK_TIMEOUT_SECS", "59");
        assert!(load(&vars).is_ok());
    }

    #[test]
    fn browser_sessions_are_configurable() {
        let mut vars = required_vars();
        vars.insert("BROWSER_MAX_SESSIONS", "4");
        assert_eq!(load(&vars).unwrap().browser_max_sessions, 4);

        vars.insert("BROWSER_MAX_SESSIONS", "0");
        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("BROWSER_MAX_SESSIONS"));
    }
}
