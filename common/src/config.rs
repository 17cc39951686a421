use crate::error::{Result, TalkDbError};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_DB_HOST: &str = "localhost";
pub const DEFAULT_DB_PORT: u16 = 3306;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// mysql connection parameters; missing values are reported at first use
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_DB_HOST.to_string(),
            port: DEFAULT_DB_PORT,
            user: None,
            password: None,
            name: None,
        }
    }
}

impl DatabaseConfig {
    pub fn user(&self) -> Result<&str> {
        required(self.user.as_deref(), "DB_USER")
    }

    pub fn name(&self) -> Result<&str> {
        required(self.name.as_deref(), "DB_NAME")
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }
}

fn required<'a>(value: Option<&'a str>, var: &str) -> Result<&'a str> {
    value
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| TalkDbError::Config(format!("{} is not set", var)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    #[default]
    Groq,
    OpenAi,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Groq => "groq",
            Provider::OpenAi => "openai",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Groq => "https://api.groq.com/openai/v1",
            Provider::OpenAi => "https://api.openai.com/v1",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Groq => "llama-3.1-8b-instant",
            Provider::OpenAi => "gpt-4o-mini",
        }
    }

    /// environment variable holding the provider credential
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Provider::Groq => "GROQ_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "groq" => Ok(Provider::Groq),
            "openai" => Ok(Provider::OpenAi),
            other => Err(format!("unknown provider '{}' (expected groq or openai)", other)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GenerationConfig {
    pub provider: Provider,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

impl GenerationConfig {
    pub fn model(&self) -> String {
        self.model
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.provider.default_model().to_string())
    }

    pub fn base_url(&self) -> String {
        self.base_url
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.provider.default_base_url().to_string())
            .trim_end_matches('/')
            .to_string()
    }

    /// explicit key first, then the provider's environment variable
    pub fn api_key(&self) -> Result<String> {
        self.api_key
            .clone()
            .or_else(|| {
                env::var(self.provider.api_key_var())
                    .ok()
                    .filter(|s| !s.is_empty())
            })
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                TalkDbError::Config(format!(
                    "{} is not set in environment",
                    self.provider.api_key_var()
                ))
            })
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_config_missing_name() {
        let config = DatabaseConfig {
            user: Some("root".to_string()),
            ..DatabaseConfig::default()
        };
        assert_eq!(config.user().unwrap(), "root");
        let err = config.name().unwrap_err();
        assert!(matches!(err, TalkDbError::Config(_)));
        assert!(err.to_string().contains("DB_NAME"));
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let config = DatabaseConfig {
            user: Some("  ".to_string()),
            ..DatabaseConfig::default()
        };
        assert!(config.user().is_err());
    }

    #[test]
    fn test_provider_parsing() {
        assert_eq!("groq".parse::<Provider>().unwrap(), Provider::Groq);
        assert_eq!("OpenAI".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert!("claude".parse::<Provider>().is_err());
    }

    #[test]
    fn test_generation_defaults_follow_provider() {
        let config = GenerationConfig {
            provider: Provider::OpenAi,
            base_url: Some("http://localhost:8080/v1/".to_string()),
            ..GenerationConfig::default()
        };
        assert_eq!(config.model(), "gpt-4o-mini");
        assert_eq!(config.base_url(), "http://localhost:8080/v1");
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let config = GenerationConfig {
            api_key: Some("sk-test".to_string()),
            ..GenerationConfig::default()
        };
        assert_eq!(config.api_key().unwrap(), "sk-test");
    }
}
