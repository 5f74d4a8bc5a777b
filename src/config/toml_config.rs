use crate::adapters::supabase::DEFAULT_EMAIL_FUNCTION;
use crate::config::{validate_provider, DEFAULT_LOOKAHEAD_DAYS, DEFAULT_STUDIO_NAME};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{BookingError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub backend: BackendConfig,
    #[serde(default)]
    pub studio: StudioConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
    pub service_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudioConfig {
    pub name: String,
    pub lookahead_days: u32,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_STUDIO_NAME.to_string(),
            lookahead_days: DEFAULT_LOOKAHEAD_DAYS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub email_function: String,
    pub enabled: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            email_function: DEFAULT_EMAIL_FUNCTION.to_string(),
            enabled: true,
        }
    }
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"))
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        let mut config: Self =
            toml::from_str(&processed_content).map_err(|e| BookingError::ConfigError {
                message: format!("TOML parsing error: {}", e),
            })?;

        // 沒設定的 ${VAR} 會原樣留下，service key 視為沒給
        if config
            .backend
            .service_key
            .as_deref()
            .is_some_and(|key| key.is_empty() || env_var_pattern().is_match(key))
        {
            config.backend.service_key = None;
        }
        Ok(config)
    }

    /// 替換環境變數 (例如 ${SUPABASE_ANON_KEY})，找不到的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn notifications_enabled(&self) -> bool {
        self.notifications.enabled
    }
}

impl ConfigProvider for TomlConfig {
    fn backend_url(&self) -> &str {
        &self.backend.url
    }

    fn api_key(&self) -> &str {
        &self.backend.anon_key
    }

    fn service_key(&self) -> Option<&str> {
        self.backend.service_key.as_deref()
    }

    fn studio_name(&self) -> &str {
        &self.studio.name
    }

    fn email_function(&self) -> &str {
        &self.notifications.email_function
    }

    fn lookahead_days(&self) -> u32 {
        self.studio.lookahead_days
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_provider(self)?;

        // 未替換的環境變數代表部署時漏設
        for (field, value) in [
            ("backend.url", self.backend.url.as_str()),
            ("backend.anon_key", self.backend.anon_key.as_str()),
        ] {
            if env_var_pattern().is_match(value) {
                return Err(BookingError::InvalidConfigValueError {
                    field: field.to_string(),
                    value: value.to_string(),
                    reason: "Environment variable is not set".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[backend]
url = "https://demo.supabase.co"
anon_key = "anon"
service_key = "service"

[studio]
name = "Basement Tapes"
lookahead_days = 14

[notifications]
email_function = "notify"
enabled = false
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.backend_url(), "https://demo.supabase.co");
        assert_eq!(config.service_key(), Some("service"));
        assert_eq!(config.studio_name(), "Basement Tapes");
        assert_eq!(config.lookahead_days(), 14);
        assert_eq!(config.email_function(), "notify");
        assert!(!config.notifications_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_for_optional_sections() {
        let toml_content = r#"
[backend]
url = "https://demo.supabase.co"
anon_key = "anon"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.studio_name(), "Greenwood Recording Studio");
        assert_eq!(config.lookahead_days(), 30);
        assert_eq!(config.email_function(), "send-email");
        assert!(config.notifications_enabled());
        assert_eq!(config.service_key(), None);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("STUDIO_TOML_TEST_KEY", "from-env");

        let toml_content = r#"
[backend]
url = "https://demo.supabase.co"
anon_key = "${STUDIO_TOML_TEST_KEY}"
service_key = "${STUDIO_TOML_TEST_MISSING}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.api_key(), "from-env");
        assert_eq!(config.service_key(), None);

        std::env::remove_var("STUDIO_TOML_TEST_KEY");
    }

    #[test]
    fn test_unset_variable_fails_validation() {
        let toml_content = r#"
[backend]
url = "https://demo.supabase.co"
anon_key = "${STUDIO_TOML_TEST_UNSET}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(matches!(
            config.validate(),
            Err(BookingError::InvalidConfigValueError { .. })
        ));
    }

    #[test]
    fn test_invalid_url_and_days() {
        let bad_url = r#"
[backend]
url = "not-a-url"
anon_key = "anon"
"#;
        assert!(TomlConfig::from_toml_str(bad_url).unwrap().validate().is_err());

        let bad_days = r#"
[backend]
url = "https://demo.supabase.co"
anon_key = "anon"

[studio]
name = "Studio"
lookahead_days = 0
"#;
        assert!(TomlConfig::from_toml_str(bad_days).unwrap().validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[backend]\nurl = \"https://file.supabase.co\"\nanon_key = \"anon\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.backend_url(), "https://file.supabase.co");
    }

    #[test]
    fn test_missing_backend_section() {
        assert!(matches!(
            TomlConfig::from_toml_str("[studio]\nname = \"x\"\nlookahead_days = 3\n"),
            Err(BookingError::ConfigError { .. })
        ));
    }
}
