use crate::adapters::supabase::DEFAULT_EMAIL_FUNCTION;
use crate::config::{validate_provider, DEFAULT_LOOKAHEAD_DAYS, DEFAULT_STUDIO_NAME};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{BookingError, Result};
use crate::utils::validation::Validate;
use std::env;

#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub backend_url: String,
    pub anon_key: String,
    pub service_key: Option<String>,
    pub studio_name: String,
    pub email_function: String,
    pub lookahead_days: u32,
}

/// 依序讀取第一個有值的環境變數
fn first_var(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}

impl EnvConfig {
    /// 先載入 .env，再從環境變數組出設定
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }
        Self::from_vars()
    }

    /// 只讀目前的環境變數，不碰 .env
    pub fn from_vars() -> Result<Self> {
        let backend_url = first_var(&["SUPABASE_URL", "VITE_SUPABASE_URL"]).ok_or_else(|| {
            BookingError::MissingConfigError {
                field: "SUPABASE_URL".to_string(),
            }
        })?;
        let anon_key = first_var(&["SUPABASE_ANON_KEY", "VITE_SUPABASE_ANON_KEY"]).ok_or_else(
            || BookingError::MissingConfigError {
                field: "SUPABASE_ANON_KEY".to_string(),
            },
        )?;

        let lookahead_days = match first_var(&["LOOKAHEAD_DAYS"]) {
            Some(raw) => raw
                .parse()
                .map_err(|_| BookingError::InvalidConfigValueError {
                    field: "LOOKAHEAD_DAYS".to_string(),
                    value: raw.clone(),
                    reason: "Expected a positive number of days".to_string(),
                })?,
            None => DEFAULT_LOOKAHEAD_DAYS,
        };

        Ok(Self {
            backend_url,
            anon_key,
            service_key: first_var(&["SUPABASE_SERVICE_KEY"]),
            studio_name: first_var(&["STUDIO_NAME"])
                .unwrap_or_else(|| DEFAULT_STUDIO_NAME.to_string()),
            email_function: first_var(&["EMAIL_FUNCTION"])
                .unwrap_or_else(|| DEFAULT_EMAIL_FUNCTION.to_string()),
            lookahead_days,
        })
    }
}

impl ConfigProvider for EnvConfig {
    fn backend_url(&self) -> &str {
        &self.backend_url
    }

    fn api_key(&self) -> &str {
        &self.anon_key
    }

    fn service_key(&self) -> Option<&str> {
        self.service_key.as_deref()
    }

    fn studio_name(&self) -> &str {
        &self.studio_name
    }

    fn email_function(&self) -> &str {
        &self.email_function
    }

    fn lookahead_days(&self) -> u32 {
        self.lookahead_days
    }
}

impl Validate for EnvConfig {
    fn validate(&self) -> Result<()> {
        validate_provider(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 環境變數是整個行程共用的，全部放在同一個測試裡避免互相干擾
    #[test]
    fn test_from_vars() {
        for name in [
            "SUPABASE_URL",
            "SUPABASE_ANON_KEY",
            "SUPABASE_SERVICE_KEY",
            "STUDIO_NAME",
            "EMAIL_FUNCTION",
            "LOOKAHEAD_DAYS",
        ] {
            env::remove_var(name);
        }
        env::remove_var("VITE_SUPABASE_URL");
        env::remove_var("VITE_SUPABASE_ANON_KEY");

        assert!(matches!(
            EnvConfig::from_vars(),
            Err(BookingError::MissingConfigError { .. })
        ));

        env::set_var("VITE_SUPABASE_URL", "https://vite.supabase.co");
        env::set_var("VITE_SUPABASE_ANON_KEY", "vite-anon");
        let config = EnvConfig::from_vars().unwrap();
        assert_eq!(config.backend_url(), "https://vite.supabase.co");
        assert_eq!(config.api_key(), "vite-anon");
        assert_eq!(config.studio_name(), "Greenwood Recording Studio");
        assert_eq!(config.email_function(), "send-email");
        assert_eq!(config.lookahead_days(), 30);
        assert_eq!(config.service_key(), None);
        assert!(config.validate().is_ok());

        env::set_var("SUPABASE_URL", "https://primary.supabase.co");
        env::set_var("LOOKAHEAD_DAYS", "soon");
        assert!(matches!(
            EnvConfig::from_vars(),
            Err(BookingError::InvalidConfigValueError { .. })
        ));

        env::set_var("LOOKAHEAD_DAYS", "14");
        env::set_var("SUPABASE_SERVICE_KEY", "service");
        let config = EnvConfig::from_vars().unwrap();
        assert_eq!(config.backend_url(), "https://primary.supabase.co");
        assert_eq!(config.lookahead_days(), 14);
        assert_eq!(config.service_key(), Some("service"));

        for name in [
            "SUPABASE_URL",
            "SUPABASE_SERVICE_KEY",
            "LOOKAHEAD_DAYS",
            "VITE_SUPABASE_URL",
            "VITE_SUPABASE_ANON_KEY",
        ] {
            env::remove_var(name);
        }
    }
}
