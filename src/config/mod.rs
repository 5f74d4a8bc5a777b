#[cfg(feature = "cli")]
pub mod cli;
pub mod env;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, Command};
pub use env::EnvConfig;
pub use toml_config::TomlConfig;

use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_range, validate_url};

pub const DEFAULT_STUDIO_NAME: &str = "Greenwood Recording Studio";
pub const DEFAULT_LOOKAHEAD_DAYS: u32 = 30;
pub const MAX_LOOKAHEAD_DAYS: u32 = 365;

/// 三種設定來源共用的檢查
pub fn validate_provider<C: ConfigProvider + ?Sized>(config: &C) -> Result<()> {
    validate_url("backend.url", config.backend_url())?;
    validate_non_empty_string("backend.anon_key", config.api_key())?;
    if let Some(service_key) = config.service_key() {
        validate_non_empty_string("backend.service_key", service_key)?;
    }
    validate_non_empty_string("studio.name", config.studio_name())?;
    validate_non_empty_string("notifications.email_function", config.email_function())?;
    validate_range(
        "studio.lookahead_days",
        config.lookahead_days(),
        1,
        MAX_LOOKAHEAD_DAYS,
    )?;
    Ok(())
}

/// `available-dates` 沒指定數量時，列出 lookahead_days 天份的日期
pub fn available_date_count<C: ConfigProvider + ?Sized>(
    requested: Option<usize>,
    config: &C,
) -> usize {
    requested.unwrap_or(config.lookahead_days() as usize)
}
