use thiserror::Error;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Backend returned {status}: {message}")]
    BackendError {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Duplicate record: {message}")]
    UniqueViolation { message: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Authentication error: {message}")]
    AuthError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Backend,
    Auth,
    Configuration,
    Input,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// PostgREST 的唯一約束衝突代碼
pub const UNIQUE_VIOLATION_CODE: &str = "23505";

impl BookingError {
    pub fn backend(status: u16, code: Option<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        if status == 409 || code.as_deref() == Some(UNIQUE_VIOLATION_CODE) {
            return BookingError::UniqueViolation { message };
        }
        BookingError::BackendError {
            status,
            code,
            message,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        BookingError::ValidationError {
            message: message.into(),
        }
    }

    pub fn not_found(entity: &str, id: impl Into<String>) -> Self {
        BookingError::NotFound {
            entity: entity.to_string(),
            id: id.into(),
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, BookingError::UniqueViolation { .. })
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            BookingError::ApiError(_) => ErrorCategory::Network,
            BookingError::BackendError { status, .. } if *status == 401 || *status == 403 => {
                ErrorCategory::Auth
            }
            BookingError::BackendError { .. }
            | BookingError::UniqueViolation { .. }
            | BookingError::NotFound { .. } => ErrorCategory::Backend,
            BookingError::AuthError { .. } => ErrorCategory::Auth,
            BookingError::ConfigError { .. }
            | BookingError::MissingConfigError { .. }
            | BookingError::InvalidConfigValueError { .. }
            | BookingError::UrlError(_) => ErrorCategory::Configuration,
            BookingError::ValidationError { .. } => ErrorCategory::Input,
            BookingError::IoError(_) | BookingError::SerializationError(_) => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Backend | ErrorCategory::Auth => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 給終端使用者看的訊息，不含內部細節
    pub fn user_friendly_message(&self) -> String {
        match self {
            BookingError::ApiError(_) => {
                "Could not reach the booking service. Please try again.".to_string()
            }
            BookingError::BackendError { message, .. } => {
                format!("The booking service rejected the request: {}", message)
            }
            BookingError::UniqueViolation { .. } => {
                "A record with the same details already exists.".to_string()
            }
            BookingError::NotFound { entity, id } => format!("{} '{}' was not found.", entity, id),
            BookingError::AuthError { message } => format!("Authentication failed: {}", message),
            BookingError::ValidationError { message } => message.clone(),
            BookingError::MissingConfigError { field } => {
                format!("Missing required setting '{}'.", field)
            }
            BookingError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check your network connection and the backend URL.",
            ErrorCategory::Backend => "Check the request data and the backend table schema.",
            ErrorCategory::Auth => "Check the API key or sign in again.",
            ErrorCategory::Configuration => {
                "Check SUPABASE_URL / SUPABASE_ANON_KEY or the TOML config file."
            }
            ErrorCategory::Input => "Correct the highlighted input and submit again.",
            ErrorCategory::System => "Check file permissions and disk space.",
        }
    }

    /// 依嚴重程度決定 CLI 的結束碼；只要是錯誤就不為 0
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low | ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, BookingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_conflict_becomes_unique_violation() {
        let err = BookingError::backend(409, Some("23505".to_string()), "duplicate key");
        assert!(err.is_unique_violation());

        let err = BookingError::backend(400, Some("23505".to_string()), "duplicate key");
        assert!(err.is_unique_violation());

        let err = BookingError::backend(400, Some("22P02".to_string()), "bad input");
        assert!(!err.is_unique_violation());
    }

    #[test]
    fn test_severity_and_exit_codes() {
        let err = BookingError::validation("Email is required");
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.user_friendly_message(), "Email is required");

        let err = BookingError::MissingConfigError {
            field: "backend.url".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.exit_code(), 3);

        let err = BookingError::backend(401, None, "invalid JWT");
        assert_eq!(err.category(), ErrorCategory::Auth);
    }

    #[test]
    fn test_every_error_exits_non_zero() {
        let errors = [
            BookingError::validation("Please enter your name"),
            BookingError::not_found("Booking", "b1"),
            BookingError::backend(500, None, "boom"),
            BookingError::AuthError {
                message: "Invalid login credentials".to_string(),
            },
            BookingError::ConfigError {
                message: "bad toml".to_string(),
            },
        ];
        for err in errors {
            assert!(err.exit_code() > 0, "{:?} exited with 0", err);
        }
    }
}
