use crate::domain::model::AppUser;
use crate::domain::ports::AuthProvider;
use crate::utils::error::{BookingError, Result};
use crate::utils::validation::validate_email;

pub const ADMIN_DISPLAY_NAME: &str = "Admin User";
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// 建立一個已驗證信箱、role = admin 的使用者
pub async fn create_admin(
    auth: &dyn AuthProvider,
    email: &str,
    password: &str,
) -> Result<AppUser> {
    validate_email("email", email)?;
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(BookingError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    tracing::info!("Creating admin user: {}", email);
    let user = auth
        .create_admin_user(email.trim(), password, ADMIN_DISPLAY_NAME)
        .await?;
    tracing::info!("✅ Admin user created successfully! User ID: {}", user.id);
    Ok(user)
}
