use super::SupabaseClient;
use crate::domain::model::{AppUser, Session, UserMetadata, UserRole};
use crate::domain::ports::AuthProvider;
use crate::utils::error::{BookingError, Result};
use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct AdminUserRequest<'a> {
    email: &'a str,
    password: &'a str,
    email_confirm: bool,
    user_metadata: UserMetadata,
}

/// 登入相關端點的 400/401 一律視為驗證失敗
fn into_auth_error(err: BookingError) -> BookingError {
    match err {
        BookingError::BackendError {
            status: 400 | 401 | 403 | 422,
            message,
            ..
        } => BookingError::AuthError { message },
        other => other,
    }
}

#[async_trait]
impl AuthProvider for SupabaseClient {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        tracing::debug!("🔐 Signing in as {}", email);
        let builder = self
            .request(Method::POST, url)
            .json(&PasswordGrant { email, password });
        let session: Session = self.send_json(builder).await.map_err(into_auth_error)?;

        self.set_access_token(Some(session.access_token.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        if self.access_token().is_none() {
            return Ok(());
        }

        let builder = self.request(Method::POST, self.endpoint("auth/v1/logout")?);
        self.send_empty(builder).await.map_err(into_auth_error)?;
        self.set_access_token(None);
        Ok(())
    }

    async fn get_user(&self) -> Result<Option<AppUser>> {
        if self.access_token().is_none() {
            return Ok(None);
        }

        let builder = self.request(Method::GET, self.endpoint("auth/v1/user")?);
        match self.send_json::<AppUser>(builder).await {
            Ok(user) => Ok(Some(user)),
            Err(BookingError::BackendError { status: 401 | 403, message, .. }) => {
                tracing::warn!("Stored session is no longer valid: {}", message);
                self.set_access_token(None);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn create_admin_user(&self, email: &str, password: &str, name: &str) -> Result<AppUser> {
        let request = AdminUserRequest {
            email,
            password,
            email_confirm: true,
            user_metadata: UserMetadata {
                role: Some(UserRole::Admin),
                name: Some(name.to_string()),
                avatar_url: None,
            },
        };

        let builder = self
            .request(Method::POST, self.endpoint("auth/v1/admin/users")?)
            .json(&request);
        self.send_json(builder).await.map_err(into_auth_error)
    }
}
