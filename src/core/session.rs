use crate::domain::model::AppUser;
use crate::domain::ports::AuthProvider;
use crate::utils::error::Result;
use std::sync::Arc;

/// 管理介面的登入狀態
pub struct SessionManager {
    auth: Arc<dyn AuthProvider>,
    current_user: Option<AppUser>,
    last_error: Option<String>,
}

impl SessionManager {
    pub fn new(auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            auth,
            current_user: None,
            last_error: None,
        }
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<AppUser> {
        self.last_error = None;
        match self.auth.sign_in_with_password(email, password).await {
            Ok(session) => {
                tracing::info!("🔐 Signed in as {}", email);
                self.current_user = Some(session.user.clone());
                Ok(session.user)
            }
            Err(e) => {
                tracing::warn!("Sign in failed for {}: {}", email, e);
                self.last_error = Some(e.user_friendly_message());
                Err(e)
            }
        }
    }

    pub async fn sign_out(&mut self) -> Result<()> {
        if let Err(e) = self.auth.sign_out().await {
            tracing::error!("Error signing out: {}", e);
            return Err(e);
        }
        self.current_user = None;
        Ok(())
    }

    /// 以目前保存的 token 重新取得使用者；沒有 session 時為 None
    pub async fn check_auth(&mut self) -> Result<Option<&AppUser>> {
        self.last_error = None;
        match self.auth.get_user().await {
            Ok(user) => {
                self.current_user = user;
                Ok(self.current_user.as_ref())
            }
            Err(e) => {
                self.last_error = Some(e.user_friendly_message());
                Err(e)
            }
        }
    }

    pub fn current_user(&self) -> Option<&AppUser> {
        self.current_user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.current_user.as_ref().is_some_and(AppUser::is_admin)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
