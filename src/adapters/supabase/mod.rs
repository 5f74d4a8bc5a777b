//! Supabase 託管後端的 HTTP 轉接層
//!
//! 資料表走 PostgREST (`/rest/v1`)，登入走 GoTrue (`/auth/v1`)，
//! 寄信走 Edge Function (`/functions/v1`)。

pub mod auth;
pub mod functions;
pub mod tables;

use crate::domain::ports::ConfigProvider;
use crate::utils::error::{BookingError, Result};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::sync::{Arc, RwLock};
use url::Url;

pub use tables::{TableQuery, Tables};

pub const DEFAULT_EMAIL_FUNCTION: &str = "send-email";

#[derive(Debug, Clone)]
pub struct SupabaseClient {
    http: Client,
    base_url: Url,
    api_key: String,
    email_function: String,
    access_token: Arc<RwLock<Option<String>>>,
}

impl SupabaseClient {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self> {
        crate::utils::validation::validate_url("backend_url", base_url)?;

        // 確保結尾有斜線，否則 Url::join 會吃掉最後一段路徑
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };

        Ok(Self {
            http: Client::new(),
            base_url: Url::parse(&normalized)?,
            api_key: api_key.into(),
            email_function: DEFAULT_EMAIL_FUNCTION.to_string(),
            access_token: Arc::new(RwLock::new(None)),
        })
    }

    /// 以公開 (anon) key 建立，給前台與管理介面使用
    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        Ok(Self::new(config.backend_url(), config.api_key())?
            .with_email_function(config.email_function()))
    }

    /// 以 service role key 建立，給管理腳本使用
    pub fn service_role<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        let service_key = config
            .service_key()
            .ok_or_else(|| BookingError::MissingConfigError {
                field: "SUPABASE_SERVICE_KEY".to_string(),
            })?;
        Ok(Self::new(config.backend_url(), service_key)?
            .with_email_function(config.email_function()))
    }

    pub fn with_email_function(mut self, name: &str) -> Self {
        self.email_function = name.to_string();
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn email_function(&self) -> &str {
        &self.email_function
    }

    pub fn access_token(&self) -> Option<String> {
        self.access_token.read().ok().and_then(|token| token.clone())
    }

    pub fn set_access_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.access_token.write() {
            *guard = token;
        }
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// 每個請求都帶 apikey，Authorization 優先使用登入後的 token
    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let bearer = self.access_token().unwrap_or_else(|| self.api_key.clone());
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(bearer)
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await?;
        let response = Self::check_status(response).await?;
        let body = response.text().await?;
        tracing::debug!("Backend response body: {} bytes", body.len());
        Ok(serde_json::from_str(&body)?)
    }

    pub(crate) async fn send_empty(&self, builder: RequestBuilder) -> Result<()> {
        let response = builder.send().await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        tracing::debug!("Backend response status: {}", status);
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let (code, message) = parse_error_body(&text);
        let message = message.unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown backend error")
                .to_string()
        });
        tracing::warn!(
            "Backend request failed: {} (code: {:?}) {}",
            status,
            code,
            message
        );
        Err(BookingError::backend(status.as_u16(), code, message))
    }
}

/// PostgREST 回傳 `{code, message, details, hint}`，GoTrue 回傳
/// `{error, error_description}` 或 `{msg, error_code}`
fn parse_error_body(text: &str) -> (Option<String>, Option<String>) {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(text) else {
        let trimmed = text.trim();
        return (None, (!trimmed.is_empty()).then(|| trimmed.to_string()));
    };

    let code = ["code", "error_code"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()))
        .map(str::to_string);

    let message = ["message", "msg", "error_description", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()))
        .map(str::to_string);

    (code, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let client = SupabaseClient::new("https://abc.supabase.co/project", "anon").unwrap();
        let url = client.endpoint("rest/v1/bookings").unwrap();
        assert_eq!(url.as_str(), "https://abc.supabase.co/project/rest/v1/bookings");
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(SupabaseClient::new("not a url", "anon").is_err());
        assert!(SupabaseClient::new("ftp://abc.supabase.co", "anon").is_err());
    }

    #[test]
    fn test_access_token_roundtrip() {
        let client = SupabaseClient::new("https://abc.supabase.co", "anon").unwrap();
        assert_eq!(client.access_token(), None);

        let shared = client.clone();
        client.set_access_token(Some("jwt".to_string()));
        assert_eq!(shared.access_token().as_deref(), Some("jwt"));
    }

    #[test]
    fn test_parse_postgrest_error() {
        let (code, message) = parse_error_body(
            r#"{"code":"23505","details":"Key (email)=(a@b.c) already exists.","hint":null,"message":"duplicate key value violates unique constraint \"clients_email_key\""}"#,
        );
        assert_eq!(code.as_deref(), Some("23505"));
        assert!(message.unwrap().starts_with("duplicate key value"));
    }

    #[test]
    fn test_parse_auth_error() {
        let (code, message) = parse_error_body(
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        );
        assert_eq!(code, None);
        assert_eq!(message.as_deref(), Some("Invalid login credentials"));

        let (_, message) = parse_error_body("upstream timeout");
        assert_eq!(message.as_deref(), Some("upstream timeout"));
    }
}
