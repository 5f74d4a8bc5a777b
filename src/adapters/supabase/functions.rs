use super::SupabaseClient;
use crate::domain::model::EmailMessage;
use crate::domain::ports::EmailSender;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;

impl SupabaseClient {
    /// 呼叫 Edge Function，回傳內容原樣交給呼叫端
    pub async fn invoke_function<B: Serialize + Sync>(
        &self,
        name: &str,
        body: &B,
    ) -> Result<serde_json::Value> {
        tracing::debug!("📡 Invoking function {}", name);
        let builder = self
            .request(Method::POST, self.endpoint(&format!("functions/v1/{}", name))?)
            .json(body);
        let response = builder.send().await?;
        let response = Self::check_status(response).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text)))
    }
}

#[async_trait]
impl EmailSender for SupabaseClient {
    async fn send_email(&self, message: &EmailMessage) -> Result<()> {
        self.invoke_function(self.email_function(), message).await?;
        tracing::info!("📧 Email '{}' sent to {}", message.subject, message.to);
        Ok(())
    }
}
