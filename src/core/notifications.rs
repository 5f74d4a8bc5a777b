use crate::domain::model::{BookingStatus, EmailMessage};
use crate::domain::ports::EmailSender;
use crate::utils::error::Result;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

pub const DEFAULT_NOTIFICATION_SECS: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub message: String,
    /// None 表示不會自動消失
    pub expires_at: Option<DateTime<Utc>>,
}

/// 使用者看到的提示訊息佇列
#[derive(Debug, Default)]
pub struct NotificationCenter {
    notifications: Vec<Notification>,
    next_id: u64,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: NotificationKind, message: impl Into<String>) -> u64 {
        self.add_with_duration(
            kind,
            message,
            Duration::seconds(DEFAULT_NOTIFICATION_SECS),
            Utc::now(),
        )
    }

    /// duration 為零時訊息常駐，直到 remove/clear
    pub fn add_with_duration(
        &mut self,
        kind: NotificationKind,
        message: impl Into<String>,
        duration: Duration,
        now: DateTime<Utc>,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        let expires_at = (duration > Duration::zero()).then(|| now + duration);
        self.notifications.push(Notification {
            id,
            kind,
            message: message.into(),
            expires_at,
        });
        id
    }

    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.notifications.len();
        self.notifications.retain(|n| n.id != id);
        self.notifications.len() != before
    }

    pub fn clear(&mut self) {
        self.notifications.clear();
    }

    pub fn prune_expired(&mut self, now: DateTime<Utc>) {
        self.notifications
            .retain(|n| n.expires_at.map_or(true, |expires| expires > now));
    }

    pub fn active(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn last(&self) -> Option<&Notification> {
        self.notifications.last()
    }
}

/// 預約確認信的內容
#[derive(Debug, Clone, PartialEq)]
pub struct BookingEmailDetails {
    pub status: BookingStatus,
    pub project_details: String,
    /// 已格式化，例如 "March 15, 2024, March 18, 2024"
    pub preferred_dates: String,
    pub booking_id: Option<String>,
}

/// 表單內容放進 HTML 前先跳脫
fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

pub fn booking_confirmation_email(
    to: &str,
    client_name: &str,
    details: &BookingEmailDetails,
    studio_name: &str,
) -> EmailMessage {
    let status_message = match details.status {
        BookingStatus::Confirmed => format!(
            "Your booking for {} has been confirmed!",
            details.preferred_dates
        ),
        BookingStatus::Rejected => "We regret to inform you that your booking request could not be accommodated at this time.".to_string(),
        _ => "Your booking request has been received and is pending confirmation.".to_string(),
    };

    let reference = details
        .booking_id
        .as_deref()
        .map(|id| {
            format!(
                "\n          <p><strong>Reference:</strong> {}</p>",
                escape_html(id)
            )
        })
        .unwrap_or_default();

    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
        <h2>Booking Confirmation</h2>
        <p>Hello {client_name},</p>

        <p>{status_message}</p>

        <div style="background-color: #f5f5f5; padding: 15px; border-radius: 5px; margin: 20px 0;">
          <h3 style="margin-top: 0;">Booking Details:</h3>
          <p><strong>Status:</strong> {status}</p>
          <p><strong>Preferred Dates:</strong> {dates}</p>
          <p><strong>Project:</strong> {project}</p>{reference}
        </div>

        <p>If you have any questions, please don't hesitate to contact us.</p>

        <p>Best regards,<br>The {studio_name} Team</p>
      </div>"#,
        client_name = escape_html(client_name),
        status_message = escape_html(&status_message),
        status = details.status,
        dates = escape_html(&details.preferred_dates),
        project = escape_html(&details.project_details),
        reference = reference,
        studio_name = escape_html(studio_name),
    );

    EmailMessage {
        to: to.to_string(),
        subject: format!("Booking Confirmation - {}", details.status),
        html,
    }
}

pub fn test_email(to: &str, studio_name: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: format!("Test Email from {}", studio_name),
        html: format!(
            "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
             <h2>Test Email</h2>\
             <p>This is a test email from the {} booking system.</p>\
             <p>If you received this email, the email notification system is working correctly!</p>\
             </div>",
            escape_html(studio_name)
        ),
    }
}

/// EmailSender 的薄包裝，負責套用範本
#[derive(Clone)]
pub struct Mailer {
    sender: Arc<dyn EmailSender>,
    studio_name: String,
}

impl Mailer {
    pub fn new(sender: Arc<dyn EmailSender>, studio_name: impl Into<String>) -> Self {
        Self {
            sender,
            studio_name: studio_name.into(),
        }
    }

    pub async fn send_booking_confirmation(
        &self,
        to: &str,
        client_name: &str,
        details: &BookingEmailDetails,
    ) -> Result<()> {
        let message = booking_confirmation_email(to, client_name, details, &self.studio_name);
        self.sender.send_email(&message).await
    }

    pub async fn send_test_email(&self, to: &str) -> Result<()> {
        self.sender.send_email(&test_email(to, &self.studio_name)).await
    }
}
