use crate::utils::error::{BookingError, Result};
use crate::utils::validation::{
    validate_date_string, validate_email, validate_non_empty_string, Validate,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Rejected,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Rejected,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// 用於錯誤訊息，例如 "Failed to confirm booking"
    pub fn verb(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "reopen",
            BookingStatus::Confirmed => "confirm",
            BookingStatus::Rejected => "reject",
            BookingStatus::Completed => "complete",
            BookingStatus::Cancelled => "cancel",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        BookingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| {
                BookingError::validation(format!(
                    "Unknown booking status '{}'. Expected one of: pending, confirmed, rejected, completed, cancelled",
                    s
                ))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewClient {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// 欄位為 null 時視同沒給，舊資料列常見
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub client_id: String,
    /// 由 `client:clients(*)` 嵌入查詢帶回
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<Client>,
    /// 舊版資料列直接把客戶資料寫在預約上，沒有 client_id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_phone: Option<String>,
    #[serde(default)]
    pub project_details: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub preferred_dates: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: BookingStatus,
    #[serde(default)]
    pub confirmed_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// 解析 preferred_dates 的日期部分，無法解析的項目略過
    pub fn preferred_days(&self) -> Vec<NaiveDate> {
        self.preferred_dates
            .iter()
            .filter_map(|raw| {
                let day = raw.split('T').next()?;
                NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
            })
            .collect()
    }

    /// 行事曆顯示用：已確認日期優先，否則取第一個偏好日期
    pub fn display_date(&self) -> Option<NaiveDate> {
        self.confirmed_date
            .map(|dt| dt.date_naive())
            .or_else(|| self.preferred_days().into_iter().next())
    }

    /// 嵌入的 client 優先，否則用舊版的平面欄位
    pub fn client_email(&self) -> Option<&str> {
        self.client
            .as_ref()
            .map(|c| c.email.as_str())
            .or(self.client_email.as_deref())
            .filter(|email| !email.trim().is_empty())
    }

    pub fn client_name(&self) -> Option<&str> {
        self.client
            .as_ref()
            .map(|c| c.name.as_str())
            .or(self.client_name.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBooking {
    pub client_id: String,
    pub project_details: String,
    pub preferred_dates: Vec<String>,
    pub status: BookingStatus,
    pub confirmed_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BookingStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_dates: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl BookingUpdate {
    pub fn status(status: BookingStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn stamped(mut self, now: DateTime<Utc>) -> Self {
        self.updated_at = Some(now);
        self
    }

    /// 把變更套用到本地快取的 booking 上
    pub fn apply_to(&self, booking: &mut Booking) {
        if let Some(status) = self.status {
            booking.status = status;
        }
        if let Some(details) = &self.project_details {
            booking.project_details = Some(details.clone());
        }
        if let Some(dates) = &self.preferred_dates {
            booking.preferred_dates = dates.clone();
        }
        if let Some(confirmed) = self.confirmed_date {
            booking.confirmed_date = Some(confirmed);
        }
        if let Some(notes) = &self.notes {
            booking.notes = Some(notes.clone());
        }
        if let Some(updated_at) = self.updated_at {
            booking.updated_at = Some(updated_at);
        }
    }
}

/// 公開預約表單送出的內容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub client_name: String,
    pub email: String,
    pub phone: String,
    pub project_details: String,
    pub preferred_dates: Vec<String>,
}

impl Validate for BookingRequest {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("client_name", &self.client_name)
            .map_err(|_| BookingError::validation("Please enter your name"))?;
        validate_email("email", &self.email)?;
        if self.preferred_dates.is_empty() {
            return Err(BookingError::validation(
                "Please select at least one preferred date",
            ));
        }
        for date in &self.preferred_dates {
            validate_date_string("preferred_dates", date)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Availability {
    pub id: String,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub is_available: bool,
    pub max_bookings: u32,
    pub current_bookings: u32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Availability {
    pub fn has_capacity(&self) -> bool {
        self.is_available && self.current_bookings < self.max_bookings
    }

    pub fn remaining(&self) -> u32 {
        if !self.is_available {
            return 0;
        }
        self.max_bookings.saturating_sub(self.current_bookings)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAvailability {
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub is_available: bool,
    pub max_bookings: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_bookings: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_bookings: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

impl AppUser {
    pub fn is_admin(&self) -> bool {
        self.user_metadata.role == Some(UserRole::Admin)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: AppUser,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}
