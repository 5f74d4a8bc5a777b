use crate::domain::model::{
    AppUser, Availability, AvailabilityUpdate, Booking, BookingUpdate, Client, EmailMessage,
    NewAvailability, NewBooking, NewClient, Session,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

pub trait ConfigProvider: Send + Sync {
    fn backend_url(&self) -> &str;
    fn api_key(&self) -> &str;
    /// 只有管理腳本需要，前台流程沒有
    fn service_key(&self) -> Option<&str>;
    fn studio_name(&self) -> &str;
    fn email_function(&self) -> &str;
    fn lookahead_days(&self) -> u32;
}

#[async_trait]
pub trait ClientRepository: Send + Sync {
    async fn insert_client(&self, client: &NewClient) -> Result<Client>;
    async fn find_client_by_email(&self, email: &str) -> Result<Option<Client>>;
    async fn list_clients(&self) -> Result<Vec<Client>>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert_booking(&self, booking: &NewBooking) -> Result<Booking>;
    /// 依 created_at 由新到舊，並嵌入 client
    async fn list_bookings(&self) -> Result<Vec<Booking>>;
    async fn list_confirmed_bookings(&self) -> Result<Vec<Booking>>;
    async fn update_booking(&self, id: &str, update: &BookingUpdate) -> Result<Booking>;
}

#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    async fn list_availability(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Availability>>;
    async fn insert_availability(&self, slot: &NewAvailability) -> Result<Availability>;
    async fn update_availability(&self, id: &str, update: &AvailabilityUpdate)
        -> Result<Availability>;
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session>;
    async fn sign_out(&self) -> Result<()>;
    /// 沒有登入中的 session 時回傳 None
    async fn get_user(&self) -> Result<Option<AppUser>>;
    async fn create_admin_user(&self, email: &str, password: &str, name: &str) -> Result<AppUser>;
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_email(&self, message: &EmailMessage) -> Result<()>;
}
