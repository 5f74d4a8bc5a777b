use super::SupabaseClient;
use crate::domain::model::{
    Availability, AvailabilityUpdate, Booking, BookingUpdate, Client, NewAvailability, NewBooking,
    NewClient,
};
use crate::domain::ports::{AvailabilityRepository, BookingRepository, ClientRepository};
use crate::utils::error::{BookingError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// 後端資料表名稱
pub struct Tables;

impl Tables {
    pub const CLIENTS: &'static str = "clients";
    pub const BOOKINGS: &'static str = "bookings";
    pub const AVAILABILITY: &'static str = "availability";
}

const BOOKING_WITH_CLIENT: &str = "*,client:clients(*)";

/// PostgREST 查詢參數的簡單組裝器
#[derive(Debug, Clone, PartialEq)]
pub struct TableQuery {
    table: String,
    params: Vec<(String, String)>,
}

impl TableQuery {
    pub fn from(table: &str) -> Self {
        Self {
            table: table.to_string(),
            params: Vec::new(),
        }
    }

    pub fn select(self, columns: &str) -> Self {
        self.param("select", columns.to_string())
    }

    pub fn eq(self, column: &str, value: impl std::fmt::Display) -> Self {
        self.param(column, format!("eq.{}", value))
    }

    pub fn gte(self, column: &str, value: impl std::fmt::Display) -> Self {
        self.param(column, format!("gte.{}", value))
    }

    pub fn lte(self, column: &str, value: impl std::fmt::Display) -> Self {
        self.param(column, format!("lte.{}", value))
    }

    pub fn order(self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.param("order", format!("{}.{}", column, direction))
    }

    pub fn limit(self, count: usize) -> Self {
        self.param("limit", count.to_string())
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    fn param(mut self, key: &str, value: String) -> Self {
        self.params.push((key.to_string(), value));
        self
    }
}

impl SupabaseClient {
    fn table_url(&self, table: &str) -> Result<url::Url> {
        self.endpoint(&format!("rest/v1/{}", table))
    }

    pub async fn select<T: DeserializeOwned>(&self, query: &TableQuery) -> Result<Vec<T>> {
        tracing::debug!("📡 GET {} {:?}", query.table(), query.params());
        let builder = self
            .request(Method::GET, self.table_url(query.table())?)
            .query(query.params());
        self.send_json(builder).await
    }

    /// 新增一筆資料並回傳後端建立的完整列
    pub async fn insert<B, T>(&self, table: &str, row: &B, select: Option<&str>) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        tracing::debug!("📡 POST {}", table);
        let mut builder = self
            .request(Method::POST, self.table_url(table)?)
            .header("Prefer", "return=representation")
            .json(row);
        if let Some(columns) = select {
            builder = builder.query(&[("select", columns)]);
        }

        let mut rows: Vec<T> = self.send_json(builder).await?;
        if rows.is_empty() {
            return Err(BookingError::backend(
                200,
                None,
                format!("Insert into {} returned no rows", table),
            ));
        }
        Ok(rows.remove(0))
    }

    pub async fn update<B, T>(&self, query: &TableQuery, patch: &B) -> Result<Vec<T>>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        tracing::debug!("📡 PATCH {} {:?}", query.table(), query.params());
        let builder = self
            .request(Method::PATCH, self.table_url(query.table())?)
            .header("Prefer", "return=representation")
            .query(query.params())
            .json(patch);
        self.send_json(builder).await
    }
}

#[async_trait]
impl ClientRepository for SupabaseClient {
    async fn insert_client(&self, client: &NewClient) -> Result<Client> {
        self.insert(Tables::CLIENTS, client, None).await
    }

    async fn find_client_by_email(&self, email: &str) -> Result<Option<Client>> {
        let query = TableQuery::from(Tables::CLIENTS)
            .select("*")
            .eq("email", email)
            .limit(1);
        let mut clients: Vec<Client> = self.select(&query).await?;
        Ok(clients.pop())
    }

    async fn list_clients(&self) -> Result<Vec<Client>> {
        let query = TableQuery::from(Tables::CLIENTS)
            .select("*")
            .order("name", true);
        self.select(&query).await
    }
}

#[async_trait]
impl BookingRepository for SupabaseClient {
    async fn insert_booking(&self, booking: &NewBooking) -> Result<Booking> {
        self.insert(Tables::BOOKINGS, booking, Some(BOOKING_WITH_CLIENT))
            .await
    }

    async fn list_bookings(&self) -> Result<Vec<Booking>> {
        let query = TableQuery::from(Tables::BOOKINGS)
            .select(BOOKING_WITH_CLIENT)
            .order("created_at", false);
        self.select(&query).await
    }

    async fn list_confirmed_bookings(&self) -> Result<Vec<Booking>> {
        let query = TableQuery::from(Tables::BOOKINGS)
            .select("*")
            .eq("status", "confirmed");
        self.select(&query).await
    }

    async fn update_booking(&self, id: &str, update: &BookingUpdate) -> Result<Booking> {
        let query = TableQuery::from(Tables::BOOKINGS)
            .eq("id", id)
            .select(BOOKING_WITH_CLIENT);
        let mut rows: Vec<Booking> = self.update(&query, update).await?;
        // RLS 擋下時 PostgREST 回 200 加空陣列
        if rows.is_empty() {
            return Err(BookingError::not_found("Booking", id));
        }
        Ok(rows.remove(0))
    }
}

#[async_trait]
impl AvailabilityRepository for SupabaseClient {
    async fn list_availability(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Availability>> {
        let query = TableQuery::from(Tables::AVAILABILITY)
            .select("*")
            .gte("date", from)
            .lte("date", to)
            .order("date", true);
        self.select(&query).await
    }

    async fn insert_availability(&self, slot: &NewAvailability) -> Result<Availability> {
        self.insert(Tables::AVAILABILITY, slot, None).await
    }

    async fn update_availability(
        &self,
        id: &str,
        update: &AvailabilityUpdate,
    ) -> Result<Availability> {
        let query = TableQuery::from(Tables::AVAILABILITY).eq("id", id);
        let mut rows: Vec<Availability> = self.update(&query, update).await?;
        if rows.is_empty() {
            return Err(BookingError::not_found("Availability", id));
        }
        Ok(rows.remove(0))
    }
}
