use crate::domain::model::{
    Availability, AvailabilityUpdate, Booking, BookingStatus, NewAvailability,
};
use crate::domain::ports::{AvailabilityRepository, BookingRepository};
use crate::utils::error::{BookingError, Result};
use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use std::collections::HashSet;
use std::sync::Arc;

pub const DEFAULT_AVAILABLE_DATE_COUNT: usize = 30;

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// 從 today 開始往後找，跳過週末與已確認的日期，湊滿 count 天
pub fn generate_available_dates(
    today: NaiveDate,
    booked: &HashSet<NaiveDate>,
    count: usize,
) -> Vec<NaiveDate> {
    today
        .iter_days()
        .filter(|day| !is_weekend(*day) && !booked.contains(day))
        .take(count)
        .collect()
}

/// 已確認預約佔用的日期，只保留 today 之後
pub fn booked_dates(bookings: &[Booking], today: NaiveDate) -> HashSet<NaiveDate> {
    bookings
        .iter()
        .filter(|booking| booking.status == BookingStatus::Confirmed)
        .flat_map(|booking| booking.preferred_days())
        .filter(|day| *day >= today)
        .collect()
}

pub fn is_date_available(date: NaiveDate, today: NaiveDate, booked: &HashSet<NaiveDate>) -> bool {
    date >= today && !booked.contains(&date)
}

pub struct AvailabilityService {
    bookings: Arc<dyn BookingRepository>,
    slots: Arc<dyn AvailabilityRepository>,
    date_count: usize,
    booked: HashSet<NaiveDate>,
    available_dates: Vec<NaiveDate>,
    last_error: Option<String>,
}

impl AvailabilityService {
    pub fn new(bookings: Arc<dyn BookingRepository>, slots: Arc<dyn AvailabilityRepository>) -> Self {
        Self {
            bookings,
            slots,
            date_count: DEFAULT_AVAILABLE_DATE_COUNT,
            booked: HashSet::new(),
            available_dates: Vec::new(),
            last_error: None,
        }
    }

    pub fn with_date_count(mut self, count: usize) -> Self {
        self.date_count = count;
        self
    }

    /// 重新讀取已確認的預約並計算可預約日期；失敗時回傳空清單並記錄錯誤
    pub async fn refresh_available_dates(&mut self, today: NaiveDate) -> Vec<NaiveDate> {
        self.last_error = None;
        match self.bookings.list_confirmed_bookings().await {
            Ok(confirmed) => {
                self.booked = booked_dates(&confirmed, today);
                self.available_dates =
                    generate_available_dates(today, &self.booked, self.date_count);
                tracing::debug!(
                    "📅 {} booked dates, {} available dates",
                    self.booked.len(),
                    self.available_dates.len()
                );
            }
            Err(e) => {
                tracing::error!("Error fetching available dates: {}", e);
                self.last_error = Some("Failed to load available dates".to_string());
                self.available_dates.clear();
            }
        }
        self.available_dates.clone()
    }

    pub fn is_date_available(&self, date: NaiveDate, today: NaiveDate) -> bool {
        is_date_available(date, today, &self.booked)
    }

    pub fn available_dates(&self) -> &[NaiveDate] {
        &self.available_dates
    }

    pub fn booked(&self) -> &HashSet<NaiveDate> {
        &self.booked
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub async fn fetch_availability(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Availability>> {
        if to < from {
            return Err(BookingError::validation(format!(
                "Invalid range: {} is before {}",
                to, from
            )));
        }
        self.slots.list_availability(from, to).await
    }

    pub async fn set_availability(&self, slot: NewAvailability) -> Result<Availability> {
        if slot.max_bookings == 0 && slot.is_available {
            return Err(BookingError::validation(
                "An open slot needs max_bookings of at least 1",
            ));
        }
        let created = self.slots.insert_availability(&slot).await?;
        tracing::info!(
            "📅 Availability set for {} ({}-{})",
            created.date,
            created.start_time,
            created.end_time
        );
        Ok(created)
    }

    pub async fn block_slot(&self, id: &str) -> Result<Availability> {
        let update = AvailabilityUpdate {
            is_available: Some(false),
            updated_at: Some(Utc::now()),
            ..Default::default()
        };
        self.slots.update_availability(id, &update).await
    }

    /// 還有名額的時段
    pub async fn open_slots(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Availability>> {
        let slots = self.fetch_availability(from, to).await?;
        Ok(slots.into_iter().filter(Availability::has_capacity).collect())
    }

    /// 預設查詢範圍：today 到 today + days
    pub fn window(today: NaiveDate, days: u32) -> (NaiveDate, NaiveDate) {
        (today, today + Duration::days(i64::from(days)))
    }
}
