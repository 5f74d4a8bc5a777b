use crate::domain::model::{BookingStatus, Client, NewBooking, NewClient};
use crate::domain::ports::{BookingRepository, ClientRepository};
use crate::utils::error::{BookingError, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::Rng;

pub const TEST_CLIENT_NAME: &str = "Test User";
pub const TEST_CLIENT_EMAIL: &str = "test@example.com";
pub const TEST_CLIENT_PHONE: &str = "(555) 123-4567";
pub const SEED_DAYS: u32 = 7;

const SAMPLE_SENTENCES: [&str; 7] = [
    "Tracking drums and bass for a debut single.",
    "Vocal overdubs with a string trio.",
    "Podcast pilot with two hosts and a guest.",
    "Mixing session for a five song EP.",
    "Live room recording for a jazz quartet.",
    "Voice-over for an animated short.",
    "Mastering review with the band.",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub client_id: String,
    pub created: Vec<(NaiveDate, BookingStatus)>,
    pub failed: usize,
}

/// 第 i 天的狀態循環：0 → pending、1 → confirmed、2 → completed
pub fn seed_status(day_offset: u32) -> BookingStatus {
    match day_offset % 3 {
        0 => BookingStatus::Pending,
        1 => BookingStatus::Confirmed,
        _ => BookingStatus::Completed,
    }
}

pub fn seed_booking<R: Rng>(
    client_id: &str,
    today: NaiveDate,
    day_offset: u32,
    rng: &mut R,
) -> NewBooking {
    let date = today + Duration::days(i64::from(day_offset));
    let status = seed_status(day_offset);

    // 9 點到 16 點之間的整點
    let start_hour = rng.gen_range(9..17);
    let confirmed_date: Option<DateTime<Utc>> = match status {
        BookingStatus::Pending => None,
        _ => date.and_hms_opt(start_hour, 0, 0).map(|dt| dt.and_utc()),
    };

    let sentence = SAMPLE_SENTENCES[rng.gen_range(0..SAMPLE_SENTENCES.len())];
    NewBooking {
        client_id: client_id.to_string(),
        project_details: format!("Test project {} - {}", day_offset, sentence),
        preferred_dates: vec![date.format("%Y-%m-%d").to_string()],
        status,
        confirmed_date,
        notes: Some(
            if status == BookingStatus::Pending {
                "Needs confirmation"
            } else {
                "Test booking"
            }
            .to_string(),
        ),
    }
}

async fn ensure_test_client(clients: &dyn ClientRepository) -> Result<Client> {
    let client = NewClient {
        name: TEST_CLIENT_NAME.to_string(),
        email: TEST_CLIENT_EMAIL.to_string(),
        phone: TEST_CLIENT_PHONE.to_string(),
    };

    match clients.insert_client(&client).await {
        Ok(created) => Ok(created),
        Err(e) if e.is_unique_violation() => {
            tracing::info!("Test client already exists, continuing...");
            clients
                .find_client_by_email(TEST_CLIENT_EMAIL)
                .await?
                .ok_or_else(|| BookingError::not_found("Client", TEST_CLIENT_EMAIL))
        }
        Err(e) => Err(e),
    }
}

/// 建立測試客戶與接下來七天的測試預約；單筆失敗只記錄不中斷
pub async fn seed_test_bookings<R: Rng>(
    clients: &dyn ClientRepository,
    bookings: &dyn BookingRepository,
    today: NaiveDate,
    rng: &mut R,
) -> Result<SeedReport> {
    let client = ensure_test_client(clients).await?;
    let mut report = SeedReport {
        client_id: client.id.clone(),
        ..Default::default()
    };

    for day_offset in 1..=SEED_DAYS {
        let booking = seed_booking(&client.id, today, day_offset, rng);
        let date = today + Duration::days(i64::from(day_offset));

        match bookings.insert_booking(&booking).await {
            Ok(_) => {
                tracing::info!("Created {} booking for {}", booking.status, date);
                report.created.push((date, booking.status));
            }
            Err(e) => {
                tracing::error!("Error creating booking for day {}: {}", day_offset, e);
                report.failed += 1;
            }
        }
    }

    Ok(report)
}
