use crate::core::notifications::{BookingEmailDetails, Mailer, NotificationCenter, NotificationKind};
use crate::domain::model::{
    Booking, BookingRequest, BookingStatus, BookingUpdate, Client, NewBooking, NewClient,
};
use crate::domain::ports::{BookingRepository, ClientRepository};
use crate::utils::error::{BookingError, Result};
use crate::utils::validation::Validate;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;

/// 把 "2024-03-15" 轉成 "March 15, 2024"，無法解析的原樣保留
pub fn format_preferred_dates(dates: &[String]) -> String {
    dates
        .iter()
        .map(|raw| {
            raw.split('T')
                .next()
                .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
                .map(|day| day.format("%B %-d, %Y").to_string())
                .unwrap_or_else(|| raw.clone())
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// 預約的新增、審核與本地清單維護
pub struct BookingService {
    clients: Arc<dyn ClientRepository>,
    repository: Arc<dyn BookingRepository>,
    mailer: Option<Mailer>,
    notifications: NotificationCenter,
    bookings: Vec<Booking>,
    last_error: Option<String>,
}

impl BookingService {
    pub fn new(clients: Arc<dyn ClientRepository>, repository: Arc<dyn BookingRepository>) -> Self {
        Self {
            clients,
            repository,
            mailer: None,
            notifications: NotificationCenter::new(),
            bookings: Vec::new(),
            last_error: None,
        }
    }

    pub fn with_mailer(mut self, mailer: Mailer) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn bookings(&self) -> &[Booking] {
        &self.bookings
    }

    pub fn bookings_with_status(&self, status: BookingStatus) -> Vec<&Booking> {
        self.bookings.iter().filter(|b| b.status == status).collect()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    /// 公開表單送出：建立（或沿用）客戶、建立 pending 預約、寄確認信
    pub async fn submit_booking(&mut self, request: &BookingRequest) -> Result<Booking> {
        self.last_error = None;
        match self.try_submit(request).await {
            Ok(booking) => Ok(booking),
            Err(e) => {
                tracing::error!("Error submitting booking: {}", e);
                self.last_error = Some(e.user_friendly_message());
                Err(e)
            }
        }
    }

    async fn try_submit(&mut self, request: &BookingRequest) -> Result<Booking> {
        request.validate()?;

        let client = self.resolve_client(request).await?;
        tracing::debug!("Using client {} for new booking", client.id);

        let new_booking = NewBooking {
            client_id: client.id.clone(),
            project_details: request.project_details.trim().to_string(),
            preferred_dates: request.preferred_dates.clone(),
            status: BookingStatus::Pending,
            confirmed_date: None,
            notes: None,
        };
        let mut booking = self.repository.insert_booking(&new_booking).await?;
        if booking.client.is_none() {
            booking.client = Some(client);
        }
        tracing::info!("✅ Booking {} submitted", booking.id);

        let details = BookingEmailDetails {
            status: BookingStatus::Pending,
            project_details: new_booking.project_details.clone(),
            preferred_dates: format_preferred_dates(&request.preferred_dates),
            booking_id: Some(booking.id.clone()),
        };
        let emailed = self
            .send_status_email(request.email.trim(), request.client_name.trim(), &details)
            .await;
        match emailed {
            Ok(true) => {
                self.notifications.add(
                    NotificationKind::Success,
                    "Booking submitted successfully! A confirmation email has been sent.",
                );
            }
            Ok(false) => {
                self.notifications
                    .add(NotificationKind::Success, "Booking submitted successfully!");
            }
            Err(e) => {
                tracing::error!("Failed to send confirmation email: {}", e);
                self.notifications.add(
                    NotificationKind::Warning,
                    "Booking submitted, but we could not send a confirmation email.",
                );
            }
        }

        self.bookings.insert(0, booking.clone());
        Ok(booking)
    }

    /// email 已存在時沿用既有客戶，而不是讓整個預約失敗
    async fn resolve_client(&self, request: &BookingRequest) -> Result<Client> {
        let new_client = NewClient {
            name: request.client_name.trim().to_string(),
            email: request.email.trim().to_string(),
            phone: request.phone.trim().to_string(),
        };

        match self.clients.insert_client(&new_client).await {
            Ok(client) => Ok(client),
            Err(e) if e.is_unique_violation() => {
                tracing::info!("Client {} already exists, reusing it", new_client.email);
                self.clients
                    .find_client_by_email(&new_client.email)
                    .await?
                    .ok_or_else(|| BookingError::not_found("Client", new_client.email.clone()))
            }
            Err(e) => Err(e),
        }
    }

    /// 沒有設定寄信時回傳 Ok(false)
    async fn send_status_email(
        &self,
        to: &str,
        client_name: &str,
        details: &BookingEmailDetails,
    ) -> Result<bool> {
        let Some(mailer) = &self.mailer else {
            tracing::debug!("No mailer configured, skipping email to {}", to);
            return Ok(false);
        };
        mailer.send_booking_confirmation(to, client_name, details).await?;
        Ok(true)
    }

    pub async fn fetch_bookings(&mut self) -> Result<&[Booking]> {
        self.last_error = None;
        match self.repository.list_bookings().await {
            Ok(bookings) => {
                tracing::debug!("Fetched {} bookings", bookings.len());
                self.bookings = bookings;
                Ok(&self.bookings)
            }
            Err(e) => {
                tracing::error!("Error fetching bookings: {}", e);
                self.last_error = Some("Failed to load bookings. Please try again.".to_string());
                Err(e)
            }
        }
    }

    /// 單次、無條件的狀態更新；成功後同步本地清單
    pub async fn update_booking_status(&mut self, id: &str, status: BookingStatus) -> Result<Booking> {
        tracing::info!("Updating booking {} status to {}", id, status);
        let update = BookingUpdate::status(status);
        self.apply_update(id, update).await.inspect_err(|_| {
            self.last_error = Some(format!(
                "Failed to {} booking. Please try again.",
                status.verb()
            ));
        })
    }

    pub async fn update_booking(&mut self, id: &str, update: BookingUpdate) -> Result<Booking> {
        self.apply_update(id, update).await.inspect_err(|_| {
            self.last_error = Some("Failed to update booking. Please try again.".to_string());
        })
    }

    async fn apply_update(&mut self, id: &str, update: BookingUpdate) -> Result<Booking> {
        self.last_error = None;
        let update = update.stamped(Utc::now());

        let updated = match self.repository.update_booking(id, &update).await {
            Ok(updated) => updated,
            Err(e) => {
                tracing::error!("Error updating booking {}: {}", id, e);
                return Err(e);
            }
        };

        match self.bookings.iter_mut().find(|b| b.id == id) {
            Some(local) => {
                update.apply_to(local);
                if updated.client.is_some() {
                    local.client = updated.client.clone();
                }
            }
            None => tracing::warn!("Booking {} not found in local state", id),
        }
        Ok(updated)
    }

    pub async fn approve_booking(&mut self, id: &str) -> Result<Booking> {
        let booking = self.update_booking_status(id, BookingStatus::Confirmed).await?;
        self.notify_client(&booking).await;
        Ok(booking)
    }

    pub async fn reject_booking(&mut self, id: &str) -> Result<Booking> {
        let booking = self.update_booking_status(id, BookingStatus::Rejected).await?;
        self.notify_client(&booking).await;
        Ok(booking)
    }

    pub async fn complete_booking(&mut self, id: &str) -> Result<Booking> {
        self.update_booking_status(id, BookingStatus::Completed).await
    }

    pub async fn cancel_booking(&mut self, id: &str) -> Result<Booking> {
        self.update_booking_status(id, BookingStatus::Cancelled).await
    }

    /// 審核結果通知；寄信失敗只留警告，不影響已完成的更新
    async fn notify_client(&mut self, booking: &Booking) {
        let local = self.bookings.iter().find(|b| b.id == booking.id);
        let recipient = [Some(booking), local]
            .into_iter()
            .flatten()
            .find_map(|b| {
                let name = b.client_name().unwrap_or("there");
                b.client_email()
                    .map(|email| (email.to_string(), name.to_string()))
            });
        let Some((email, name)) = recipient else {
            tracing::warn!("Booking {} has no client email, skipping notification", booking.id);
            return;
        };

        let details = BookingEmailDetails {
            status: booking.status,
            project_details: booking.project_details.clone().unwrap_or_default(),
            preferred_dates: format_preferred_dates(&booking.preferred_dates),
            booking_id: Some(booking.id.clone()),
        };

        let emailed = self
            .send_status_email(&email, &name, &details)
            .await;
        match emailed {
            Ok(true) => {
                self.notifications.add(
                    NotificationKind::Success,
                    format!("Booking {} and the client has been notified.", booking.status),
                );
            }
            Ok(false) => {
                self.notifications
                    .add(NotificationKind::Success, format!("Booking {}.", booking.status));
            }
            Err(e) => {
                tracing::error!("Failed to notify client {}: {}", email, e);
                self.notifications.add(
                    NotificationKind::Warning,
                    format!(
                        "Booking {}, but we could not email the client.",
                        booking.status
                    ),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::EmailMessage;
    use crate::domain::ports::EmailSender;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// 模擬後端：clients.email 有唯一約束
    #[derive(Default)]
    struct InMemoryBackend {
        clients: Mutex<Vec<Client>>,
        bookings: Mutex<Vec<Booking>>,
        fail_updates: bool,
    }

    impl InMemoryBackend {
        fn with_client(email: &str) -> Self {
            let backend = Self::default();
            backend.clients.lock().unwrap().push(Client {
                id: "existing-client".to_string(),
                name: "Jane Doe".to_string(),
                email: email.to_string(),
                phone: "555-0100".to_string(),
                created_at: None,
                updated_at: None,
            });
            backend
        }

        fn client_count(&self) -> usize {
            self.clients.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ClientRepository for InMemoryBackend {
        async fn insert_client(&self, client: &NewClient) -> Result<Client> {
            let mut clients = self.clients.lock().unwrap();
            if clients.iter().any(|c| c.email == client.email) {
                return Err(BookingError::backend(
                    409,
                    Some("23505".to_string()),
                    "duplicate key value violates unique constraint \"clients_email_key\"",
                ));
            }
            let created = Client {
                id: format!("client-{}", clients.len() + 1),
                name: client.name.clone(),
                email: client.email.clone(),
                phone: client.phone.clone(),
                created_at: Some(Utc::now()),
                updated_at: Some(Utc::now()),
            };
            clients.push(created.clone());
            Ok(created)
        }

        async fn find_client_by_email(&self, email: &str) -> Result<Option<Client>> {
            let clients = self.clients.lock().unwrap();
            Ok(clients.iter().find(|c| c.email == email).cloned())
        }

        async fn list_clients(&self) -> Result<Vec<Client>> {
            Ok(self.clients.lock().unwrap().clone())
        }
    }

    #[async_trait]
    impl BookingRepository for InMemoryBackend {
        async fn insert_booking(&self, booking: &NewBooking) -> Result<Booking> {
            let mut bookings = self.bookings.lock().unwrap();
            let created = Booking {
                id: format!("booking-{}", bookings.len() + 1),
                client_id: booking.client_id.clone(),
                project_details: Some(booking.project_details.clone()),
                preferred_dates: booking.preferred_dates.clone(),
                status: booking.status,
                confirmed_date: booking.confirmed_date,
                notes: booking.notes.clone(),
                created_at: Some(Utc::now()),
                updated_at: Some(Utc::now()),
                ..Default::default()
            };
            bookings.push(created.clone());
            Ok(created)
        }

        async fn list_bookings(&self) -> Result<Vec<Booking>> {
            let clients = self.clients.lock().unwrap().clone();
            let mut bookings = self.bookings.lock().unwrap().clone();
            for booking in &mut bookings {
                booking.client = clients.iter().find(|c| c.id == booking.client_id).cloned();
            }
            bookings.reverse();
            Ok(bookings)
        }

        async fn list_confirmed_bookings(&self) -> Result<Vec<Booking>> {
            let bookings = self.bookings.lock().unwrap();
            Ok(bookings
                .iter()
                .filter(|b| b.status == BookingStatus::Confirmed)
                .cloned()
                .collect())
        }

        async fn update_booking(&self, id: &str, update: &BookingUpdate) -> Result<Booking> {
            if self.fail_updates {
                return Err(BookingError::backend(500, None, "database unavailable"));
            }
            let mut bookings = self.bookings.lock().unwrap();
            let booking = bookings
                .iter_mut()
                .find(|b| b.id == id)
                .ok_or_else(|| BookingError::not_found("Booking", id))?;
            update.apply_to(booking);
            Ok(booking.clone())
        }
    }

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<EmailMessage>>,
        fail: bool,
    }

    #[async_trait]
    impl EmailSender for RecordingSender {
        async fn send_email(&self, message: &EmailMessage) -> Result<()> {
            if self.fail {
                return Err(BookingError::backend(500, None, "function crashed"));
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    fn request(email: &str) -> BookingRequest {
        BookingRequest {
            client_name: "Jane Doe".to_string(),
            email: email.to_string(),
            phone: "555-0100".to_string(),
            project_details: "Five song EP".to_string(),
            preferred_dates: vec!["2024-03-15".to_string(), "2024-03-18".to_string()],
        }
    }

    fn service_with(
        backend: Arc<InMemoryBackend>,
        sender: Arc<RecordingSender>,
    ) -> BookingService {
        BookingService::new(backend.clone(), backend)
            .with_mailer(Mailer::new(sender, "Greenwood Recording Studio"))
    }

    #[test]
    fn test_format_preferred_dates() {
        let dates = vec![
            "2024-03-05".to_string(),
            "2024-12-25T00:00:00Z".to_string(),
            "someday".to_string(),
        ];
        assert_eq!(
            format_preferred_dates(&dates),
            "March 5, 2024, December 25, 2024, someday"
        );
    }

    #[tokio::test]
    async fn test_submit_creates_client_booking_and_email() {
        let backend = Arc::new(InMemoryBackend::default());
        let sender = Arc::new(RecordingSender::default());
        let mut service = service_with(backend.clone(), sender.clone());

        let booking = service.submit_booking(&request("jane@example.com")).await.unwrap();

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.client_id, "client-1");
        assert_eq!(backend.client_count(), 1);
        assert_eq!(service.bookings().len(), 1);

        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "jane@example.com");
        assert!(sent[0].html.contains("March 15, 2024, March 18, 2024"));
        assert_eq!(
            service.notifications().last().unwrap().kind,
            NotificationKind::Success
        );
    }

    #[tokio::test]
    async fn test_submit_with_duplicate_email_reuses_existing_client() {
        let backend = Arc::new(InMemoryBackend::with_client("jane@example.com"));
        let sender = Arc::new(RecordingSender::default());
        let mut service = service_with(backend.clone(), sender);

        let booking = service.submit_booking(&request("jane@example.com")).await.unwrap();

        assert_eq!(booking.client_id, "existing-client");
        assert_eq!(backend.client_count(), 1);
        assert_eq!(service.last_error(), None);
    }

    #[tokio::test]
    async fn test_email_failure_still_succeeds_with_warning() {
        let backend = Arc::new(InMemoryBackend::default());
        let sender = Arc::new(RecordingSender {
            fail: true,
            ..Default::default()
        });
        let mut service = service_with(backend.clone(), sender);

        let result = service.submit_booking(&request("jane@example.com")).await;

        assert!(result.is_ok());
        let last = service.notifications().last().unwrap();
        assert_eq!(last.kind, NotificationKind::Warning);
        assert_eq!(
            last.message,
            "Booking submitted, but we could not send a confirmation email."
        );
        assert_eq!(backend.bookings.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_request_is_rejected_before_any_write() {
        let backend = Arc::new(InMemoryBackend::default());
        let mut service = BookingService::new(backend.clone(), backend.clone());

        let mut bad = request("not-an-email");
        bad.preferred_dates.clear();
        let err = service.submit_booking(&bad).await.unwrap_err();

        assert!(matches!(err, BookingError::ValidationError { .. }));
        assert_eq!(backend.client_count(), 0);
        assert!(service.last_error().is_some());
    }

    #[tokio::test]
    async fn test_status_update_is_reflected_in_local_list() {
        let backend = Arc::new(InMemoryBackend::default());
        let sender = Arc::new(RecordingSender::default());
        let mut service = service_with(backend.clone(), sender.clone());
        service.submit_booking(&request("jane@example.com")).await.unwrap();
        service.submit_booking(&request("sam@example.com")).await.unwrap();
        service.fetch_bookings().await.unwrap();

        service.approve_booking("booking-1").await.unwrap();
        service.cancel_booking("booking-2").await.unwrap();

        let first = service.bookings().iter().find(|b| b.id == "booking-1").unwrap();
        assert_eq!(first.status, BookingStatus::Confirmed);
        assert!(first.updated_at.is_some());
        let second = service.bookings().iter().find(|b| b.id == "booking-2").unwrap();
        assert_eq!(second.status, BookingStatus::Cancelled);
        assert_eq!(service.bookings_with_status(BookingStatus::Pending).len(), 0);

        // 兩封確認信 + 一封核准通知
        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[2].subject, "Booking Confirmation - confirmed");
        assert_eq!(sent[2].to, "jane@example.com");
    }

    #[tokio::test]
    async fn test_approve_email_failure_only_warns() {
        let backend = Arc::new(InMemoryBackend::default());
        let sender = Arc::new(RecordingSender {
            fail: true,
            ..Default::default()
        });
        let mut service = service_with(backend.clone(), sender);
        service.submit_booking(&request("jane@example.com")).await.unwrap();

        let approved = service.approve_booking("booking-1").await.unwrap();

        assert_eq!(approved.status, BookingStatus::Confirmed);
        assert_eq!(service.bookings()[0].status, BookingStatus::Confirmed);
        assert_eq!(service.last_error(), None);
        let last = service.notifications().last().unwrap();
        assert_eq!(last.kind, NotificationKind::Warning);
        assert_eq!(
            last.message,
            "Booking confirmed, but we could not email the client."
        );
    }

    #[tokio::test]
    async fn test_reject_email_failure_only_warns() {
        let backend = Arc::new(InMemoryBackend::default());
        let sender = Arc::new(RecordingSender {
            fail: true,
            ..Default::default()
        });
        let mut service = service_with(backend.clone(), sender);
        service.submit_booking(&request("jane@example.com")).await.unwrap();

        let rejected = service.reject_booking("booking-1").await.unwrap();

        assert_eq!(rejected.status, BookingStatus::Rejected);
        assert_eq!(
            service.notifications().last().map(|n| n.kind),
            Some(NotificationKind::Warning)
        );
    }

    #[tokio::test]
    async fn test_reject_emails_cached_client() {
        let backend = Arc::new(InMemoryBackend::default());
        let sender = Arc::new(RecordingSender::default());
        let mut service = service_with(backend.clone(), sender.clone());
        service.submit_booking(&request("jane@example.com")).await.unwrap();

        // 後端更新回傳的資料列不含 client，只能靠本地清單
        let rejected = service.reject_booking("booking-1").await.unwrap();
        assert!(rejected.client.is_none());

        let sent = sender.sent.lock().unwrap();
        let last = sent.last().unwrap();
        assert_eq!(last.to, "jane@example.com");
        assert_eq!(last.subject, "Booking Confirmation - rejected");
        assert!(last.html.contains("could not be accommodated"));
        assert!(last.html.contains("Hello Jane Doe,"));
    }

    #[tokio::test]
    async fn test_approve_legacy_booking_uses_flat_client_fields() {
        let backend = Arc::new(InMemoryBackend::default());
        backend.bookings.lock().unwrap().push(Booking {
            id: "legacy-1".to_string(),
            client_name: Some("Old Timer".to_string()),
            client_email: Some("old@example.com".to_string()),
            preferred_dates: vec!["2024-03-15".to_string()],
            ..Default::default()
        });
        let sender = Arc::new(RecordingSender::default());
        let mut service = service_with(backend.clone(), sender.clone());
        service.fetch_bookings().await.unwrap();

        service.approve_booking("legacy-1").await.unwrap();

        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "old@example.com");
        assert!(sent[0].html.contains("Hello Old Timer,"));
        assert_eq!(
            service.notifications().last().map(|n| n.kind),
            Some(NotificationKind::Success)
        );
    }

    #[tokio::test]
    async fn test_failed_status_update_leaves_list_untouched() {
        let backend = Arc::new(InMemoryBackend::default());
        let mut service = BookingService::new(backend.clone(), backend.clone());
        service.submit_booking(&request("jane@example.com")).await.unwrap();

        let failing: Arc<dyn BookingRepository> = Arc::new(InMemoryBackend {
            fail_updates: true,
            ..Default::default()
        });
        service.repository = failing;

        let err = service.reject_booking("booking-1").await.unwrap_err();
        assert!(matches!(err, BookingError::BackendError { status: 500, .. }));
        assert_eq!(service.bookings()[0].status, BookingStatus::Pending);
        assert_eq!(
            service.last_error(),
            Some("Failed to reject booking. Please try again.")
        );
    }

    #[tokio::test]
    async fn test_update_booking_merges_partial_fields() {
        let backend = Arc::new(InMemoryBackend::default());
        let mut service = BookingService::new(backend.clone(), backend);
        service.submit_booking(&request("jane@example.com")).await.unwrap();

        let update = BookingUpdate {
            notes: Some("Bring your own drum kit".to_string()),
            ..Default::default()
        };
        service.update_booking("booking-1", update).await.unwrap();

        let local = &service.bookings()[0];
        assert_eq!(local.notes.as_deref(), Some("Bring your own drum kit"));
        assert_eq!(local.status, BookingStatus::Pending);
    }
}
