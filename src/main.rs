use chrono::{Local, NaiveDate};
use clap::Parser;
use std::sync::Arc;
use studio_booking::config::available_date_count;
use studio_booking::domain::model::{Booking, BookingRequest};
use studio_booking::domain::ports::ConfigProvider;
use studio_booking::utils::error::BookingError;
use studio_booking::utils::{logger, validation::Validate};
use studio_booking::{
    AvailabilityService, BookingService, CliConfig, Command, EnvConfig, Mailer, Result,
    SessionManager, SupabaseClient, TomlConfig,
};

/// 實際使用的設定與是否寄信
struct Settings {
    provider: Box<dyn ConfigProvider>,
    notifications: bool,
}

/// 優先順序：命令列 > --config 檔案 > 環境變數 (.env)
fn load_settings(cli: &CliConfig) -> Result<Settings> {
    if cli.has_backend() {
        tracing::debug!("Using backend settings from command line");
        cli.validate()?;
        return Ok(Settings {
            provider: Box::new(cli.clone()),
            notifications: true,
        });
    }

    if let Some(path) = &cli.config {
        tracing::info!("📁 Loading configuration from: {}", path.display());
        let config = TomlConfig::from_file(path)?;
        config.validate()?;
        return Ok(Settings {
            notifications: config.notifications_enabled(),
            provider: Box::new(config),
        });
    }

    let config = EnvConfig::from_env()?;
    config.validate()?;
    Ok(Settings {
        provider: Box::new(config),
        notifications: true,
    })
}

fn print_booking(booking: &Booking) {
    let date = booking
        .display_date()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{}  {:<9}  {}  {} <{}>  {}",
        booking.id,
        booking.status,
        date,
        booking.client_name().unwrap_or("Unknown"),
        booking.client_email().unwrap_or("-"),
        booking.project_details.as_deref().unwrap_or("")
    );
}

/// 管理指令需要先以 admin 身分登入
async fn ensure_admin(client: &Arc<SupabaseClient>, cli: &CliConfig) -> Result<()> {
    let Some((email, password)) = cli.admin_credentials() else {
        tracing::warn!("⚠️ No admin credentials given, row level security may hide bookings");
        return Ok(());
    };

    let mut session = SessionManager::new(client.clone());
    session.sign_in(email, password).await?;
    if !session.is_admin() {
        session.sign_out().await?;
        return Err(BookingError::AuthError {
            message: format!("{} is not an admin", email),
        });
    }
    Ok(())
}

async fn run(cli: CliConfig) -> Result<()> {
    let settings = load_settings(&cli)?;
    let config = settings.provider.as_ref();
    let client = Arc::new(SupabaseClient::from_config(config)?);
    let today: NaiveDate = Local::now().date_naive();

    if cli.command.requires_admin() {
        ensure_admin(&client, &cli).await?;
    }

    let mut bookings = BookingService::new(client.clone(), client.clone());
    if settings.notifications {
        bookings = bookings.with_mailer(Mailer::new(client.clone(), config.studio_name()));
    } else {
        tracing::info!("📭 Email notifications disabled by configuration");
    }

    match &cli.command {
        Command::Bookings { status } => {
            let all = bookings.fetch_bookings().await?.len();
            let shown = match status {
                Some(status) => bookings.bookings_with_status(*status),
                None => bookings.bookings().iter().collect(),
            };
            for booking in &shown {
                print_booking(booking);
            }
            println!("📋 {} of {} bookings", shown.len(), all);
        }
        Command::Approve { id }
        | Command::Reject { id }
        | Command::Complete { id }
        | Command::Cancel { id } => {
            bookings.fetch_bookings().await?;
            let updated = match &cli.command {
                Command::Approve { .. } => bookings.approve_booking(id).await?,
                Command::Reject { .. } => bookings.reject_booking(id).await?,
                Command::Complete { .. } => bookings.complete_booking(id).await?,
                _ => bookings.cancel_booking(id).await?,
            };
            println!("✅ Booking {} is now {}", updated.id, updated.status);
            for notification in bookings.notifications().active() {
                println!("   {}", notification.message);
            }
        }
        Command::AvailableDates { count } => {
            let count = available_date_count(*count, config);
            let mut availability =
                AvailabilityService::new(client.clone(), client.clone()).with_date_count(count);
            let dates = availability.refresh_available_dates(today).await;
            if let Some(message) = availability.last_error() {
                eprintln!("⚠️ {}", message);
            }
            for date in &dates {
                println!("{}", date.format("%a %b %-d, %Y"));
            }
        }
        Command::Submit {
            name,
            email,
            phone,
            project,
            dates,
        } => {
            let request = BookingRequest {
                client_name: name.clone(),
                email: email.clone(),
                phone: phone.clone(),
                project_details: project.clone(),
                preferred_dates: dates.clone(),
            };
            let booking = bookings.submit_booking(&request).await?;
            println!("✅ Booking {} submitted ({})", booking.id, booking.status);
            if let Some(notification) = bookings.notifications().last() {
                println!("   {}", notification.message);
            }
        }
        Command::Availability { from, to } => {
            let (_, default_to) = AvailabilityService::window(*from, config.lookahead_days());
            let to = to.unwrap_or(default_to);
            let availability = AvailabilityService::new(client.clone(), client.clone());
            for slot in availability.fetch_availability(*from, to).await? {
                println!(
                    "{}  {}-{}  {}/{} booked  {}",
                    slot.date,
                    slot.start_time,
                    slot.end_time,
                    slot.current_bookings,
                    slot.max_bookings,
                    if slot.has_capacity() { "open" } else { "closed" }
                );
            }
        }
        Command::TestEmail { to } => {
            Mailer::new(client.clone(), config.studio_name())
                .send_test_email(to)
                .await?;
            println!("📧 Test email sent to {}", to);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🎙️ Starting studio-booking CLI");
    if cli.verbose {
        tracing::debug!("Command: {:?}", cli.command);
    }

    if let Err(e) = run(cli).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        std::process::exit(e.exit_code());
    }
}
