use chrono::Utc;
use clap::Parser;
use studio_booking::core::seed::seed_test_bookings;
use studio_booking::utils::logger;
use studio_booking::{BookingError, SupabaseClient};

#[derive(Parser)]
#[command(name = "seed-bookings")]
#[command(about = "Insert a test client and a week of sample bookings")]
struct Args {
    /// Backend project URL (falls back to SUPABASE_URL / VITE_SUPABASE_URL)
    url: Option<String>,

    /// API key with insert rights (falls back to SUPABASE_SERVICE_KEY / SUPABASE_ANON_KEY)
    key: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn env_fallback(value: Option<String>, names: &[&str]) -> Option<String> {
    value.or_else(|| names.iter().find_map(|name| std::env::var(name).ok()))
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let url = env_fallback(args.url, &["SUPABASE_URL", "VITE_SUPABASE_URL"]);
    let key = env_fallback(
        args.key,
        &["SUPABASE_SERVICE_KEY", "SUPABASE_ANON_KEY", "VITE_SUPABASE_ANON_KEY"],
    );
    let (Some(url), Some(key)) = (url, key) else {
        eprintln!("Usage: seed_bookings <SUPABASE_URL> <SUPABASE_KEY>");
        std::process::exit(1);
    };

    let client = match SupabaseClient::new(&url, key) {
        Ok(client) => client,
        Err(e) => exit_with(e),
    };

    tracing::info!("🌱 Seeding test bookings into {}", client.base_url());
    let today = Utc::now().date_naive();
    let mut rng = rand::thread_rng();

    match seed_test_bookings(&client, &client, today, &mut rng).await {
        Ok(report) => {
            println!(
                "✅ Created {} test bookings for client {} ({} failed)",
                report.created.len(),
                report.client_id,
                report.failed
            );
            for (date, status) in &report.created {
                println!("   {}  {}", date, status);
            }
        }
        Err(e) => exit_with(e),
    }
}

fn exit_with(e: BookingError) -> ! {
    tracing::error!("❌ Seeding failed: {}", e);
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}
