use clap::Parser;
use studio_booking::core::admin::create_admin;
use studio_booking::utils::logger;
use studio_booking::{BookingError, SupabaseClient};

#[derive(Parser)]
#[command(name = "create-admin")]
#[command(about = "Create a confirmed user with the admin role")]
struct Args {
    #[arg(short, long)]
    email: String,

    #[arg(short, long)]
    password: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

async fn run(args: &Args) -> studio_booking::Result<String> {
    let url = std::env::var("SUPABASE_URL")
        .or_else(|_| std::env::var("VITE_SUPABASE_URL"))
        .map_err(|_| BookingError::MissingConfigError {
            field: "SUPABASE_URL".to_string(),
        })?;
    let service_key =
        std::env::var("SUPABASE_SERVICE_KEY").map_err(|_| BookingError::MissingConfigError {
            field: "SUPABASE_SERVICE_KEY".to_string(),
        })?;

    let client = SupabaseClient::new(&url, service_key)?;
    let user = create_admin(&client, &args.email, &args.password).await?;
    Ok(user.id)
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    match run(&args).await {
        Ok(user_id) => {
            println!("✅ Admin user created successfully!");
            println!("User ID: {}", user_id);
        }
        Err(e) => {
            tracing::error!("❌ Error creating admin user: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }
}
