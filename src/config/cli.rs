use crate::config::{validate_provider, DEFAULT_LOOKAHEAD_DAYS, DEFAULT_STUDIO_NAME};
use crate::domain::model::BookingStatus;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "studio-booking")]
#[command(about = "Manage recording studio bookings from the command line")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend project URL, overrides the config file and environment
    #[arg(long, global = true)]
    pub url: Option<String>,

    #[arg(long, global = true)]
    pub anon_key: Option<String>,

    #[arg(long, global = true)]
    pub service_key: Option<String>,

    #[arg(long, global = true, default_value = DEFAULT_STUDIO_NAME)]
    pub studio_name: String,

    #[arg(long, global = true, default_value = "send-email")]
    pub email_function: String,

    #[arg(long, global = true, default_value_t = DEFAULT_LOOKAHEAD_DAYS)]
    pub lookahead_days: u32,

    /// Sign in as this admin before running the command
    #[arg(long, global = true, requires = "admin_password")]
    pub admin_email: Option<String>,

    #[arg(long, global = true, requires = "admin_email")]
    pub admin_password: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// List bookings, newest first
    Bookings {
        #[arg(long)]
        status: Option<BookingStatus>,
    },
    /// Confirm a pending booking and email the client
    Approve { id: String },
    /// Reject a booking request and email the client
    Reject { id: String },
    /// Mark a booking as completed after the session
    Complete { id: String },
    /// Cancel a booking without emailing the client
    Cancel { id: String },
    /// Show the next open weekdays
    AvailableDates {
        /// Number of dates to list, defaults to the configured lookahead days
        #[arg(long)]
        count: Option<usize>,
    },
    /// Submit a booking request as a client
    Submit {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long)]
        project: String,
        #[arg(long = "date", required = true)]
        dates: Vec<String>,
    },
    /// List availability slots between two dates
    Availability {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Send a test message through the email function
    TestEmail { to: String },
}

impl Command {
    /// 會改動預約資料或列出客戶資料的指令
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            Command::Bookings { .. }
                | Command::Approve { .. }
                | Command::Reject { .. }
                | Command::Complete { .. }
                | Command::Cancel { .. }
        )
    }
}

impl CliConfig {
    /// 命令列有給完整的後端連線資訊
    pub fn has_backend(&self) -> bool {
        self.url.is_some() && self.anon_key.is_some()
    }

    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        match (&self.admin_email, &self.admin_password) {
            (Some(email), Some(password)) => Some((email.as_str(), password.as_str())),
            _ => None,
        }
    }
}

impl ConfigProvider for CliConfig {
    fn backend_url(&self) -> &str {
        self.url.as_deref().unwrap_or_default()
    }

    fn api_key(&self) -> &str {
        self.anon_key.as_deref().unwrap_or_default()
    }

    fn service_key(&self) -> Option<&str> {
        self.service_key.as_deref()
    }

    fn studio_name(&self) -> &str {
        &self.studio_name
    }

    fn email_function(&self) -> &str {
        &self.email_function
    }

    fn lookahead_days(&self) -> u32 {
        self.lookahead_days
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_provider(self)
    }
}
