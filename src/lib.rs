pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};
pub use config::{EnvConfig, TomlConfig};

pub use adapters::supabase::SupabaseClient;
pub use core::{
    availability::AvailabilityService, bookings::BookingService, notifications::Mailer,
    session::SessionManager,
};
pub use utils::error::{BookingError, Result};
