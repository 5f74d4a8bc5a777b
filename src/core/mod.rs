pub mod admin;
pub mod availability;
pub mod bookings;
pub mod notifications;
pub mod seed;
pub mod session;

pub use crate::domain::model::{Availability, Booking, BookingStatus, Client};
pub use crate::domain::ports::{
    AuthProvider, AvailabilityRepository, BookingRepository, ClientRepository, ConfigProvider,
    EmailSender,
};
pub use crate::utils::error::Result;
