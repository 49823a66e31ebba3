//! Shared newtype wrappers and enums.

pub mod email;
pub mod id;
pub mod mapping;
pub mod platform;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use mapping::FieldMappings;
pub use platform::{Platform, PlatformError};
pub use status::{PaymentStatus, StatusParseError, SubscriptionStatus};
