use std::time::Duration;

pub const DEFAULT_CURRENCY: &str = "INR";
pub const DEFAULT_TRIP_ICON: &str = "plane";
pub const DEFAULT_CATEGORY: &str = "Others";
pub const PAYMENT_CATEGORY: &str = "Payment";

pub const NAME_MAX_LENGTH: usize = 100;
pub const DESCRIPTION_MAX_LENGTH: usize = 255;
pub const CATEGORY_MAX_LENGTH: usize = 50;
/// Upper bound on a single entry, in major currency units.
pub const MAX_ENTRY_AMOUNT: i64 = 1_000_000;
/// Upper bound on a single split weight. With `MAX_ENTRY_AMOUNT` this keeps
/// every `amount * weight` product far inside `Decimal` range.
pub const MAX_SPLIT_WEIGHT: i64 = 1_000_000;

pub const TRIP_VIEW_TTL: Duration = Duration::from_secs(3600);

/// Actor name used when the caller's user record has no display name.
pub const UNKNOWN_ACTOR: &str = "Unknown";
