pub mod jwt;

use crate::core::errors::SmartSplitError;
use crate::core::models::user::Identity;

/// Turns a bearer credential into a caller identity.
pub trait IdentityProvider: Send + Sync {
    fn resolve(&self, token: &str) -> Result<Identity, SmartSplitError>;
}
