use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    /// bcrypt hash, never sent over the wire
    #[serde(skip_serializing, default)]
    pub password: String,
}

/// Resolved caller identity. Produced by an `IdentityProvider`, carried in request extensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
}
