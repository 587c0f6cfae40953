//! Domain models.
//!
//! These are internal domain models shared by the stores and the HTTP layer.
//! Wire-facing names (`_id`, camelCase) are fixed here because session-token
//! claims and order records are serialized straight from them.

pub mod claims;
pub mod identity;
pub mod order;
pub mod review;
pub mod vcode;

/// Error returned when a stored enum value does not match any known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}
