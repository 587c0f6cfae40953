// Helper for generating record identifiers.
//
// Identities, orders, codes and reviews all use UUIDv7 so that ids sort by
// creation time, which the in-memory stores rely on for newest-first listing.

use uuid::Uuid;

/// Generate a new UUIDv7 (timestamp-sortable).
pub fn uuidv7() -> Uuid {
    Uuid::now_v7()
}

/// Generate a new UUIDv7 rendered as a hyphenated string.
pub fn new_id() -> String {
    uuidv7().to_string()
}
