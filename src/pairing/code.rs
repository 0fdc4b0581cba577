use rand::Rng;
use uuid::Uuid;

/// Codes live for five minutes; expiry is checked lazily at consume time.
pub const CODE_TTL_MS: i64 = 5 * 60 * 1000;
const CODE_SPACE: u32 = 1_000_000;

/// A fresh 6-digit numeric code, zero-padded.
pub fn draw_code() -> String {
    format!("{:06}", rand::rng().random_range(0..CODE_SPACE))
}

/// Opaque room identifier, allocated at generate time and activated only when
/// the code is consumed.
pub fn draw_room_id() -> String {
    format!("r-{}", Uuid::now_v7().simple())
}
