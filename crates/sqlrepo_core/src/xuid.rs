//! External identifier generation.

use uuid::Uuid;

/// Produces globally unique identifiers for models carrying an `xuid` member.
pub trait XuidGenerator {
    fn generate(&self) -> String;
}

/// Default generator: random UUID v4 rendered as 32 lowercase hex digits.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidXuidGenerator;

impl XuidGenerator for UuidXuidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}
