//! Client-side session identifiers.
//!
//! The backend only uses the id to correlate turns of one conversation, so
//! all we need is a unique-enough token. Randomness comes through
//! [`RandomSource`] so tests can pin it down.

use std::fmt;

use rand::RngCore;
use serde::Serialize;
use uuid::Builder;

/// Anything that can hand out random bytes.
pub trait RandomSource {
    fn fill_bytes(&mut self, buf: &mut [u8]);
}

/// Operating system CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill_bytes(&mut self, buf: &mut [u8]) {
        rand::rngs::OsRng.fill_bytes(buf);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Draw 16 bytes and format them as a version 4 UUID.
    pub fn generate(random: &mut dyn RandomSource) -> Self {
        let mut bytes = [0u8; 16];
        random.fill_bytes(&mut bytes);
        let uuid = Builder::from_random_bytes(bytes).into_uuid();
        Self(uuid.hyphenated().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First block of the id, enough to tell sessions apart in the header.
    pub fn short(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic source: every call yields the next counter value.
    struct Counter(u8);

    impl RandomSource for Counter {
        fn fill_bytes(&mut self, buf: &mut [u8]) {
            for byte in buf.iter_mut() {
                *byte = self.0;
            }
            self.0 = self.0.wrapping_add(1);
        }
    }

    #[test]
    fn has_uuid_v4_shape() {
        let id = SessionId::generate(&mut Counter(0xab));
        let s = id.as_str();
        assert_eq!(s.len(), 36);
        assert_eq!(s.matches('-').count(), 4);
        // version nibble
        assert_eq!(&s[14..15], "4");
        // variant nibble is one of 8, 9, a, b
        assert!(matches!(&s[19..20], "8" | "9" | "a" | "b"));
    }

    #[test]
    fn different_draws_give_different_ids() {
        let mut random = Counter(1);
        let first = SessionId::generate(&mut random);
        let second = SessionId::generate(&mut random);
        assert_ne!(first, second);
    }

    #[test]
    fn same_bytes_give_same_id() {
        let a = SessionId::generate(&mut Counter(7));
        let b = SessionId::generate(&mut Counter(7));
        assert_eq!(a, b);
    }

    #[test]
    fn os_random_ids_differ() {
        let a = SessionId::generate(&mut OsRandom);
        let b = SessionId::generate(&mut OsRandom);
        assert_ne!(a, b);
    }

    #[test]
    fn short_is_first_block() {
        let id = SessionId::generate(&mut Counter(0x11));
        assert_eq!(id.short(), "11111111");
    }
}
