use std::fmt;

use serde::{Serialize, Serializer};

/// Longest subject accepted from the identity provider.
pub const MAX_USER_ID_LEN: usize = 128;

/// Opaque user identifier issued by the external identity provider.
///
/// It becomes a path segment (`users/{userId}/...`), so it must be non-empty,
/// bounded, and free of `/` and control characters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = !raw.is_empty()
            && raw.len() <= MAX_USER_ID_LEN
            && !raw.chars().any(|c| c == '/' || c.is_control());
        valid.then(|| Self(raw.to_string()))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for UserId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
