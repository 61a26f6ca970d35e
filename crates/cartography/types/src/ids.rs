//! Identifier types.
//!
//! Categories and items are addressed by namespaced keys (`namespace:path`),
//! the same shape the host world registries use. Merchants, slots and
//! customer sessions get opaque UUID-backed ids.

use crate::errors::KeyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Separator between the namespace and the path of a key.
pub const KEY_SEPARATOR: char = ':';

fn valid_namespace_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.')
}

fn valid_path_char(c: char) -> bool {
    valid_namespace_char(c) || c == '/'
}

/// Validate a raw `namespace:path` key and return it trimmed.
fn validate_key(raw: &str) -> Result<&str, KeyError> {
    let raw = raw.trim();
    let (namespace, path) = raw
        .split_once(KEY_SEPARATOR)
        .ok_or_else(|| KeyError::MissingSeparator(raw.to_string()))?;

    if namespace.is_empty() || !namespace.chars().all(valid_namespace_char) {
        return Err(KeyError::InvalidNamespace(raw.to_string()));
    }
    if path.is_empty() || !path.chars().all(valid_path_char) {
        return Err(KeyError::InvalidPath(raw.to_string()));
    }
    Ok(raw)
}

macro_rules! namespaced_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parse a `namespace:path` key.
            pub fn parse(raw: &str) -> Result<Self, KeyError> {
                validate_key(raw).map(|key| Self(key.to_string()))
            }

            /// The full key.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// The part before the separator.
            pub fn namespace(&self) -> &str {
                self.0.split_once(KEY_SEPARATOR).map(|(ns, _)| ns).unwrap_or("")
            }

            /// The part after the separator.
            pub fn path(&self) -> &str {
                self.0.split_once(KEY_SEPARATOR).map(|(_, p)| p).unwrap_or(&self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = KeyError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = KeyError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

namespaced_key! {
    /// Identifier of a POI category (a kind of discoverable structure).
    CategoryId
}

namespaced_key! {
    /// Identifier of an item used as trade currency.
    ItemId
}

/// Unique identifier for a merchant entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MerchantId(pub Uuid);

impl MerchantId {
    /// Generate a new random merchant ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for MerchantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "merchant-{}", self.0)
    }
}

/// Unique identifier for a trade slot within a merchant's trade list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotId(pub Uuid);

impl SlotId {
    /// Generate a new random slot ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot-{}", self.0)
    }
}

/// Identifier of a customer's trading session with a merchant.
///
/// A new session starts every time a customer opens the trade screen, so a
/// changed session id means the original viewer is gone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generate a new random session ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Identifier of whoever holds an unidentified map being deciphered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HolderId(pub Uuid);

impl HolderId {
    /// Generate a new random holder ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for HolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "holder-{}", self.0)
    }
}
