// SPDX-License-Identifier: MIT

//! Fixed-capacity, type-prefixed identifiers.
//!
//! Every id in this crate is a thin wrapper around [`IdBuf`], a 23-byte
//! inline buffer that avoids a heap allocation for the common case of a
//! short prefix plus a nanoid suffix.

use std::borrow::Borrow;
use std::fmt;

pub const ID_MAX_LEN: usize = 23;

/// Truncate `s` to at most `n` bytes, respecting UTF-8 boundaries.
pub fn short(s: &str, n: usize) -> &str {
    if s.len() <= n {
        return s;
    }
    let mut end = n;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Inline, copy-able string buffer used for id storage.
#[derive(Clone, Copy)]
pub struct IdBuf {
    buf: [u8; ID_MAX_LEN],
    len: u8,
}

impl IdBuf {
    pub fn new(s: &str) -> Self {
        let bytes = short(s, ID_MAX_LEN).as_bytes();
        let mut buf = [0u8; ID_MAX_LEN];
        buf[..bytes.len()].copy_from_slice(bytes);
        Self {
            buf,
            len: bytes.len() as u8,
        }
    }

    pub fn as_str(&self) -> &str {
        // SAFETY-free: bytes always originate from a valid `&str` slice.
        std::str::from_utf8(&self.buf[..self.len as usize]).unwrap_or_default()
    }
}

impl fmt::Debug for IdBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for IdBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.as_str(), f)
    }
}

impl PartialEq for IdBuf {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}
impl Eq for IdBuf {}

impl std::hash::Hash for IdBuf {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_str().hash(state)
    }
}

impl Borrow<str> for IdBuf {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl serde::Serialize for IdBuf {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for IdBuf {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(IdBuf::new(&s))
    }
}

/// Generate a fresh id with the given string prefix, e.g. `"evt-"`.
pub fn generate(prefix: &str) -> IdBuf {
    let suffix = nanoid::nanoid!(16);
    let mut s = String::with_capacity(prefix.len() + suffix.len());
    s.push_str(prefix);
    s.push_str(&suffix);
    IdBuf::new(&s)
}

/// Define a type-prefixed newtype id backed by [`IdBuf`].
#[macro_export]
macro_rules! define_id {
    ($name:ident, $prefix:expr) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name($crate::id::IdBuf);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            pub fn new() -> Self {
                Self($crate::id::generate($prefix))
            }

            pub fn from_string(s: impl AsRef<str>) -> Self {
                Self($crate::id::IdBuf::new(s.as_ref()))
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::from_string(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                self.as_str()
            }
        }
    };
}

define_id!(EventId, "evt-");
define_id!(WatchId, "wch-");
define_id!(AttemptId, "att-");
define_id!(SnapshotId, "snp-");

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;