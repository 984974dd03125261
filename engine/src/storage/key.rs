use std::fmt;

use crate::types::hash_str;

/// Instance key within a storage category.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key(u64);

impl Key {
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Key for a name, hashed with FNV-1a.
    #[inline]
    pub const fn from_name(name: &str) -> Self {
        Self(hash_str(name))
    }

    #[inline]
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:016x}", self.0)
    }
}

impl From<u64> for Key {
    #[inline]
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Anything usable as an instance key: raw hashes and names.
pub trait IntoKey {
    fn into_key(self) -> Key;
}

impl IntoKey for Key {
    #[inline]
    fn into_key(self) -> Key {
        self
    }
}

impl IntoKey for u64 {
    #[inline]
    fn into_key(self) -> Key {
        Key(self)
    }
}

impl IntoKey for &str {
    #[inline]
    fn into_key(self) -> Key {
        Key::from_name(self)
    }
}

impl IntoKey for &String {
    #[inline]
    fn into_key(self) -> Key {
        Key::from_name(self)
    }
}

impl IntoKey for String {
    #[inline]
    fn into_key(self) -> Key {
        Key::from_name(&self)
    }
}
