use std::{
    any::{TypeId, type_name},
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};

use super::{hash::hash_str, name::short_name};

/// Identity of a stored type: the native [`TypeId`] plus its name and name
/// hash for diagnostics.
///
/// Equality, ordering and hashing only look at the [`TypeId`].
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
    hash: u64,
}

impl TypeKey {
    /// Key for `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        let name = type_name::<T>();
        Self {
            id: TypeId::of::<T>(),
            name,
            hash: hash_str(name),
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Full type name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without path or generic arguments.
    #[inline]
    pub fn short_name(&self) -> &'static str {
        short_name(self.name)
    }

    /// FNV-1a hash of [`TypeKey::name`].
    #[inline]
    pub fn name_hash(&self) -> u64 {
        self.hash
    }

    #[inline]
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeKey {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl PartialOrd for TypeKey {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeKey {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_type_same_key() {
        assert_eq!(TypeKey::of::<String>(), TypeKey::of::<String>());
        assert!(TypeKey::of::<String>().is::<String>());
    }

    #[test]
    fn different_types_differ() {
        assert_ne!(TypeKey::of::<u8>(), TypeKey::of::<i8>());
    }

    #[test]
    fn display_uses_short_name() {
        let key = TypeKey::of::<Vec<u8>>();

        assert_eq!(key.to_string(), "Vec");
        assert_eq!(key.name_hash(), hash_str(key.name()));
    }
}
