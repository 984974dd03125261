use std::any::type_name;

use super::hash::hash_str;

/// Strip the generic clause and the module path from a full type name.
///
/// `alloc::vec::Vec<core::option::Option<u8>>` becomes `Vec`,
/// `my_game::Position` becomes `Position`, and primitives pass through.
pub fn short_name(full: &str) -> &str {
    let base = match full.find('<') {
        Some(index) => &full[..index],
        None => full,
    };
    match base.rfind("::") {
        Some(index) => &base[index + 2..],
        None => base,
    }
}

/// Short, path-free name of `T`.
#[inline]
pub fn nameof<T: ?Sized + 'static>() -> &'static str {
    short_name(type_name::<T>())
}

/// FNV-1a hash of the full name of `T`.
///
/// Stable for a given `T` within one build; not across compilers or
/// compiler versions.
#[inline]
pub fn hashof<T: ?Sized + 'static>() -> u64 {
    hash_str(type_name::<T>())
}

#[cfg(test)]
mod tests {
    use super::*;

    mod outer {
        pub struct Marker;
        pub struct Wrapper<T>(pub T);
    }

    #[test]
    fn strips_module_path() {
        assert_eq!(nameof::<outer::Marker>(), "Marker");
    }

    #[test]
    fn strips_generic_clause() {
        assert_eq!(nameof::<outer::Wrapper<outer::Marker>>(), "Wrapper");
        assert_eq!(nameof::<Vec<String>>(), "Vec");
    }

    #[test]
    fn primitives_pass_through() {
        assert_eq!(nameof::<i32>(), "i32");
        assert_eq!(nameof::<f64>(), "f64");
    }

    #[test]
    fn hash_is_stable_and_distinguishes_types() {
        assert_eq!(hashof::<u32>(), hashof::<u32>());
        assert_ne!(hashof::<u32>(), hashof::<i32>());
        assert_ne!(hashof::<Vec<u8>>(), hashof::<Vec<u16>>());
    }
}
