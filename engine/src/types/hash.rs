//! 64-bit FNV-1a.

/// FNV-1a offset basis.
pub const FNV_BASIS: u64 = 14_695_981_039_346_656_037;

/// FNV-1a prime.
pub const FNV_PRIME: u64 = 1_099_511_628_211;

/// Hash `bytes` with 64-bit FNV-1a. Usable in const contexts.
pub const fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

/// Hash the UTF-8 bytes of `s`.
#[inline]
pub const fn hash_str(s: &str) -> u64 {
    fnv1a(s.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_the_basis() {
        assert_eq!(fnv1a(&[]), FNV_BASIS);
    }

    #[test]
    fn matches_reference_vectors() {
        assert_eq!(hash_str("a"), 0xaf63_dc4c_8601_ec8c);
        assert_eq!(hash_str("foobar"), 0x8594_4171_f739_67e8);
    }

    #[test]
    fn usable_at_compile_time() {
        const SCORE: u64 = hash_str("score");

        assert_eq!(SCORE, hash_str("score"));
        assert_ne!(SCORE, hash_str("Score"));
    }
}
