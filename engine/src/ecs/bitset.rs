use std::{fmt, hash::Hash};

/// Inline word storage of a [`BitSet`].
///
/// Implemented for `[u64; N]`; a settings type picks the smallest `N`
/// holding all of its component and tag bits.
pub trait Blocks: Copy + Eq + Hash + Send + Sync + 'static {
    const ZERO: Self;

    fn words(&self) -> &[u64];

    fn words_mut(&mut self) -> &mut [u64];
}

impl<const N: usize> Blocks for [u64; N] {
    const ZERO: Self = [0; N];

    #[inline]
    fn words(&self) -> &[u64] {
        self
    }

    #[inline]
    fn words_mut(&mut self) -> &mut [u64] {
        self
    }
}

/// Number of `u64` words needed for `bits` bits, at least one.
pub const fn words_for(bits: usize) -> usize {
    if bits == 0 { 1 } else { bits.div_ceil(64) }
}

/// Fixed-width set of component and tag bits, stored inline.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitSet<B: Blocks> {
    blocks: B,
    len: usize,
}

impl<B: Blocks> Default for BitSet<B> {
    fn default() -> Self {
        Self::with_len(0)
    }
}

impl<B: Blocks> BitSet<B> {
    /// All-clear bitset `len` bits wide. Panics when `B` cannot hold `len`
    /// bits.
    #[inline]
    pub fn with_len(len: usize) -> Self {
        let blocks = B::ZERO;
        assert!(len <= blocks.words().len() * 64, "bitset of {len} bits does not fit its blocks");
        Self { blocks, len }
    }

    /// Bitset `len` bits wide with each of `bits` set.
    pub fn from_bits(len: usize, bits: &[usize]) -> Self {
        let mut set = Self::with_len(len);
        for &bit in bits {
            set.set(bit);
        }
        set
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Set `bit`. Panics when `bit` is outside the width.
    #[inline]
    pub fn set(&mut self, bit: usize) {
        assert!(bit < self.len, "bit {bit} out of range for width {}", self.len);
        self.blocks.words_mut()[bit / 64] |= 1u64 << (bit % 64);
    }

    #[inline]
    pub fn unset(&mut self, bit: usize) {
        if bit < self.len {
            self.blocks.words_mut()[bit / 64] &= !(1u64 << (bit % 64));
        }
    }

    #[inline]
    pub fn test(&self, bit: usize) -> bool {
        bit < self.len && self.blocks.words()[bit / 64] & (1u64 << (bit % 64)) != 0
    }

    /// Clear every bit, keeping the width.
    #[inline]
    pub fn reset(&mut self) {
        self.blocks = B::ZERO;
    }

    /// Whether every bit of `signature` is also set here.
    #[inline]
    pub fn matches(&self, signature: &BitSet<B>) -> bool {
        self.blocks
            .words()
            .iter()
            .zip(signature.blocks.words())
            .all(|(own, sig)| own & sig == *sig)
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.blocks.words().iter().map(|word| word.count_ones() as usize).sum()
    }

    #[inline]
    pub fn is_clear(&self) -> bool {
        self.blocks.words().iter().all(|word| *word == 0)
    }

    /// Indices of set bits, lowest first.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(|&bit| self.test(bit))
    }
}

impl<B: Blocks> fmt::Display for BitSet<B> {
    /// Highest bit first, like a binary literal.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in (0..self.len()).rev() {
            f.write_str(if self.test(bit) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl<B: Blocks> fmt::Debug for BitSet<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitSet({self})")
    }
}

/// One bitset per signature of a settings type.
#[derive(Debug, Clone)]
pub struct SignatureBitsets<B: Blocks> {
    bitsets: Vec<BitSet<B>>,
}

impl<B: Blocks> SignatureBitsets<B> {
    /// Build the table: `signatures[i]` lists the bits signature `i` needs.
    pub fn build(width: usize, signatures: &[&[usize]]) -> Self {
        Self {
            bitsets: signatures
                .iter()
                .map(|bits| BitSet::from_bits(width, bits))
                .collect(),
        }
    }

    /// Bitset of the signature with `id`. Ids come from the settings type,
    /// so an out-of-range id is a bug and panics.
    #[inline]
    pub fn get(&self, id: usize) -> &BitSet<B> {
        &self.bitsets[id]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bitsets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bitsets.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BitSet<B>> {
        self.bitsets.iter()
    }
}
