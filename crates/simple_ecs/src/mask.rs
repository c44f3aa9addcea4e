//! Growable bitset recording which components an entity has.

use crate::component::ComponentIndex;

/// A set of [`ComponentIndex`] values backed by `u64` words.
///
/// Words are allocated on demand when a bit beyond the current length is set;
/// clearing never shrinks the storage.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ComponentMask {
    bits: Vec<u64>,
}

impl ComponentMask {
    /// Creates an empty mask.
    #[must_use]
    pub fn new() -> Self {
        Self { bits: Vec::new() }
    }

    /// Sets the bit for `index`. Returns `true` if it was previously clear.
    pub fn set(&mut self, index: ComponentIndex) -> bool {
        let (word, bit) = Self::locate(index);
        if word >= self.bits.len() {
            self.bits.resize(word + 1, 0);
        }
        let was_clear = self.bits[word] & bit == 0;
        self.bits[word] |= bit;
        was_clear
    }

    /// Clears the bit for `index`. Returns `true` if it was previously set.
    pub fn clear(&mut self, index: ComponentIndex) -> bool {
        let (word, bit) = Self::locate(index);
        match self.bits.get_mut(word) {
            Some(w) if *w & bit != 0 => {
                *w &= !bit;
                true
            }
            _ => false,
        }
    }

    /// Returns `true` if the bit for `index` is set.
    #[must_use]
    pub fn contains(&self, index: ComponentIndex) -> bool {
        let (word, bit) = Self::locate(index);
        self.bits.get(word).is_some_and(|w| w & bit != 0)
    }

    /// Returns `true` if no bit is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&w| w == 0)
    }

    /// Clears every bit, keeping the allocation.
    pub fn reset(&mut self) {
        self.bits.fill(0);
    }

    /// Iterate over the set indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = ComponentIndex> + '_ {
        self.bits.iter().enumerate().flat_map(|(word_idx, &word)| {
            (0..64u32)
                .filter(move |bit| word & (1 << bit) != 0)
                .map(move |bit| ComponentIndex(word_idx as u32 * 64 + bit))
        })
    }

    fn locate(index: ComponentIndex) -> (usize, u64) {
        ((index.0 / 64) as usize, 1u64 << (index.0 % 64))
    }
}
