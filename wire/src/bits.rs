/// Writes fields of bits into 32-bit words, lowest bits first.
///
/// The first field occupies the low-order bits of the first word. A field that does not fit into
/// the remainder of a word continues in the low-order bits of the next one. This is the
/// arrangement of component streams in the 12-bit RGB formats.
pub(crate) struct WordBits<'w> {
    words: &'w mut [u32],
    bit: usize,
}

impl<'w> WordBits<'w> {
    pub(crate) fn new(words: &'w mut [u32]) -> Self {
        WordBits { words, bit: 0 }
    }

    /// Append the low `len` bits of `value`.
    ///
    /// Bits beyond the end of the words are dropped, `len` is at most 32.
    pub(crate) fn push(&mut self, value: u32, len: usize) {
        debug_assert!(len <= 32);
        let value = u64::from(value) & mask(len);

        let word = self.bit / 32;
        let shift = self.bit % 32;
        self.bit += len;

        let wide = value << shift;
        if let Some(w) = self.words.get_mut(word) {
            *w |= wide as u32;
        }

        if shift + len > 32 {
            if let Some(w) = self.words.get_mut(word + 1) {
                *w |= (wide >> 32) as u32;
            }
        }
    }
}

/// Reads back what a [`WordBits`] wrote.
pub(crate) struct WordBitsReader<'w> {
    words: &'w [u32],
    bit: usize,
}

impl<'w> WordBitsReader<'w> {
    pub(crate) fn new(words: &'w [u32]) -> Self {
        WordBitsReader { words, bit: 0 }
    }

    pub(crate) fn take(&mut self, len: usize) -> u32 {
        let word = self.bit / 32;
        let shift = self.bit % 32;
        self.bit += len;

        let lo = u64::from(self.words.get(word).copied().unwrap_or(0));
        let hi = u64::from(self.words.get(word + 1).copied().unwrap_or(0));
        (((hi << 32 | lo) >> shift) & mask(len)) as u32
    }
}

const fn mask(len: usize) -> u64 {
    (1u64 << len) - 1
}
