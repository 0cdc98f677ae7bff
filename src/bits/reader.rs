use crate::error::{Error, Result};

/// Bit-level reader over a borrowed byte slice
///
/// Consumes bits LSB-first within each byte, the same order `BitWriter`
/// produces. Reading past the end of the slice fails with `TruncatedInput`.
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Next byte of `data` to load into the buffer
    pos: usize,
    /// Buffer holding up to 64 bits
    buffer: u64,
    /// Number of valid bits in buffer (0-64)
    bits_available: u8,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0, buffer: 0, bits_available: 0 }
    }

    /// Load whole bytes until the buffer holds at least `n` bits or input runs out
    #[inline]
    fn refill(&mut self, n: u8) {
        while self.bits_available < n && self.bits_available <= 56 && self.pos < self.data.len() {
            self.buffer |= (self.data[self.pos] as u64) << self.bits_available;
            self.pos += 1;
            self.bits_available += 8;
        }
    }

    /// Ensure at least `n` bits are available in buffer
    #[inline]
    fn fill_buffer(&mut self, n: u8) -> Result<()> {
        debug_assert!(n <= 57, "Cannot request more than 57 bits at once");
        self.refill(n);
        if self.bits_available < n {
            return Err(Error::TruncatedInput);
        }
        Ok(())
    }

    /// Read `n` bits (0-32) in LSB-first order
    pub fn read_bits(&mut self, n: u8) -> Result<u32> {
        debug_assert!(n <= 32, "Cannot read more than 32 bits at once");

        if n == 0 {
            return Ok(0);
        }

        self.fill_buffer(n)?;

        let mask = (1u64 << n) - 1;
        let result = (self.buffer & mask) as u32;
        self.buffer >>= n;
        self.bits_available -= n;

        Ok(result)
    }

    /// Peek at up to `n` bits without consuming them
    ///
    /// Near the end of input fewer bits may exist; returns the peeked value
    /// together with how many of the requested bits are real. Bits past the
    /// end read as zero.
    #[inline]
    pub fn peek_bits(&mut self, n: u8) -> (u32, u8) {
        debug_assert!(n <= 32, "Cannot peek more than 32 bits at once");
        self.refill(n);
        let available = self.bits_available.min(n);
        let mask = (1u64 << n) - 1;
        ((self.buffer & mask) as u32, available)
    }

    /// Consume `n` bits that were previously peeked
    #[inline]
    pub fn consume_bits(&mut self, n: u8) {
        debug_assert!(n <= self.bits_available, "Cannot consume more bits than available");
        self.buffer >>= n;
        self.bits_available -= n;
    }

    /// Whole bytes not yet consumed (buffered or still in the slice)
    pub fn remaining_bytes(&self) -> usize {
        (self.data.len() - self.pos) + (self.bits_available / 8) as usize
    }

    /// Whether the bits left in the current partial byte are all zero
    pub fn padding_is_zero(&self) -> bool {
        let partial = self.bits_available % 8;
        partial == 0 || self.buffer & ((1u64 << partial) - 1) == 0
    }
}
