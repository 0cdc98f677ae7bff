use crate::error::{Error, Result};

/// Bit-level writer bounded by a byte capacity
///
/// Writes bits LSB-first within each byte. Any write that would grow the
/// output past `limit` bytes fails with `BufferTooSmall`, so the caller's
/// capacity bounds the work done rather than being checked afterwards.
pub struct BitWriter {
    /// Accumulated output bytes
    output: Vec<u8>,
    /// Current byte being built
    current_byte: u8,
    /// Bits written to current byte (0-7)
    bits_in_byte: u8,
    /// Maximum number of output bytes, including the final partial byte
    limit: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::with_limit(usize::MAX)
    }

    /// Create a writer that refuses to produce more than `limit` bytes
    pub fn with_limit(limit: usize) -> Self {
        let initial = limit.min(64 * 1024);
        Self { output: Vec::with_capacity(initial), current_byte: 0, bits_in_byte: 0, limit }
    }

    #[inline]
    fn push_byte(&mut self, byte: u8) -> Result<()> {
        if self.output.len() >= self.limit {
            return Err(Error::BufferTooSmall { capacity: self.limit });
        }
        self.output.push(byte);
        Ok(())
    }

    /// Write `n` bits (0-32) from value in LSB-first order
    pub fn write_bits(&mut self, value: u32, n: u8) -> Result<()> {
        debug_assert!(n <= 32);

        let mut val = value as u64;
        let mut remaining = n;

        while remaining > 0 {
            let space = 8 - self.bits_in_byte;
            let to_write = remaining.min(space);

            let mask = (1u64 << to_write) - 1;
            self.current_byte |= ((val & mask) as u8) << self.bits_in_byte;

            val >>= to_write;
            self.bits_in_byte += to_write;
            remaining -= to_write;

            if self.bits_in_byte == 8 {
                self.push_byte(self.current_byte)?;
                self.current_byte = 0;
                self.bits_in_byte = 0;
            }
        }
        Ok(())
    }

    /// Write a Huffman code most-significant bit first
    ///
    /// Canonical codes are defined MSB-first; reversing them lets the reader
    /// consume them one bit at a time from the LSB-first stream.
    pub fn write_bits_reversed(&mut self, code: u32, length: u8) -> Result<()> {
        let reversed = reverse_bits(code, length);
        self.write_bits(reversed, length)
    }

    /// Pad to byte boundary with zero bits
    fn align_to_byte(&mut self) -> Result<()> {
        if self.bits_in_byte > 0 {
            self.push_byte(self.current_byte)?;
            self.current_byte = 0;
            self.bits_in_byte = 0;
        }
        Ok(())
    }

    /// Finish and return the output bytes
    pub fn finish(mut self) -> Result<Vec<u8>> {
        self.align_to_byte()?;
        Ok(self.output)
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Reverse the bottom `n` bits of `value`
pub(crate) fn reverse_bits(value: u32, n: u8) -> u32 {
    if n == 0 {
        return 0;
    }
    value.reverse_bits() >> (32 - n as u32)
}
