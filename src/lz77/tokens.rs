/// Represents a single token in the LZ77 stream
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token {
    /// A literal byte
    Literal(u8),
    /// A back-reference: copy `length` bytes starting `offset` bytes back
    Match { offset: u32, length: u32 },
}

impl Token {
    /// Returns the uncompressed size this token represents
    #[inline]
    pub fn uncompressed_size(&self) -> usize {
        match self {
            Token::Literal(_) => 1,
            Token::Match { length, .. } => *length as usize,
        }
    }
}

/// Total uncompressed size of a token sequence
pub fn uncompressed_size(tokens: &[Token]) -> usize {
    tokens.iter().map(Token::uncompressed_size).sum()
}
