use super::tokens::Token;
use crate::error::{Corruption, Result};

/// Upper bound on memory reserved up front from a declared block length
const MAX_PREALLOC: usize = 16 * 1024 * 1024;

/// Rebuilds one block's bytes from its token stream
///
/// Back-references may only reach bytes already produced in the same block,
/// and no token may carry the output past the block's declared length.
pub struct Replay {
    output: Vec<u8>,
    declared: usize,
}

impl Replay {
    pub fn new(declared: usize) -> Self {
        Self { output: Vec::with_capacity(declared.min(MAX_PREALLOC)), declared }
    }

    /// Whether the declared length has been reached
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.output.len() >= self.declared
    }

    pub fn len(&self) -> usize {
        self.output.len()
    }

    pub fn is_empty(&self) -> bool {
        self.output.is_empty()
    }

    /// Append the bytes a token stands for
    pub fn apply(&mut self, token: Token) -> Result<()> {
        let produced = self.output.len() + token.uncompressed_size();
        if produced > self.declared {
            return Err(Corruption::BlockOverrun {
                produced: produced as u64,
                declared: self.declared as u64,
            }
            .into());
        }

        match token {
            Token::Literal(byte) => self.output.push(byte),
            Token::Match { offset, length } => {
                let distance = offset as usize;
                let length = length as usize;
                if distance == 0 || distance > self.output.len() {
                    return Err(Corruption::InvalidBackReference {
                        distance: offset,
                        available: self.output.len(),
                    }
                    .into());
                }

                let start = self.output.len() - distance;
                if length <= distance {
                    self.output.extend_from_within(start..start + length);
                } else {
                    // Overlapping copy: the source runs into bytes produced by this match
                    for i in 0..length {
                        let byte = self.output[start + i];
                        self.output.push(byte);
                    }
                }
            }
        }
        Ok(())
    }

    pub fn finish(self) -> Vec<u8> {
        self.output
    }
}

/// Replay a complete token list into a block of `declared` bytes
pub fn replay_tokens(tokens: &[Token], declared: usize) -> Result<Vec<u8>> {
    let mut replay = Replay::new(declared);
    for &token in tokens {
        replay.apply(token)?;
    }
    Ok(replay.finish())
}
