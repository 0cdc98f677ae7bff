//! LZ77 stage: tokens, hash-chain match finding and replay

pub mod matcher;
pub mod replay;
pub mod tokens;
pub mod window;

pub use matcher::tokenize;
pub use replay::Replay;
pub use tokens::Token;
