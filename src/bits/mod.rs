//! Bit stream primitives shared by the Huffman coder and block framer.
//!
//! Both directions use LSB-first bit order within each byte.

pub mod reader;
pub mod writer;

pub use reader::BitReader;
pub use writer::BitWriter;
