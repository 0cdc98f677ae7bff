/// Bytes hashed to locate match candidates
pub const HASH_LEN: usize = 3;

const HASH_BITS: u32 = 15;
const HASH_SIZE: usize = 1 << HASH_BITS;
const NIL: u32 = u32::MAX;

/// Hash chains over the positions of one chunk
///
/// `head` maps a 3-byte prefix hash to the most recent position with that
/// hash; `prev` is a ring indexed by `pos & mask` linking each position to
/// the previous one in its chain. Ring slots are reused once a position
/// falls more than `prev.len()` bytes behind, so a chain is only followed
/// while it keeps moving backwards inside the window.
pub struct HashChains {
    head: Vec<u32>,
    prev: Vec<u32>,
    mask: usize,
    window_size: usize,
}

impl HashChains {
    /// Create chains for a chunk of `input_len` bytes with the given window
    ///
    /// The ring never needs to be larger than the chunk itself.
    pub fn new(window_size: usize, input_len: usize) -> Self {
        debug_assert!(window_size.is_power_of_two());
        let ring = window_size.min(input_len.max(1).next_power_of_two());
        Self { head: vec![NIL; HASH_SIZE], prev: vec![NIL; ring], mask: ring - 1, window_size }
    }

    #[inline]
    fn hash(data: &[u8], pos: usize) -> usize {
        let v = (data[pos] as u32) << 16 | (data[pos + 1] as u32) << 8 | data[pos + 2] as u32;
        (v.wrapping_mul(0x9E37_79B1) >> (32 - HASH_BITS)) as usize
    }

    /// Record `pos` as the newest occurrence of its prefix
    #[inline]
    pub fn insert(&mut self, data: &[u8], pos: usize) {
        if pos + HASH_LEN > data.len() {
            return;
        }
        let h = Self::hash(data, pos);
        self.prev[pos & self.mask] = self.head[h];
        self.head[h] = pos as u32;
    }

    /// Earlier positions sharing the prefix at `pos`, nearest first
    ///
    /// `pos` itself must not have been inserted yet.
    pub fn candidates<'a>(&'a self, data: &[u8], pos: usize) -> Candidates<'a> {
        let next = if pos + HASH_LEN > data.len() { NIL } else { self.head[Self::hash(data, pos)] };
        Candidates { chains: self, pos, next }
    }
}

/// Iterator over a hash chain, see [`HashChains::candidates`]
pub struct Candidates<'a> {
    chains: &'a HashChains,
    pos: usize,
    next: u32,
}

impl Iterator for Candidates<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.next == NIL {
            return None;
        }
        let cand = self.next as usize;
        // Stale ring slots can point forward or outside the window
        if cand >= self.pos
            || self.pos - cand > self.chains.window_size
            || self.pos - cand > self.chains.prev.len()
        {
            self.next = NIL;
            return None;
        }
        let following = self.chains.prev[cand & self.chains.mask];
        self.next = if following != NIL && (following as usize) < cand { following } else { NIL };
        Some(cand)
    }
}
