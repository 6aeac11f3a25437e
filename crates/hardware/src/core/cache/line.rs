//! Cache line storage slot.
//!
//! A line is never created or destroyed after the cache is built. Eviction
//! and invalidation are state transitions on the slot:
//!
//! - `Invalid -> Clean | Dirty` when a block is installed,
//! - `Clean | Dirty -> Clean | Dirty` (new tag) when a valid line is replaced,
//! - `Clean -> Dirty` on a write hit in write-back mode,
//! - `Clean | Dirty -> Invalid` on external invalidation or clear.

/// Validity and dirtiness of a line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineState {
    /// Holds no block; tag and offset are meaningless.
    #[default]
    Invalid,
    /// Holds a block identical to the lower level.
    Clean,
    /// Holds a block modified since it was fetched (write-back mode only).
    Dirty,
}

/// One way of one set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheLine {
    state: LineState,
    tag: u64,
    offset: u64,
    recency: u64,
}

impl CacheLine {
    /// An invalid, clean line with zeroed metadata.
    pub const INVALID: Self = Self {
        state: LineState::Invalid,
        tag: 0,
        offset: 0,
        recency: 0,
    };

    /// A valid line holding `tag`, with recency 0 (most recently used).
    pub const fn filled(tag: u64, offset: u64, dirty: bool) -> Self {
        Self {
            state: if dirty { LineState::Dirty } else { LineState::Clean },
            tag,
            offset,
            recency: 0,
        }
    }

    /// Current state.
    #[inline]
    pub const fn state(&self) -> LineState {
        self.state
    }

    /// `true` unless the line is [`LineState::Invalid`].
    #[inline]
    pub const fn is_valid(&self) -> bool {
        !matches!(self.state, LineState::Invalid)
    }

    /// `true` only for [`LineState::Dirty`].
    #[inline]
    pub const fn is_dirty(&self) -> bool {
        matches!(self.state, LineState::Dirty)
    }

    /// Stored tag.
    #[inline]
    pub const fn tag(&self) -> u64 {
        self.tag
    }

    /// Byte offset of the access that installed the line.
    #[inline]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Accesses to the set since this line was last touched.
    #[inline]
    pub const fn recency(&self) -> u64 {
        self.recency
    }

    /// `true` when the line is valid and holds `tag`.
    #[inline]
    pub const fn matches(&self, tag: u64) -> bool {
        self.is_valid() && self.tag == tag
    }

    /// Marks a valid line dirty. Invalid lines are left untouched.
    pub const fn mark_dirty(&mut self) {
        if self.is_valid() {
            self.state = LineState::Dirty;
        }
    }

    /// Drops the block and any pending write-back.
    pub const fn invalidate(&mut self) {
        self.state = LineState::Invalid;
    }

    /// Ages the line by one access.
    #[inline]
    pub const fn age(&mut self) {
        self.recency = self.recency.saturating_add(1);
    }

    /// Makes the line most recently used.
    #[inline]
    pub const fn touch(&mut self) {
        self.recency = 0;
    }
}
