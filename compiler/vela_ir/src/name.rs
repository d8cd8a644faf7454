//! Interned identifier.
//!
//! Type names, member names and parameter names are interned once and compared
//! as 32-bit handles. Structural cache keys are built entirely from `Name`s, so
//! they are `Copy` and never hold on to expression-tree nodes.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::interner;

/// Interned string identifier.
///
/// Layout: 32-bit index split into shard (4 bits) + local index (28 bits)
/// - Bits 31-28: Shard index (0-15)
/// - Bits 27-0: Local index within shard
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
#[repr(transparent)]
pub struct Name(u32);

impl Name {
    /// Pre-interned empty string.
    pub const EMPTY: Name = Name(0);

    /// Maximum local index per shard.
    pub const MAX_LOCAL: u32 = 0x0FFF_FFFF;

    /// Number of shards.
    pub const NUM_SHARDS: usize = 16;

    /// Create from shard and local index.
    #[inline]
    pub const fn new(shard: u32, local: u32) -> Self {
        debug_assert!(shard < 16);
        debug_assert!(local <= Self::MAX_LOCAL);
        Name((shard << 28) | local)
    }

    /// Intern `text` in the process-wide interner.
    #[inline]
    pub fn intern(text: &str) -> Self {
        interner::global().intern(text)
    }

    /// Extract shard index.
    #[inline]
    pub const fn shard(self) -> usize {
        (self.0 >> 28) as usize
    }

    /// Extract local index.
    #[inline]
    pub const fn local(self) -> usize {
        (self.0 & Self::MAX_LOCAL) as usize
    }

    /// Get raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The interned text. Interned strings are never freed.
    #[inline]
    pub fn as_str(self) -> &'static str {
        interner::global().lookup(self)
    }

    /// Whether this identifier was produced by a compiler rather than written
    /// in source (closure classes, closure fields, transparent identifiers).
    #[inline]
    pub fn is_synthesized(self) -> bool {
        self.as_str().contains(SYNTHESIZED_MARKER)
    }
}

/// Marker that compilers embed in the identifiers they generate.
pub const SYNTHESIZED_MARKER: &str = "__";

impl Hash for Name {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", self.as_str())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for Name {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl From<&str> for Name {
    fn from(text: &str) -> Self {
        Name::intern(text)
    }
}
