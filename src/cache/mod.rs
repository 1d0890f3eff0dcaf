//! Evidence and macro caching.

pub mod lookups;
pub mod ttl;

pub use lookups::{DEFAULT_MACRO_TTL, EvidenceLookup, MacroLookup, static_evidence};
pub use ttl::{CacheStats, TtlCache};
