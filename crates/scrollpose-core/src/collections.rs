//! Map types used by the composition runtime. The default configuration
//! hashes with `rustc-hash`; enable `std-hash` to fall back to the standard
//! library's hasher.

#[cfg(feature = "std-hash")]
pub mod map {
    pub use std::collections::hash_map::Entry;
    pub use std::collections::HashMap;
}

#[cfg(not(feature = "std-hash"))]
pub mod map {
    pub use rustc_hash::FxHashMap as HashMap;
    pub use std::collections::hash_map::Entry;
}
