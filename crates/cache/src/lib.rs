//! Object cache used by the lookup services.
//!
//! [`ObjectCache`] is the seam to the host's key-value store;
//! [`MemoryCache`] is the in-process implementation. [`CacheHandle`]
//! layers typed JSON accessors and the single-winner `get_or_compute`
//! primitive on top of whichever backend is plugged in.

mod handle;
mod memory;
mod store;

pub use handle::CacheHandle;
pub use memory::MemoryCache;
pub use store::{CacheError, ObjectCache};
