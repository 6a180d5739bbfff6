//! Result cache and request coalescing.
//!
//! [`InMemoryResultCache`] keeps finalized scan results for the life of the
//! process. [`RequestCoalescer`] makes concurrent requests for the same key
//! share one execution.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod coalesce;

pub use cache::{InMemoryResultCache, ResultCache};
pub use coalesce::RequestCoalescer;
