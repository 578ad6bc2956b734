pub mod arena;
pub mod freq_buckets;
pub mod ghost;
pub mod linked;
pub mod sketch;

pub use arena::{Arena, EntryId};
pub use freq_buckets::FreqBuckets;
pub use ghost::GhostList;
pub use linked::OrderList;
pub use sketch::{FrequencySketch, DEFAULT_DEPTH};
