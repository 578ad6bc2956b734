pub use crate::builder::{Cache, CacheBuilder, PolicyKind};
pub use crate::ds::{Arena, EntryId, FreqBuckets, FrequencySketch, GhostList, OrderList};
pub use crate::policy::{
    AdaptiveCore, AgingConfig, ArcCore, ConcurrentAdaptiveCache, ConcurrentArcCache,
    ConcurrentLfuCache, ConcurrentLruCache, ConcurrentLrukCache, ConcurrentWTinyLfuCache, LfuCore,
    LruCore, LrukCore, Strategy, WTinyLfuCore,
};
pub use crate::traits::{ConcurrentCache, CoreCache, LfuCacheTrait, LruCacheTrait, MutableCache};
