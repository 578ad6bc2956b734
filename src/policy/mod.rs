pub mod adaptive;
pub mod arc;
pub mod lfu;
pub mod lru;
pub mod lru_k;
pub mod tiny_lfu;

pub use adaptive::{AdaptiveCore, ConcurrentAdaptiveCache, Strategy};
pub use arc::{ArcCore, ConcurrentArcCache};
pub use lfu::{AgingConfig, ConcurrentLfuCache, LfuCore};
pub use lru::{ConcurrentLruCache, LruCore};
pub use lru_k::{ConcurrentLrukCache, LrukCore};
pub use tiny_lfu::{ConcurrentWTinyLfuCache, WTinyLfuCore};
