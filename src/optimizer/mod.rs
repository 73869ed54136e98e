//! Resource optimizer module
//!
//! Fetching, per-type transforms, load tracking and viewport triggering.

mod fetcher;
mod pipeline;
mod resource;
mod transform;
mod viewport;

pub use fetcher::{Fetcher, HttpFetcher, MemoryFetcher};
pub use pipeline::{
    LoadedResource, OptimizerConfig, ResourceOptimizer, ResourceStats, ResourceStatus,
    TrackedResource,
};
pub use resource::{Resource, ResourceKind};
pub use transform::{ImageRecompressor, PassThrough, ResourceTransform, Transformed};
pub use viewport::{Placement, ProximityObserver, Viewport};
