pub mod runtime;

#[cfg(target_arch = "wasm32")]
pub mod runtime_dom;

pub use runtime::{SiteRuntime, SnapshotOptions, SnapshotReport};
