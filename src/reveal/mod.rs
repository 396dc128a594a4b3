pub mod controller;
pub mod geometry;
pub mod scroll_watcher;
pub mod transition;
pub mod watcher;

#[cfg(target_arch = "wasm32")]
pub mod dom_watcher;

pub use controller::{Presentation, RevealController, RevealPhase};
pub use scroll_watcher::ScrollWatcher;
pub use transition::{Easing, Frame, RevealTransition};
pub use watcher::{IntersectionEntry, IntersectionWatcher, ObserveOptions, RootMargin, Subscription};
