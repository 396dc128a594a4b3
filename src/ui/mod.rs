pub mod event;
pub mod viewport;

pub use event::{EventQueue, SiteEvent};
pub use viewport::Viewport;
