pub mod dom;

pub use dom::DomRenderer;
