pub mod config;
pub mod page;
pub mod ui_state;

pub use config::SiteConfig;
pub use page::{Page, RevealUnit, UnitContent};
pub use ui_state::{UiEffect, UiState};
