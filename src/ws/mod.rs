pub mod palette;
pub mod registry;
pub mod document;
pub mod peers;
pub mod state;
pub mod router;
pub mod lifecycle;
pub mod hub;

pub use hub::{HubHandle, HubStats};
