pub mod handler;
pub mod msg_ping_handler;

pub use handler::websocket_handler;
