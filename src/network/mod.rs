pub mod client;
pub mod connection;
pub mod dispatch;
pub mod server;

pub use client::Client;
pub use connection::serve_connection;
pub use dispatch::{DispatchError, Dispatcher};
pub use server::{Server, DEFAULT_MAX_CONNECTIONS};
