mod error;
mod registry;

pub use error::HubError;
pub use registry::{ConnectionHub, ConnectionId, OutboundSender};
