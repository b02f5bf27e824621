pub mod chess;
pub mod types;
pub mod wire;

pub use types::{InboundMessage, OutboundMessage, RatingChange};
pub use wire::{
    FramedMessage, WireConfig, WireProtocolError, DEFAULT_READ_TIMEOUT, DEFAULT_WRITE_TIMEOUT,
    LENGTH_PREFIX_SIZE, MAX_MESSAGE_SIZE,
};
