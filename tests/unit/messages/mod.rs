pub mod inbound;
pub mod wire;
