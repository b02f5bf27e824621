//! Integration tests across storage, sessions, the hub and the TCP server

pub mod matchmaking;
