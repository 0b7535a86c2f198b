//! Pong simulation and wire types shared by the server and clients.

pub mod config;
pub mod engine;
pub mod protocol;
