//! Configuration models for polling and shutdown behavior.

pub mod bridge;

pub use bridge::BridgeConfig;
