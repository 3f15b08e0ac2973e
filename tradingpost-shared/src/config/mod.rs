//! Client configuration for the Trading Post platform.

pub mod client;

pub use client::ClientConfig;
