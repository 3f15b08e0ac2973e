//! Shared building blocks for the Trading Post platform.
//!
//! This crate holds the wire models exchanged with the Trading Post HTTP
//! service (posts, users, conversations, messages, activities, transactions)
//! and the client configuration loader. Every consumer of the API — the
//! state-layer crate, tools, tests — speaks these types.

pub mod config;
pub mod models;
