//! Client-side state layer for the Trading Post time-banking marketplace.
//!
//! The crate is organized the way the data flows: [`api::ApiClient`] wraps
//! the Trading Post HTTP service behind typed, bearer-authenticated calls;
//! the [`stores`] cache service state in memory and expose derived views;
//! [`context::AppContext`] owns one client plus one of each store and is
//! passed by reference to consumers — there is no ambient global state.
//!
//! Canonical state always lives on the service. Stores are read-through,
//! write-through caches scoped to the current session: every mutation goes
//! to the service first and is only applied locally once the service has
//! confirmed it.

pub mod api;
pub mod context;
pub mod stores;

pub use api::{ApiClient, ApiError, ApiResult};
pub use context::AppContext;
