//! In-memory stores synchronized from the Trading Post service.
//!
//! Every store follows the same contract: operations call the service first
//! and mutate the cache only from the response; derived views are pure
//! queries over the cached collections; failures land in the store's
//! `last_error` slot *and* propagate to the caller. Consumers may read
//! concurrently — mutation is confined to the operation path.

pub mod activity;
pub mod messages;
pub mod posts;
pub mod user;

pub use activity::ActivityStore;
pub use messages::MessageStore;
pub use posts::PostStore;
pub use user::UserStore;
