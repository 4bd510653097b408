//! Asset inventory services.
//! - `store`: the storage contract and its volatile, JSON file and SQLite backends.
//! - `notify`: over-assignment alerts delivered over HTTP.
//! - `inventory`: the serialized context the HTTP layer talks to.

pub mod errors;
pub mod store;
pub mod notify;
pub mod inventory;
pub mod metrics;
#[cfg(test)]
pub mod test_support;

pub use inventory::Inventory;
