//! Data model shared by every storage backend: the [`asset::Asset`] value
//! type with its field rules, and the sea-orm entity for the `computers` table.

pub mod errors;
pub mod asset;
pub mod computer;
pub mod db;

pub use asset::Asset;
