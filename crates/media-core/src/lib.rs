//! # media-core
//!
//! Catalog domain for the media platform: purchasable items, the
//! `CatalogStore` seam the settlement flow reads through, and an in-memory
//! store for development and tests.
//!
//! The settlement flow never writes the catalog; item creation and the
//! single-vs-multi-unit invariant live here with the catalog write path.

mod catalog;
mod error;
mod media;

pub use catalog::{CatalogStore, MemoryCatalogStore};
pub use error::{CoreError, Result};
pub use media::{MediaItem, MediaKind};
