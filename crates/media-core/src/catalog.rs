//! Catalog Store
//!
//! Read/write seam over the media catalog. The settlement flow only ever
//! calls `find_item`; the write path belongs to catalog management.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::Result;
use crate::media::{MediaItem, MediaKind};

/// Catalog storage trait
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Look up an item by id, constrained to the declared kind
    async fn find_item(&self, id: &str, kind: MediaKind) -> Result<Option<MediaItem>>;

    /// Create or replace an item, enforcing catalog invariants
    async fn upsert_item(&self, item: MediaItem) -> Result<MediaItem>;

    /// All items, in insertion-independent order
    async fn list_items(&self) -> Result<Vec<MediaItem>>;
}

/// In-memory catalog store (for development and tests)
pub struct MemoryCatalogStore {
    items: RwLock<HashMap<String, MediaItem>>,
}

impl Default for MemoryCatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn find_item(&self, id: &str, kind: MediaKind) -> Result<Option<MediaItem>> {
        let items = self.items.read().unwrap();
        Ok(items.get(id).filter(|item| item.kind == kind).cloned())
    }

    async fn upsert_item(&self, item: MediaItem) -> Result<MediaItem> {
        item.validate()?;

        let mut items = self.items.write().unwrap();
        items.insert(item.id.clone(), item.clone());
        Ok(item)
    }

    async fn list_items(&self) -> Result<Vec<MediaItem>> {
        let items = self.items.read().unwrap();
        Ok(items.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn movie(id: &str) -> MediaItem {
        MediaItem {
            id: id.into(),
            title: "Movie".into(),
            description: "desc".into(),
            genre: "Action".into(),
            thumbnail: "https://cdn.example.com/t.jpg".into(),
            video_urls: vec!["https://v/1".into()],
            kind: MediaKind::Movie,
            amount: Some(dec!(100)),
            release_date: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_find_item_filters_on_kind() {
        let store = MemoryCatalogStore::new();
        store.upsert_item(movie("m1")).await.unwrap();

        assert!(
            store
                .find_item("m1", MediaKind::Movie)
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            store
                .find_item("m1", MediaKind::Series)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            store
                .find_item("missing", MediaKind::Movie)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_upsert_rejects_invalid_items() {
        let store = MemoryCatalogStore::new();
        let mut bad = movie("m2");
        bad.video_urls.push("https://v/2".into());

        assert!(store.upsert_item(bad).await.is_err());
        assert!(store.list_items().await.unwrap().is_empty());
    }
}
