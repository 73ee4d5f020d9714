//! Clipboard item storage.
//!
//! Handlers only see the [`ClipboardStore`] trait so the link services stay
//! independent of where items live. The in-memory store is the only backend.

use std::sync::RwLock;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{ClipboardItem, ItemKind};

pub trait ClipboardStore: Send + Sync {
    /// All items, newest capture first.
    fn list(&self) -> AppResult<Vec<ClipboardItem>>;

    fn get(&self, id: Uuid) -> AppResult<Option<ClipboardItem>>;

    /// Insert at the front, evicting the oldest items beyond capacity.
    fn add(&self, item: ClipboardItem) -> AppResult<ClipboardItem>;

    /// Apply `change` to the item with `id`, returning the updated copy.
    fn update(
        &self,
        id: Uuid,
        change: &mut dyn FnMut(&mut ClipboardItem),
    ) -> AppResult<Option<ClipboardItem>>;

    /// Returns `true` if an item was removed.
    fn remove(&self, id: Uuid) -> AppResult<bool>;
}

pub struct MemoryStore {
    items: RwLock<Vec<ClipboardItem>>,
    max_items: usize,
}

impl MemoryStore {
    pub fn new(max_items: usize) -> Self {
        MemoryStore {
            items: RwLock::new(Vec::new()),
            max_items: max_items.max(1),
        }
    }

    /// A store pre-filled with the demo items shown on first launch.
    pub fn with_samples(max_items: usize) -> Self {
        let store = MemoryStore::new(max_items);
        if let Ok(mut items) = store.items.write() {
            *items = sample_items();
            items.truncate(store.max_items);
        }
        store
    }
}

fn poisoned<T>(_: T) -> AppError {
    tracing::error!("Clipboard store lock poisoned");
    AppError::Internal
}

impl ClipboardStore for MemoryStore {
    fn list(&self) -> AppResult<Vec<ClipboardItem>> {
        Ok(self.items.read().map_err(poisoned)?.clone())
    }

    fn get(&self, id: Uuid) -> AppResult<Option<ClipboardItem>> {
        let items = self.items.read().map_err(poisoned)?;
        Ok(items.iter().find(|i| i.id == id).cloned())
    }

    fn add(&self, item: ClipboardItem) -> AppResult<ClipboardItem> {
        let mut items = self.items.write().map_err(poisoned)?;
        items.insert(0, item.clone());
        if items.len() > self.max_items {
            let evicted = items.len() - self.max_items;
            items.truncate(self.max_items);
            tracing::debug!(evicted, "Clipboard store over capacity, dropped oldest items");
        }
        Ok(item)
    }

    fn update(
        &self,
        id: Uuid,
        change: &mut dyn FnMut(&mut ClipboardItem),
    ) -> AppResult<Option<ClipboardItem>> {
        let mut items = self.items.write().map_err(poisoned)?;
        Ok(items.iter_mut().find(|i| i.id == id).map(|item| {
            change(item);
            item.clone()
        }))
    }

    fn remove(&self, id: Uuid) -> AppResult<bool> {
        let mut items = self.items.write().map_err(poisoned)?;
        let before = items.len();
        items.retain(|i| i.id != id);
        Ok(items.len() != before)
    }
}

fn sample_items() -> Vec<ClipboardItem> {
    let now = Utc::now();
    let link = |content: &str, minutes: i64, tags: &[&str], favorite: bool, meta: [&str; 4]| {
        let mut item = ClipboardItem::new(
            content.to_string(),
            ItemKind::Link,
            tags.iter().map(|t| t.to_string()).collect(),
        );
        item.timestamp = now - Duration::minutes(minutes);
        item.favorite = favorite;
        item.title = Some(meta[0].to_string());
        item.domain = Some(meta[1].to_string());
        item.preview = Some(meta[2].to_string());
        item.color = Some(meta[3].to_string());
        item
    };

    let mut text = ClipboardItem::new(
        "This is a sample text that was copied to the clipboard. It contains multiple lines \
         and demonstrates how text content is displayed in the clipboard manager."
            .to_string(),
        ItemKind::Text,
        vec!["sample".into(), "text".into()],
    );
    text.timestamp = now - Duration::minutes(30);
    text.title = Some("Sample Text".into());

    vec![
        link(
            "https://nextjs.org/docs",
            5,
            &["framework", "react", "development"],
            true,
            [
                "Next.js Documentation",
                "nextjs.org",
                "Next.js - The React Framework for Production",
                "from-black to-gray-800",
            ],
        ),
        link(
            "https://pytorch.org",
            15,
            &["ai", "machine-learning", "python"],
            false,
            [
                "PyTorch",
                "pytorch.org",
                "PyTorch - An open source machine learning framework",
                "from-orange-500 to-red-600",
            ],
        ),
        text,
        link(
            "https://tensorflow.org",
            45,
            &["ai", "google", "framework"],
            true,
            [
                "TensorFlow",
                "tensorflow.org",
                "TensorFlow - An end-to-end open source machine learning platform",
                "from-orange-400 to-yellow-500",
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(content: &str) -> ClipboardItem {
        ClipboardItem::new(content.into(), ItemKind::Text, vec![])
    }

    #[test]
    fn add_puts_newest_first() {
        let store = MemoryStore::new(10);
        store.add(text("first")).unwrap();
        store.add(text("second")).unwrap();
        let items = store.list().unwrap();
        assert_eq!(items[0].content, "second");
        assert_eq!(items[1].content, "first");
    }

    #[test]
    fn add_evicts_oldest_beyond_capacity() {
        let store = MemoryStore::new(2);
        store.add(text("a")).unwrap();
        store.add(text("b")).unwrap();
        store.add(text("c")).unwrap();
        let contents: Vec<_> = store.list().unwrap().into_iter().map(|i| i.content).collect();
        assert_eq!(contents, vec!["c", "b"]);
    }

    #[test]
    fn update_applies_change_and_returns_copy() {
        let store = MemoryStore::new(10);
        let item = store.add(text("a")).unwrap();
        let updated = store
            .update(item.id, &mut |i: &mut ClipboardItem| i.favorite = true)
            .unwrap()
            .unwrap();
        assert!(updated.favorite);
        assert!(store.get(item.id).unwrap().unwrap().favorite);
    }

    #[test]
    fn update_missing_item_returns_none() {
        let store = MemoryStore::new(10);
        assert!(store.update(Uuid::new_v4(), &mut |_: &mut ClipboardItem| {}).unwrap().is_none());
    }

    #[test]
    fn remove_reports_whether_anything_was_deleted() {
        let store = MemoryStore::new(10);
        let item = store.add(text("a")).unwrap();
        assert!(store.remove(item.id).unwrap());
        assert!(!store.remove(item.id).unwrap());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn samples_are_seeded_newest_first() {
        let store = MemoryStore::with_samples(1000);
        let items = store.list().unwrap();
        assert_eq!(items.len(), 4);
        assert!(items.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
        assert_eq!(items[0].domain.as_deref(), Some("nextjs.org"));
    }
}
