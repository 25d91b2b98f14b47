//! In-memory clipboard history
//!
//! [`ClipboardStore`] owns the ordered item collection (newest first), the
//! user-defined categories and the active selection. It performs no I/O;
//! every mutating method reports whether persisted state changed so the
//! caller knows when to save.

use crate::item::{ClipboardItem, ItemId, DEFAULT_CATEGORY};
use std::collections::BTreeSet;

/// Pseudo category matching every item
pub const ALL_CATEGORY: &str = "All";

/// Pseudo category matching favorited items
pub const FAVORITES_CATEGORY: &str = "Favorites";

/// Active category filter and search text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub category: String,
    pub search: String,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            category: ALL_CATEGORY.to_string(),
            search: String::new(),
        }
    }
}

/// Outcome of [`ClipboardStore::remove_category`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryRemoval {
    /// The name was in the user-category list
    pub unlisted: bool,
    /// Number of items moved back to the default category
    pub reassigned: usize,
}

/// Result of resolving a (possibly abbreviated) item id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdLookup {
    Found(ItemId),
    NotFound,
    Ambiguous(usize),
}

/// Ordered, deduplicated clipboard history
#[derive(Debug, Clone, Default)]
pub struct ClipboardStore {
    items: Vec<ClipboardItem>,
    user_categories: Vec<String>,
    selection: Selection,
}

impl ClipboardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from persisted state
    pub fn from_parts(items: Vec<ClipboardItem>, mut user_categories: Vec<String>) -> Self {
        user_categories.retain(|c| !c.trim().is_empty());
        user_categories.sort();
        user_categories.dedup();
        Self {
            items,
            user_categories,
            selection: Selection::default(),
        }
    }

    /// All items, newest first
    pub fn items(&self) -> &[ClipboardItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Most recently inserted item
    pub fn head(&self) -> Option<&ClipboardItem> {
        self.items.first()
    }

    pub fn get(&self, id: ItemId) -> Option<&ClipboardItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    fn get_mut(&mut self, id: ItemId) -> Option<&mut ClipboardItem> {
        self.items.iter_mut().find(|item| item.id() == id)
    }

    /// Prepends `item` unless the head already carries the same payload
    ///
    /// Returns `true` if the item was inserted.
    pub fn ingest(&mut self, item: ClipboardItem) -> bool {
        if let Some(head) = self.head() {
            if head.same_payload(&item) {
                return false;
            }
        }
        self.items.insert(0, item);
        true
    }

    /// Flips the favorite flag; returns the new value or `None` if absent
    pub fn toggle_favorite(&mut self, id: ItemId) -> Option<bool> {
        self.get_mut(id).map(ClipboardItem::toggle_favorite)
    }

    /// Removes an item; returns it if it was present
    pub fn delete(&mut self, id: ItemId) -> Option<ClipboardItem> {
        let index = self.items.iter().position(|item| item.id() == id)?;
        Some(self.items.remove(index))
    }

    /// Moves an item to another category (blank names mean the default)
    pub fn recategorize(&mut self, id: ItemId, category: &str) -> bool {
        match self.get_mut(id) {
            Some(item) => {
                item.set_category(category);
                true
            }
            None => false,
        }
    }

    /// Replaces an item's content and recomputes its preview
    pub fn edit(&mut self, id: ItemId, content: &str) -> bool {
        match self.get_mut(id) {
            Some(item) => {
                item.update_content(content.to_string());
                true
            }
            None => false,
        }
    }

    /// Empties the collection and returns what was removed
    pub fn clear_all(&mut self) -> Vec<ClipboardItem> {
        std::mem::take(&mut self.items)
    }

    /// Removes every item matching `predicate` and returns them
    pub(crate) fn remove_where<F>(&mut self, mut predicate: F) -> Vec<ClipboardItem>
    where
        F: FnMut(&ClipboardItem) -> bool,
    {
        let (removed, kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.items).into_iter().partition(|item| predicate(item));
        self.items = kept;
        removed
    }

    /// User-defined categories, sorted
    pub fn user_categories(&self) -> &[String] {
        &self.user_categories
    }

    /// Adds a user-defined category
    ///
    /// Blank names, the reserved `All`, `General` and `Favorites` names, and
    /// names already in the list are ignored. Returns `true` if the list changed.
    pub fn add_category(&mut self, name: &str) -> bool {
        let trimmed = name.trim();
        if trimmed.is_empty()
            || trimmed == ALL_CATEGORY
            || trimmed == DEFAULT_CATEGORY
            || trimmed == FAVORITES_CATEGORY
            || self.user_categories.iter().any(|c| c == trimmed)
        {
            return false;
        }

        self.user_categories.push(trimmed.to_string());
        self.user_categories.sort();

        if self.selection.category != ALL_CATEGORY
            && !self.categories().contains(&self.selection.category)
        {
            self.selection.category = ALL_CATEGORY.to_string();
        }
        true
    }

    /// Removes a user-defined category and reassigns its members
    pub fn remove_category(&mut self, name: &str) -> CategoryRemoval {
        let before = self.user_categories.len();
        self.user_categories.retain(|c| c != name);
        let unlisted = self.user_categories.len() != before;

        let mut reassigned = 0;
        for item in self.items.iter_mut().filter(|item| item.category() == name) {
            item.set_category(DEFAULT_CATEGORY);
            reassigned += 1;
        }

        if self.selection.category == name {
            self.selection.category = ALL_CATEGORY.to_string();
        }

        CategoryRemoval {
            unlisted,
            reassigned,
        }
    }

    /// Categories offered to consumers
    ///
    /// `All` first, then the sorted union of `Favorites`, `General`, the
    /// user-defined categories and every category present in the history.
    pub fn categories(&self) -> Vec<String> {
        let mut set: BTreeSet<&str> = BTreeSet::new();
        set.insert(DEFAULT_CATEGORY);
        set.insert(FAVORITES_CATEGORY);
        set.extend(self.user_categories.iter().map(String::as_str));
        set.extend(self.items.iter().map(ClipboardItem::category));
        set.remove(ALL_CATEGORY);

        std::iter::once(ALL_CATEGORY)
            .chain(set)
            .map(str::to_string)
            .collect()
    }

    /// Items matching a category filter AND a search text
    ///
    /// `All` disables the category filter and `Favorites` selects favorited
    /// items. An empty search text matches everything.
    pub fn view(&self, category: &str, search: &str) -> Vec<&ClipboardItem> {
        let needle = search.to_lowercase();
        self.items
            .iter()
            .filter(|item| match category {
                ALL_CATEGORY => true,
                FAVORITES_CATEGORY => item.is_favorite(),
                other => item.category() == other,
            })
            .filter(|item| needle.is_empty() || item.matches_search(&needle))
            .collect()
    }

    /// Favorited items, newest first
    pub fn favorite_items(&self) -> Vec<&ClipboardItem> {
        self.items.iter().filter(|item| item.is_favorite()).collect()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn set_category_filter(&mut self, category: &str) {
        self.selection.category = category.to_string();
    }

    pub fn set_search_text(&mut self, search: &str) {
        self.selection.search = search.to_string();
    }

    /// [`Self::view`] over the active selection
    pub fn filtered_items(&self) -> Vec<&ClipboardItem> {
        self.view(&self.selection.category, &self.selection.search)
    }

    /// Resolves a full id or a unique id prefix
    pub fn resolve_id(&self, prefix: &str) -> IdLookup {
        let needle = prefix.trim().to_lowercase();
        if needle.is_empty() {
            return IdLookup::NotFound;
        }
        let matches: Vec<ItemId> = self
            .items
            .iter()
            .map(ClipboardItem::id)
            .filter(|id| id.to_string().starts_with(&needle))
            .collect();
        match matches.as_slice() {
            [] => IdLookup::NotFound,
            [id] => IdLookup::Found(*id),
            many => IdLookup::Ambiguous(many.len()),
        }
    }

    /// Whether any item still references the given image blob
    pub fn references_blob(&self, path: &std::path::Path) -> bool {
        self.items
            .iter()
            .any(|item| item.content().image_path() == Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ItemContent, ItemKind};
    use uuid::Uuid;

    fn text(s: &str) -> ClipboardItem {
        ClipboardItem::new(ItemContent::Text(s.to_string()), None)
    }

    fn contents(items: &[&ClipboardItem]) -> Vec<String> {
        items.iter().map(|i| i.content().as_str().into_owned()).collect()
    }

    #[test]
    fn test_ingest_prepends() {
        let mut store = ClipboardStore::new();
        assert!(store.ingest(text("A")));
        assert!(store.ingest(text("B")));
        assert!(store.ingest(text("C")));
        assert_eq!(contents(&store.view(ALL_CATEGORY, "")), vec!["C", "B", "A"]);
    }

    #[test]
    fn test_ingest_suppresses_adjacent_duplicate() {
        let mut store = ClipboardStore::new();
        assert!(store.ingest(text("same")));
        assert!(!store.ingest(text("same")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_ingest_same_content_different_kind_is_kept() {
        let mut store = ClipboardStore::new();
        store.ingest(text("/tmp/x"));
        store.ingest(ClipboardItem::new(ItemContent::FilePaths("/tmp/x".into()), None));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_ingest_allows_non_adjacent_repeat() {
        let mut store = ClipboardStore::new();
        store.ingest(text("A"));
        store.ingest(text("B"));
        assert!(store.ingest(text("A")));
        assert_eq!(contents(&store.view(ALL_CATEGORY, "")), vec!["A", "B", "A"]);
    }

    #[test]
    fn test_toggle_favorite() {
        let mut store = ClipboardStore::new();
        let item = text("fav");
        let id = item.id();
        store.ingest(item);

        assert_eq!(store.toggle_favorite(id), Some(true));
        assert_eq!(store.favorite_items().len(), 1);
        assert_eq!(store.toggle_favorite(id), Some(false));
        assert!(store.favorite_items().is_empty());
    }

    #[test]
    fn test_operations_on_missing_id_are_noops() {
        let mut store = ClipboardStore::new();
        store.ingest(text("keep"));
        let missing = Uuid::new_v4();

        assert_eq!(store.toggle_favorite(missing), None);
        assert!(store.delete(missing).is_none());
        assert!(!store.recategorize(missing, "Work"));
        assert!(!store.edit(missing, "x"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_delete() {
        let mut store = ClipboardStore::new();
        let item = text("gone");
        let id = item.id();
        store.ingest(item);
        store.ingest(text("stay"));

        let removed = store.delete(id).unwrap();
        assert_eq!(removed.id(), id);
        assert_eq!(store.len(), 1);
        assert!(store.get(id).is_none());
    }

    #[test]
    fn test_edit_recomputes_preview() {
        let mut store = ClipboardStore::new();
        let item = text("short");
        let id = item.id();
        store.ingest(item);

        let long = "x".repeat(150);
        assert!(store.edit(id, &long));
        let item = store.get(id).unwrap();
        assert_eq!(item.content().as_str(), long);
        assert_eq!(item.preview(), "x".repeat(100));
        assert_eq!(item.kind(), ItemKind::Text);
    }

    #[test]
    fn test_clear_all() {
        let mut store = ClipboardStore::new();
        store.ingest(text("a"));
        store.ingest(text("b"));
        assert_eq!(store.clear_all().len(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_category_rules() {
        let mut store = ClipboardStore::new();
        assert!(store.add_category("  Work "));
        assert!(!store.add_category("Work"));
        assert!(!store.add_category(""));
        assert!(!store.add_category("   "));
        assert!(!store.add_category("All"));
        assert!(!store.add_category("General"));
        assert!(!store.add_category("Favorites"));
        assert!(store.add_category("Archive"));
        assert_eq!(store.user_categories(), &["Archive", "Work"]);
    }

    #[test]
    fn test_category_round_trip() {
        let mut store = ClipboardStore::new();
        let item = text("task");
        let id = item.id();
        store.ingest(item);

        store.add_category("Work");
        assert!(store.recategorize(id, "Work"));
        assert_eq!(store.get(id).unwrap().category(), "Work");

        let removal = store.remove_category("Work");
        assert!(removal.unlisted);
        assert_eq!(removal.reassigned, 1);
        assert_eq!(store.get(id).unwrap().category(), DEFAULT_CATEGORY);
        assert!(!store.categories().contains(&"Work".to_string()));
    }

    #[test]
    fn test_remove_category_resets_selection() {
        let mut store = ClipboardStore::new();
        store.add_category("Work");
        store.set_category_filter("Work");
        store.remove_category("Work");
        assert_eq!(store.selection().category, ALL_CATEGORY);
    }

    #[test]
    fn test_remove_category_keeps_other_selection() {
        let mut store = ClipboardStore::new();
        store.add_category("Work");
        store.add_category("Home");
        store.set_category_filter("Home");
        store.remove_category("Work");
        assert_eq!(store.selection().category, "Home");
    }

    #[test]
    fn test_favorites_is_not_a_user_category() {
        let mut store = ClipboardStore::new();
        assert!(!store.add_category(" Favorites "));
        assert!(store.user_categories().is_empty());
        assert_eq!(
            store.categories().iter().filter(|c| *c == FAVORITES_CATEGORY).count(),
            1
        );
    }

    #[test]
    fn test_add_category_resets_unknown_selection() {
        let mut store = ClipboardStore::new();
        store.set_category_filter("Vanished");
        store.add_category("Work");
        assert_eq!(store.selection().category, ALL_CATEGORY);
    }

    #[test]
    fn test_categories_union() {
        let mut store = ClipboardStore::new();
        assert_eq!(store.categories(), vec!["All", "Favorites", "General"]);

        store.add_category("Work");
        store.ingest(text("x").with_category("Recipes"));
        assert_eq!(
            store.categories(),
            vec!["All", "Favorites", "General", "Recipes", "Work"]
        );
    }

    #[test]
    fn test_recategorize_blank_means_default() {
        let mut store = ClipboardStore::new();
        let item = text("x").with_category("Work");
        let id = item.id();
        store.ingest(item);
        store.recategorize(id, " ");
        assert_eq!(store.get(id).unwrap().category(), DEFAULT_CATEGORY);
    }

    #[test]
    fn test_view_search_and_category_intersect() {
        let mut store = ClipboardStore::new();
        store.ingest(text("abcdef"));
        store.ingest(text("abc").with_category("Work"));

        let view = store.view("Work", "abc");
        assert_eq!(contents(&view), vec!["abc"]);

        let view = store.view(ALL_CATEGORY, "ABC");
        assert_eq!(view.len(), 2);

        let view = store.view(DEFAULT_CATEGORY, "xyz");
        assert!(view.is_empty());
    }

    #[test]
    fn test_view_favorites() {
        let mut store = ClipboardStore::new();
        let fav = text("fav");
        let fav_id = fav.id();
        store.ingest(fav);
        store.ingest(text("plain"));
        store.toggle_favorite(fav_id);

        let view = store.view(FAVORITES_CATEGORY, "");
        assert_eq!(contents(&view), vec!["fav"]);
    }

    #[test]
    fn test_filtered_items_uses_selection() {
        let mut store = ClipboardStore::new();
        store.ingest(text("alpha").with_category("Work"));
        store.ingest(text("beta").with_category("Work"));
        store.ingest(text("alphabet"));

        store.set_category_filter("Work");
        store.set_search_text("alp");
        assert_eq!(contents(&store.filtered_items()), vec!["alpha"]);
    }

    #[test]
    fn test_from_parts_normalizes_categories() {
        let store = ClipboardStore::from_parts(
            vec![],
            vec!["Work".into(), " ".into(), "Archive".into(), "Work".into()],
        );
        assert_eq!(store.user_categories(), &["Archive", "Work"]);
    }

    #[test]
    fn test_resolve_id_prefix() {
        let mut store = ClipboardStore::new();
        let item = text("x");
        let id = item.id();
        store.ingest(item);

        assert_eq!(store.resolve_id(&id.to_string()), IdLookup::Found(id));
        assert_eq!(store.resolve_id(&id.to_string()[..8]), IdLookup::Found(id));
        assert_eq!(store.resolve_id(""), IdLookup::NotFound);
        assert_eq!(store.resolve_id("zzzz"), IdLookup::NotFound);
    }

    #[test]
    fn test_resolve_id_ambiguous() {
        let mut store = ClipboardStore::new();
        for i in 0..40 {
            store.ingest(text(&i.to_string()));
        }
        let first = store.items()[0].id().to_string();
        let shared = &first[..1];
        let count = store
            .items()
            .iter()
            .filter(|i| i.id().to_string().starts_with(shared))
            .count();
        match store.resolve_id(shared) {
            IdLookup::Found(_) => assert_eq!(count, 1),
            IdLookup::Ambiguous(n) => assert_eq!(n, count),
            IdLookup::NotFound => panic!("prefix of an existing id must resolve"),
        }
    }

    #[test]
    fn test_references_blob() {
        let mut store = ClipboardStore::new();
        let path = std::path::PathBuf::from("/img/a.png");
        store.ingest(ClipboardItem::new(ItemContent::ImageRef(path.clone()), None));
        assert!(store.references_blob(&path));
        assert!(!store.references_blob(std::path::Path::new("/img/b.png")));
    }
}
