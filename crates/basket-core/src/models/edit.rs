//! Mutation primitives for list documents.
//!
//! Every successful mutation stamps the touched entities and the document with
//! the same clock value and marks the document dirty.

use std::collections::{HashMap, HashSet};

use super::{Category, CategoryId, Item, ItemId, ItemPatch, ListDocument, NewItem};
use crate::error::{Error, Result};
use crate::util::normalize_text_option;

impl ListDocument {
    /// Create a category (when `id` is `None`) or rename/reparent an existing one.
    ///
    /// New categories default to the root as parent and require a name.
    pub fn upsert_category(
        &mut self,
        id: Option<&CategoryId>,
        name: Option<&str>,
        parent_id: Option<&CategoryId>,
    ) -> Result<CategoryId> {
        let name = normalize_text_option(name.map(str::to_string));

        let Some(id) = id else {
            let name =
                name.ok_or_else(|| Error::InvalidInput("category name cannot be empty".into()))?;
            let parent_id = parent_id.cloned().unwrap_or_else(CategoryId::root);
            self.require_live_category(&parent_id)?;

            let stamp = self.touch();
            let category = Category::new(name, parent_id, stamp);
            let id = category.id.clone();
            self.categories.push(category);
            return Ok(id);
        };

        self.require_live_category(id)?;
        if let Some(parent_id) = parent_id {
            self.check_reparent(id, parent_id)?;
        }

        let stamp = self.touch();
        let category = self.live_category_mut(id)?;
        if let Some(name) = name {
            category.name = name;
        }
        if let Some(parent_id) = parent_id {
            category.parent_id = Some(parent_id.clone());
        }
        category.updated_at = stamp;
        Ok(id.clone())
    }

    /// Tombstone a category and all of its live descendants.
    ///
    /// Live items that pointed at any tombstoned category move to the root.
    /// Returns the number of categories tombstoned.
    pub fn delete_category(&mut self, id: &CategoryId) -> Result<usize> {
        if id.is_root() {
            return Err(Error::InvalidOperation(
                "the root category cannot be deleted".into(),
            ));
        }
        self.require_live_category(id)?;

        let mut doomed = HashSet::from([id.clone()]);
        let mut changed = true;
        while changed {
            changed = false;
            for category in self.categories.iter().filter(|c| !c.is_deleted()) {
                let Some(parent) = &category.parent_id else {
                    continue;
                };
                if doomed.contains(parent) && !doomed.contains(&category.id) {
                    doomed.insert(category.id.clone());
                    changed = true;
                }
            }
        }

        let stamp = self.touch();
        for category in &mut self.categories {
            if doomed.contains(&category.id) {
                category.tombstone(stamp);
            }
        }

        let root = CategoryId::root();
        for item in self.items.iter_mut().filter(|i| !i.is_deleted()) {
            if doomed.contains(&item.category_id) {
                item.category_id = root.clone();
                item.updated_at = stamp;
            }
        }

        tracing::debug!("Tombstoned {} categories under {}", doomed.len(), id);
        Ok(doomed.len())
    }

    /// Move a category under `new_parent_id` (the root when `None`).
    pub fn move_category(
        &mut self,
        id: &CategoryId,
        new_parent_id: Option<&CategoryId>,
    ) -> Result<()> {
        let new_parent_id = new_parent_id.cloned().unwrap_or_else(CategoryId::root);
        self.require_live_category(id)?;
        self.check_reparent(id, &new_parent_id)?;

        let stamp = self.touch();
        let category = self.live_category_mut(id)?;
        category.parent_id = Some(new_parent_id);
        category.updated_at = stamp;
        Ok(())
    }

    /// Add an item. Blank labels are ignored and yield `Ok(None)`.
    pub fn add_item(&mut self, new_item: NewItem) -> Result<Option<ItemId>> {
        let Some(label) = normalize_text_option(Some(new_item.label)) else {
            return Ok(None);
        };
        let category_id = new_item.category_id.unwrap_or_else(CategoryId::root);
        self.require_live_category(&category_id)?;

        let stamp = self.touch();
        let item = Item {
            id: ItemId::new(),
            label,
            quantity: normalize_text_option(new_item.quantity),
            unit: normalize_text_option(new_item.unit),
            category_id,
            checked: false,
            updated_at: stamp,
            deleted_at: None,
        };
        let id = item.id.clone();
        self.items.push(item);
        Ok(Some(id))
    }

    pub fn update_item(&mut self, id: &ItemId, patch: ItemPatch) -> Result<()> {
        self.require_live_item(id)?;
        let label = match patch.label {
            Some(label) => Some(
                normalize_text_option(Some(label))
                    .ok_or_else(|| Error::InvalidInput("item label cannot be empty".into()))?,
            ),
            None => None,
        };
        if let Some(category_id) = &patch.category_id {
            self.require_live_category(category_id)?;
        }

        let stamp = self.touch();
        let item = self.live_item_mut(id)?;
        if let Some(label) = label {
            item.label = label;
        }
        if let Some(quantity) = patch.quantity {
            item.quantity = normalize_text_option(quantity);
        }
        if let Some(unit) = patch.unit {
            item.unit = normalize_text_option(unit);
        }
        if let Some(category_id) = patch.category_id {
            item.category_id = category_id;
        }
        if let Some(checked) = patch.checked {
            item.checked = checked;
        }
        item.updated_at = stamp;
        Ok(())
    }

    pub fn delete_item(&mut self, id: &ItemId) -> Result<()> {
        self.require_live_item(id)?;
        let stamp = self.touch();
        self.live_item_mut(id)?.tombstone(stamp);
        Ok(())
    }

    /// Flip an item's checked flag and return the new value
    pub fn toggle_item_checked(&mut self, id: &ItemId) -> Result<bool> {
        self.require_live_item(id)?;
        let stamp = self.touch();
        let item = self.live_item_mut(id)?;
        item.checked = !item.checked;
        item.updated_at = stamp;
        Ok(item.checked)
    }

    /// Whether `candidate` sits at or below `ancestor` in the live tree.
    ///
    /// Walks `candidate`'s parent chain upward; the walk is bounded by the number
    /// of live categories so malformed (cyclic) data terminates.
    pub fn is_live_descendant(&self, candidate: &CategoryId, ancestor: &CategoryId) -> bool {
        let parents = self
            .live_categories()
            .map(|c| (&c.id, c.parent_id.as_ref()))
            .collect::<HashMap<_, _>>();

        let mut cursor = Some(candidate);
        let mut steps = 0usize;
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            if steps > parents.len() {
                break;
            }
            steps += 1;
            cursor = parents.get(current).copied().flatten();
        }
        false
    }

    fn check_reparent(&self, id: &CategoryId, new_parent_id: &CategoryId) -> Result<()> {
        if id.is_root() {
            return Err(Error::InvalidOperation(
                "the root category cannot be moved".into(),
            ));
        }
        if id == new_parent_id {
            return Err(Error::InvalidOperation(format!(
                "category {id} cannot be its own parent"
            )));
        }
        self.require_live_category(new_parent_id)?;
        if self.is_live_descendant(new_parent_id, id) {
            return Err(Error::InvalidOperation(format!(
                "moving category {id} under {new_parent_id} would create a cycle"
            )));
        }
        Ok(())
    }

    fn require_live_category(&self, id: &CategoryId) -> Result<()> {
        self.live_category(id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("category {id}")))
    }

    fn require_live_item(&self, id: &ItemId) -> Result<()> {
        self.live_item(id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("item {id}")))
    }

    fn live_category_mut(&mut self, id: &CategoryId) -> Result<&mut Category> {
        self.categories
            .iter_mut()
            .find(|c| &c.id == id && !c.is_deleted())
            .ok_or_else(|| Error::NotFound(format!("category {id}")))
    }

    fn live_item_mut(&mut self, id: &ItemId) -> Result<&mut Item> {
        self.items
            .iter_mut()
            .find(|i| &i.id == id && !i.is_deleted())
            .ok_or_else(|| Error::NotFound(format!("item {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chain(doc: &mut ListDocument, depth: usize) -> Vec<CategoryId> {
        let mut ids = Vec::new();
        let mut parent = CategoryId::root();
        for level in 0..depth {
            let id = doc
                .upsert_category(None, Some(&format!("level-{level}")), Some(&parent))
                .unwrap();
            parent = id.clone();
            ids.push(id);
        }
        ids
    }

    #[test]
    fn test_upsert_category_creates_under_root() {
        let mut doc = ListDocument::new("Weekly");
        let before = doc.updated_at;
        let id = doc.upsert_category(None, Some(" Produce "), None).unwrap();

        let category = doc.live_category(&id).unwrap();
        assert_eq!(category.name, "Produce");
        assert_eq!(category.parent_id, Some(CategoryId::root()));
        assert_eq!(category.updated_at, doc.updated_at);
        assert!(doc.updated_at > before);
    }

    #[test]
    fn test_upsert_category_requires_name_and_existing_target() {
        let mut doc = ListDocument::new("Weekly");
        assert!(matches!(
            doc.upsert_category(None, Some("  "), None),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            doc.upsert_category(Some(&CategoryId::from("missing")), Some("X"), None),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            doc.upsert_category(None, Some("X"), Some(&CategoryId::from("missing"))),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_upsert_category_renames_and_keeps_parent() {
        let mut doc = ListDocument::new("Weekly");
        let ids = chain(&mut doc, 2);
        doc.upsert_category(Some(&ids[1]), Some("Fruit"), None)
            .unwrap();

        let category = doc.live_category(&ids[1]).unwrap();
        assert_eq!(category.name, "Fruit");
        assert_eq!(category.parent_id.as_ref(), Some(&ids[0]));
    }

    #[test]
    fn test_upsert_root_can_be_renamed_but_not_reparented() {
        let mut doc = ListDocument::new("Weekly");
        let ids = chain(&mut doc, 1);
        doc.upsert_category(Some(&CategoryId::root()), Some("Everything"), None)
            .unwrap();
        assert_eq!(doc.live_category(&CategoryId::root()).unwrap().name, "Everything");
        assert!(matches!(
            doc.upsert_category(Some(&CategoryId::root()), None, Some(&ids[0])),
            Err(Error::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_delete_category_tombstones_subtree_and_rehomes_items() {
        let mut doc = ListDocument::new("Weekly");
        let ids = chain(&mut doc, 3);
        let sibling = doc.upsert_category(None, Some("Bakery"), None).unwrap();
        let deep = doc
            .add_item(NewItem::new("Kiwi").in_category(ids[2].clone()))
            .unwrap()
            .unwrap();
        let mid = doc
            .add_item(NewItem::new("Apple").in_category(ids[1].clone()))
            .unwrap()
            .unwrap();
        let bread = doc
            .add_item(NewItem::new("Bread").in_category(sibling.clone()))
            .unwrap()
            .unwrap();

        let removed = doc.delete_category(&ids[0]).unwrap();

        assert_eq!(removed, 3);
        for id in &ids {
            assert!(doc.category(id).unwrap().is_deleted());
        }
        assert!(doc.live_category(&sibling).is_some());
        assert!(doc.live_item(&deep).unwrap().category_id.is_root());
        assert!(doc.live_item(&mid).unwrap().category_id.is_root());
        assert_eq!(doc.live_item(&bread).unwrap().category_id, sibling);
        assert_eq!(doc.live_item(&deep).unwrap().updated_at, doc.updated_at);
    }

    #[test]
    fn test_delete_category_rejects_root_and_missing() {
        let mut doc = ListDocument::new("Weekly");
        assert!(matches!(
            doc.delete_category(&CategoryId::root()),
            Err(Error::InvalidOperation(_))
        ));
        assert!(matches!(
            doc.delete_category(&CategoryId::from("nope")),
            Err(Error::NotFound(_))
        ));

        let ids = chain(&mut doc, 1);
        doc.delete_category(&ids[0]).unwrap();
        assert!(matches!(
            doc.delete_category(&ids[0]),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_move_category_rejects_cycles_at_any_depth() {
        for depth in 2..6 {
            let mut doc = ListDocument::new("Weekly");
            let ids = chain(&mut doc, depth);
            let top = &ids[0];
            for descendant in &ids[1..] {
                assert!(
                    matches!(
                        doc.move_category(top, Some(descendant)),
                        Err(Error::InvalidOperation(_))
                    ),
                    "depth {depth}: moving under a descendant must fail"
                );
            }
            assert!(matches!(
                doc.move_category(top, Some(top)),
                Err(Error::InvalidOperation(_))
            ));
        }
    }

    #[test]
    fn test_move_category_allows_non_descendants() {
        let mut doc = ListDocument::new("Weekly");
        let ids = chain(&mut doc, 3);
        let other = doc.upsert_category(None, Some("Other"), None).unwrap();

        doc.move_category(&ids[2], Some(&ids[0])).unwrap();
        assert_eq!(doc.live_category(&ids[2]).unwrap().parent_id.as_ref(), Some(&ids[0]));

        doc.move_category(&ids[0], Some(&other)).unwrap();
        assert_eq!(doc.live_category(&ids[0]).unwrap().parent_id.as_ref(), Some(&other));

        doc.move_category(&ids[0], None).unwrap();
        assert_eq!(
            doc.live_category(&ids[0]).unwrap().parent_id,
            Some(CategoryId::root())
        );
    }

    #[test]
    fn test_move_root_fails() {
        let mut doc = ListDocument::new("Weekly");
        let ids = chain(&mut doc, 1);
        assert!(matches!(
            doc.move_category(&CategoryId::root(), Some(&ids[0])),
            Err(Error::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_is_live_descendant_terminates_on_cyclic_data() {
        let mut doc = ListDocument::new("Weekly");
        let ids = chain(&mut doc, 2);
        doc.categories
            .iter_mut()
            .find(|c| c.id == ids[0])
            .unwrap()
            .parent_id = Some(ids[1].clone());

        assert!(!doc.is_live_descendant(&ids[1], &CategoryId::root()));
    }

    #[test]
    fn test_add_item_blank_label_is_noop() {
        let mut doc = ListDocument::new("Weekly");
        doc.mark_clean();
        let before = doc.updated_at;

        assert_eq!(doc.add_item(NewItem::new("   ")).unwrap(), None);
        assert!(doc.items.is_empty());
        assert_eq!(doc.updated_at, before);
        assert!(!doc.dirty);
    }

    #[test]
    fn test_add_item_into_missing_category_fails() {
        let mut doc = ListDocument::new("Weekly");
        let result = doc.add_item(NewItem::new("Milk").in_category(CategoryId::from("gone")));
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_update_item_applies_patch() {
        let mut doc = ListDocument::new("Weekly");
        let id = doc
            .add_item(NewItem::new("Milk").with_quantity("1").with_unit("l"))
            .unwrap()
            .unwrap();
        let dairy = doc.upsert_category(None, Some("Dairy"), None).unwrap();

        doc.update_item(
            &id,
            ItemPatch {
                label: Some("Oat milk".into()),
                unit: Some(None),
                category_id: Some(dairy.clone()),
                ..ItemPatch::default()
            },
        )
        .unwrap();

        let item = doc.live_item(&id).unwrap();
        assert_eq!(item.label, "Oat milk");
        assert_eq!(item.quantity.as_deref(), Some("1"));
        assert_eq!(item.unit, None);
        assert_eq!(item.category_id, dairy);
        assert_eq!(item.updated_at, doc.updated_at);
    }

    #[test]
    fn test_update_item_rejects_blank_label() {
        let mut doc = ListDocument::new("Weekly");
        let id = doc.add_item(NewItem::new("Milk")).unwrap().unwrap();
        let patch = ItemPatch {
            label: Some(" ".into()),
            ..ItemPatch::default()
        };
        assert!(matches!(
            doc.update_item(&id, patch),
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(doc.live_item(&id).unwrap().label, "Milk");
    }

    #[test]
    fn test_delete_and_toggle_item() {
        let mut doc = ListDocument::new("Weekly");
        let id = doc.add_item(NewItem::new("Milk")).unwrap().unwrap();

        assert!(doc.toggle_item_checked(&id).unwrap());
        assert!(!doc.toggle_item_checked(&id).unwrap());

        doc.delete_item(&id).unwrap();
        let item = doc.item(&id).unwrap();
        assert_eq!(item.deleted_at, Some(doc.updated_at));
        assert_eq!(item.updated_at, doc.updated_at);

        assert!(matches!(doc.delete_item(&id), Err(Error::NotFound(_))));
        assert!(matches!(
            doc.toggle_item_checked(&id),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            doc.update_item(&ItemId::from("missing"), ItemPatch::default()),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_every_mutation_advances_document_clock() {
        let mut doc = ListDocument::new("Weekly");
        let mut last = doc.updated_at;
        let mut advanced = |doc: &ListDocument| {
            assert!(doc.updated_at > last);
            assert!(doc.dirty);
            last = doc.updated_at;
        };

        let category = doc.upsert_category(None, Some("Produce"), None).unwrap();
        advanced(&doc);
        let item = doc
            .add_item(NewItem::new("Kale").in_category(category.clone()))
            .unwrap()
            .unwrap();
        advanced(&doc);
        doc.toggle_item_checked(&item).unwrap();
        advanced(&doc);
        doc.move_category(&category, None).unwrap();
        advanced(&doc);
        doc.delete_category(&category).unwrap();
        advanced(&doc);
        doc.delete_item(&item).unwrap();
        advanced(&doc);
    }
}
