//! Hierarchy view over a list's flat, parented categories.
//!
//! The tree is an arena of nodes indexed from the root; tombstoned categories
//! and orphans (whose parent chain does not reach the root) are left out.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::models::{Category, CategoryId};

/// A node in a [`CategoryTree`]
#[derive(Debug, Clone)]
pub struct TreeNode<'a> {
    pub category: &'a Category,
    /// Indices of child nodes, in display order
    pub children: Vec<usize>,
}

/// Live categories reachable from the root
#[derive(Debug, Clone)]
pub struct CategoryTree<'a> {
    nodes: Vec<TreeNode<'a>>,
}

impl<'a> CategoryTree<'a> {
    const ROOT: usize = 0;

    pub fn root(&self) -> &'a Category {
        self.nodes[Self::ROOT].category
    }

    pub fn node(&self, index: usize) -> Option<&TreeNode<'a>> {
        self.nodes.get(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &CategoryId) -> bool {
        self.nodes.iter().any(|node| &node.category.id == id)
    }

    /// Pre-order `(category, depth)` walk; see [`flatten_tree`]
    pub fn walk(&self) -> TreeWalk<'_, 'a> {
        flatten_tree(self)
    }
}

/// Build the live category tree.
///
/// Returns `None` when no live parentless category exists. Children are ordered
/// by their `order` field (missing counts as 0), ties keep insertion order.
pub fn build_tree(categories: &[Category]) -> Option<CategoryTree<'_>> {
    let live = categories.iter().filter(|c| !c.is_deleted());

    let mut root = None;
    let mut by_parent: HashMap<&CategoryId, Vec<&Category>> = HashMap::new();
    for category in live {
        match &category.parent_id {
            Some(parent) => by_parent.entry(parent).or_default().push(category),
            None if root.is_none() || category.is_root() => root = Some(category),
            None => {}
        }
    }
    let root = root?;

    for children in by_parent.values_mut() {
        children.sort_by_key(|c| c.order.unwrap_or(0));
    }

    let mut nodes = vec![TreeNode {
        category: root,
        children: Vec::new(),
    }];
    let mut seen = HashSet::from([&root.id]);
    let mut queue = VecDeque::from([0usize]);

    while let Some(index) = queue.pop_front() {
        let parent: &Category = nodes[index].category;
        let Some(children) = by_parent.get(&parent.id) else {
            continue;
        };
        for &child in children {
            if !seen.insert(&child.id) {
                continue;
            }
            let child_index = nodes.len();
            nodes.push(TreeNode {
                category: child,
                children: Vec::new(),
            });
            nodes[index].children.push(child_index);
            queue.push_back(child_index);
        }
    }

    Some(CategoryTree { nodes })
}

/// Lazy pre-order walk over a tree yielding `(category, depth)`.
///
/// Cloning the walk (or calling [`flatten_tree`] again) restarts it.
pub fn flatten_tree<'t, 'a>(tree: &'t CategoryTree<'a>) -> TreeWalk<'t, 'a> {
    let stack = if tree.is_empty() {
        Vec::new()
    } else {
        vec![(CategoryTree::ROOT, 0)]
    };
    TreeWalk { tree, stack }
}

/// Iterator returned by [`flatten_tree`]
#[derive(Debug, Clone)]
pub struct TreeWalk<'t, 'a> {
    tree: &'t CategoryTree<'a>,
    stack: Vec<(usize, usize)>,
}

impl<'a> Iterator for TreeWalk<'_, 'a> {
    type Item = (&'a Category, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (index, depth) = self.stack.pop()?;
        let node = &self.tree.nodes[index];
        self.stack
            .extend(node.children.iter().rev().map(|&child| (child, depth + 1)));
        Some((node.category, depth))
    }
}

/// Live categories excluded from the tree because their ancestry is broken
pub fn orphaned_categories(categories: &[Category]) -> Vec<&Category> {
    let Some(tree) = build_tree(categories) else {
        return categories.iter().filter(|c| !c.is_deleted()).collect();
    };
    let reachable = tree.walk().map(|(c, _)| &c.id).collect::<HashSet<_>>();
    categories
        .iter()
        .filter(|c| !c.is_deleted() && !reachable.contains(&c.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn category(id: &str, name: &str, parent: Option<&str>) -> Category {
        Category {
            id: CategoryId::from(id),
            name: name.to_string(),
            parent_id: parent.map(CategoryId::from),
            order: None,
            updated_at: 1,
            deleted_at: None,
        }
    }

    fn names(tree: &CategoryTree<'_>) -> Vec<(String, usize)> {
        tree.walk()
            .map(|(c, depth)| (c.name.clone(), depth))
            .collect()
    }

    #[test]
    fn build_then_flatten_yields_preorder_with_depth() {
        let categories = vec![
            category("c_root", "root", None),
            category("produce", "Produce", Some("c_root")),
            category("fruit", "Fruit", Some("produce")),
        ];

        let tree = build_tree(&categories).unwrap();
        assert_eq!(
            names(&tree),
            vec![
                ("root".to_string(), 0),
                ("Produce".to_string(), 1),
                ("Fruit".to_string(), 2),
            ]
        );
    }

    #[test]
    fn walk_is_restartable() {
        let categories = vec![
            category("c_root", "root", None),
            category("a", "A", Some("c_root")),
        ];
        let tree = build_tree(&categories).unwrap();
        let walk = flatten_tree(&tree);
        let first = walk.clone().count();
        assert_eq!(first, 2);
        assert_eq!(walk.count(), 2);
        assert_eq!(tree.walk().count(), 2);
    }

    #[test]
    fn siblings_follow_order_then_insertion() {
        let mut b = category("b", "B", Some("c_root"));
        b.order = Some(2);
        let mut c = category("c", "C", Some("c_root"));
        c.order = Some(1);
        let categories = vec![
            category("c_root", "root", None),
            b,
            c,
            category("d", "D", Some("c_root")),
            category("e", "E", Some("c_root")),
            category("b1", "B1", Some("b")),
        ];

        let tree = build_tree(&categories).unwrap();
        assert_eq!(
            names(&tree),
            vec![
                ("root".to_string(), 0),
                ("D".to_string(), 1),
                ("E".to_string(), 1),
                ("C".to_string(), 1),
                ("B".to_string(), 1),
                ("B1".to_string(), 2),
            ]
        );
    }

    #[test]
    fn tombstoned_and_orphaned_categories_are_excluded() {
        let mut dead = category("dead", "Dead", Some("c_root"));
        dead.deleted_at = Some(5);
        let categories = vec![
            category("c_root", "root", None),
            dead,
            category("orphan", "Orphan", Some("dead")),
            category("lost", "Lost", Some("missing")),
            category("kept", "Kept", Some("c_root")),
        ];

        let tree = build_tree(&categories).unwrap();
        assert_eq!(tree.len(), 2);
        assert!(tree.contains(&CategoryId::from("kept")));
        assert!(!tree.contains(&CategoryId::from("orphan")));

        let orphans = orphaned_categories(&categories)
            .into_iter()
            .map(|c| c.id.to_string())
            .collect::<Vec<_>>();
        assert_eq!(orphans, vec!["orphan".to_string(), "lost".to_string()]);
    }

    #[test]
    fn missing_root_yields_none() {
        let mut root = category("c_root", "root", None);
        root.deleted_at = Some(1);
        assert!(build_tree(&[root]).is_none());
        assert!(build_tree(&[]).is_none());
    }

    #[test]
    fn deep_chains_do_not_recurse() {
        let mut categories = vec![category("c_root", "root", None)];
        let mut parent = "c_root".to_string();
        for level in 0..5_000 {
            let id = format!("n{level}");
            categories.push(category(&id, &id, Some(&parent)));
            parent = id;
        }

        let tree = build_tree(&categories).unwrap();
        let (last, depth) = tree.walk().last().unwrap();
        assert_eq!(depth, 5_000);
        assert_eq!(last.name, "n4999");
    }
}
