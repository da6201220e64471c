use std::collections::{BTreeMap, HashMap, HashSet};

use super::domain::{Category, CategoryId};

/// In-memory view of the self-referencing category table.
///
/// Deleted categories are kept addressable by id but never count as children, so a parent
/// whose only children were soft-deleted is a leaf again.
#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    nodes: HashMap<CategoryId, Category>,
    children: HashMap<Option<CategoryId>, Vec<CategoryId>>,
}

impl CategoryTree {
    pub fn new(categories: impl IntoIterator<Item = Category>) -> Self {
        let mut nodes = HashMap::new();
        let mut children: HashMap<Option<CategoryId>, Vec<(String, CategoryId)>> = HashMap::new();

        for category in categories {
            if !category.status.is_deleted() {
                children
                    .entry(category.parent_id)
                    .or_default()
                    .push((category.name.clone(), category.id));
            }
            nodes.insert(category.id, category);
        }

        let children = children
            .into_iter()
            .map(|(parent, mut entries)| {
                entries.sort();
                (parent, entries.into_iter().map(|(_, id)| id).collect())
            })
            .collect();

        Self { nodes, children }
    }

    /// Tree restricted to categories a seller can currently see.
    pub fn visible(categories: impl IntoIterator<Item = Category>) -> Self {
        Self::new(
            categories
                .into_iter()
                .filter(|category| category.status.is_visible()),
        )
    }

    pub fn get(&self, id: &CategoryId) -> Option<&Category> {
        self.nodes.get(id)
    }

    pub fn children_of(&self, parent: Option<CategoryId>) -> impl Iterator<Item = &Category> {
        self.children
            .get(&parent)
            .into_iter()
            .flatten()
            .filter_map(|id| self.nodes.get(id))
    }

    pub fn is_leaf(&self, id: &CategoryId) -> bool {
        self.children
            .get(&Some(*id))
            .map_or(true, |children| children.is_empty())
    }

    /// True when `candidate` is `ancestor` itself or sits anywhere below it.
    pub fn is_within(&self, candidate: &CategoryId, ancestor: &CategoryId) -> bool {
        let mut seen = HashSet::new();
        let mut cursor = Some(*candidate);
        while let Some(current) = cursor {
            if current == *ancestor {
                return true;
            }
            if !seen.insert(current) {
                return false;
            }
            cursor = self.nodes.get(&current).and_then(|node| node.parent_id);
        }
        false
    }

    /// Root-to-leaf name paths, ordered by name at every level.
    pub fn leaf_paths(&self) -> Vec<Vec<&Category>> {
        let mut paths = Vec::new();
        let mut trail = Vec::new();
        let mut visiting = HashSet::new();
        self.collect_leaf_paths(None, &mut trail, &mut visiting, &mut paths);
        paths
    }

    fn collect_leaf_paths<'a>(
        &'a self,
        parent: Option<CategoryId>,
        trail: &mut Vec<&'a Category>,
        visiting: &mut HashSet<CategoryId>,
        paths: &mut Vec<Vec<&'a Category>>,
    ) {
        let mut children = self.children_of(parent).peekable();
        if children.peek().is_none() {
            if !trail.is_empty() {
                paths.push(trail.clone());
            }
            return;
        }

        for child in children {
            if !visiting.insert(child.id) {
                continue;
            }
            trail.push(child);
            self.collect_leaf_paths(Some(child.id), trail, visiting, paths);
            trail.pop();
            visiting.remove(&child.id);
        }
    }

    /// Maps a root-first list of names onto ids. Any unknown segment yields an empty path.
    pub fn resolve_path(&self, names: &[String]) -> Vec<CategoryId> {
        let mut by_parent_and_name: BTreeMap<(Option<CategoryId>, &str), CategoryId> =
            BTreeMap::new();
        for (parent, ids) in &self.children {
            for id in ids {
                if let Some(node) = self.nodes.get(id) {
                    by_parent_and_name.insert((*parent, node.name.as_str()), *id);
                }
            }
        }

        let mut resolved = Vec::with_capacity(names.len());
        let mut parent = None;
        for name in names {
            match by_parent_and_name.get(&(parent, name.trim())) {
                Some(id) => {
                    resolved.push(*id);
                    parent = Some(*id);
                }
                None => return Vec::new(),
            }
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::domain::{CategoryStatus, PublicationFee};
    use chrono::Utc;

    fn category(name: &str, parent: Option<CategoryId>) -> Category {
        Category {
            id: CategoryId::new(),
            name: name.to_string(),
            icon_name: None,
            parent_id: parent,
            status: CategoryStatus::Active,
            is_free: false,
            publication_fee: PublicationFee::Free,
            default_period_id: None,
        }
    }

    fn sample() -> (Vec<Category>, CategoryId, CategoryId, CategoryId) {
        let root = category("Elektronika", None);
        let phones = category("Telefony", Some(root.id));
        let laptops = category("Laptopy", Some(root.id));
        let (root_id, phones_id, laptops_id) = (root.id, phones.id, laptops.id);
        (vec![root, phones, laptops], root_id, phones_id, laptops_id)
    }

    #[test]
    fn parents_are_not_leaves_until_children_are_deleted() {
        let (mut categories, root, phones, laptops) = sample();
        let tree = CategoryTree::new(categories.clone());
        assert!(!tree.is_leaf(&root));
        assert!(tree.is_leaf(&phones));

        for category in categories.iter_mut().filter(|c| c.id != root) {
            category.status = CategoryStatus::Deleted {
                deleted_at: Utc::now(),
            };
        }
        let tree = CategoryTree::new(categories);
        assert!(tree.is_leaf(&root));
        assert!(tree.get(&laptops).is_some());
    }

    #[test]
    fn leaf_paths_are_sorted_by_name() {
        let (categories, ..) = sample();
        let tree = CategoryTree::visible(categories);
        let rendered: Vec<String> = tree
            .leaf_paths()
            .into_iter()
            .map(|path| {
                path.iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(" > ")
            })
            .collect();
        assert_eq!(
            rendered,
            vec!["Elektronika > Laptopy", "Elektronika > Telefony"]
        );
    }

    #[test]
    fn hidden_children_make_visible_parent_a_leaf_path() {
        let (mut categories, ..) = sample();
        for category in categories.iter_mut().skip(1) {
            category.status = CategoryStatus::Hidden;
        }
        let tree = CategoryTree::visible(categories);
        let paths = tree.leaf_paths();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0][0].name, "Elektronika");
    }

    #[test]
    fn resolve_path_requires_every_segment() {
        let (categories, root, phones, _) = sample();
        let tree = CategoryTree::new(categories);
        let names = vec!["Elektronika".to_string(), "Telefony".to_string()];
        assert_eq!(tree.resolve_path(&names), vec![root, phones]);

        let unknown = vec!["Elektronika".to_string(), "Tablety".to_string()];
        assert!(tree.resolve_path(&unknown).is_empty());
        assert!(tree.resolve_path(&[]).is_empty());
    }

    #[test]
    fn is_within_walks_the_parent_chain() {
        let (categories, root, phones, laptops) = sample();
        let tree = CategoryTree::new(categories);
        assert!(tree.is_within(&phones, &root));
        assert!(tree.is_within(&root, &root));
        assert!(!tree.is_within(&root, &phones));
        assert!(!tree.is_within(&laptops, &phones));
    }
}
