//! Collection helpers used by the editor and the tree builder

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Convert a Vec into a HashMap keyed by `key_fn`. Later items win on duplicate keys.
///
/// # Example
/// ```ignore
/// let assigned = vec_to_map(rows, |r| r.right_id);
/// ```
#[inline]
pub fn vec_to_map<T, K, F>(items: Vec<T>, key_fn: F) -> HashMap<K, T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    items.into_iter().map(|item| (key_fn(&item), item)).collect()
}

/// Group items by key while keeping the order in which keys were first seen.
///
/// # Example
/// ```ignore
/// let by_module = group_ordered(rights, |r| r.module.clone());
/// // [("Billing", [...]), ("Jobs", [...])]
/// ```
pub fn group_ordered<T, K, F>(items: impl IntoIterator<Item = T>, key_fn: F) -> Vec<(K, Vec<T>)>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<T>)> = Vec::new();
    for item in items {
        let key = key_fn(&item);
        match index.get(&key) {
            Some(&pos) => groups[pos].1.push(item),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, vec![item]));
            },
        }
    }
    groups
}

/// Deduplicate while preserving order
///
/// # Example
/// ```ignore
/// let ids = vec![1, 2, 1, 3, 2];
/// let unique = unique_ordered(ids); // [1, 2, 3]
/// ```
#[inline]
pub fn unique_ordered<T: Eq + Hash + Clone>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
