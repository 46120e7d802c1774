//! Bucketing of flat entity lists under one level of the hierarchy.
use crate::status::StatusCounts;
use crate::types::{AttendanceRecord, DefaulterItem, HierarchyLevel, HierarchyRefs, NodeRef};
use std::collections::HashMap;

pub const UNASSIGNED_NAME: &str = "Unassigned";

/// Anything that sits somewhere in the state → district tree.
pub trait HierarchyMember {
    /// The level the entity itself lives at, if it is a hierarchy node.
    fn level(&self) -> Option<HierarchyLevel>;
    fn own_ref(&self) -> Option<NodeRef>;
    fn refs(&self) -> &HierarchyRefs;
}

impl HierarchyMember for DefaulterItem {
    fn level(&self) -> Option<HierarchyLevel> {
        Some(self.level)
    }

    fn own_ref(&self) -> Option<NodeRef> {
        Some(NodeRef {
            id: self.id.clone(),
            name: self.name.clone(),
        })
    }

    fn refs(&self) -> &HierarchyRefs {
        &self.refs
    }
}

impl HierarchyMember for AttendanceRecord {
    fn level(&self) -> Option<HierarchyLevel> {
        None
    }

    fn own_ref(&self) -> Option<NodeRef> {
        None
    }

    fn refs(&self) -> &HierarchyRefs {
        &self.refs
    }
}

/// The node an item is filed under for `key`. An entity living at the key
/// level is its own bucket.
pub fn bucket_key<T: HierarchyMember>(item: &T, key: HierarchyLevel) -> Option<NodeRef> {
    if item.level() == Some(key) {
        return item.own_ref();
    }
    item.refs().at(key).cloned()
}

/// `key` is the node id, `None` for the unassigned bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket<T> {
    pub key: Option<String>,
    pub name: String,
    pub items: Vec<T>,
}

impl<T> Bucket<T> {
    pub fn is_unassigned(&self) -> bool {
        self.key.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DefaulterBucket {
    pub key: Option<String>,
    pub name: String,
    pub items: Vec<DefaulterItem>,
    pub counts: StatusCounts,
}

impl DefaulterBucket {
    pub fn is_unassigned(&self) -> bool {
        self.key.is_none()
    }
}

/// Groups `items` by the node at `key`. Buckets come back sorted by name
/// (case-insensitive, ties by id) with the unassigned bucket last.
pub fn group_by<T: HierarchyMember + Clone>(items: &[T], key: HierarchyLevel) -> Vec<Bucket<T>> {
    let mut map: HashMap<Option<String>, Bucket<T>> = HashMap::new();
    for item in items {
        let (id, name) = match bucket_key(item, key) {
            Some(node) => (Some(node.id), node.name),
            None => (None, UNASSIGNED_NAME.to_string()),
        };
        map.entry(id.clone())
            .or_insert_with(|| Bucket {
                key: id,
                name,
                items: Vec::new(),
            })
            .items
            .push(item.clone());
    }

    let mut buckets: Vec<Bucket<T>> = map.into_values().collect();
    buckets.sort_by(|a, b| {
        a.is_unassigned()
            .cmp(&b.is_unassigned())
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            .then_with(|| a.key.cmp(&b.key))
    });
    buckets
}

pub fn group_defaulters(items: &[DefaulterItem], key: HierarchyLevel) -> Vec<DefaulterBucket> {
    group_by(items, key)
        .into_iter()
        .map(|b| {
            let counts: StatusCounts = b.items.iter().map(|i| &i.status).collect();
            DefaulterBucket {
                key: b.key,
                name: b.name,
                items: b.items,
                counts,
            }
        })
        .collect()
}
