use crate::hierarchy::bucket_key;
use crate::status::StatusTier;
use crate::types::{DefaulterItem, HierarchyLevel};

/// Monitoring-view filters. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaulterFilter {
    pub level: Option<HierarchyLevel>,
    pub statuses: Vec<StatusTier>,
    pub search: Option<String>,
    pub within: Option<(HierarchyLevel, String)>,
}

impl DefaulterFilter {
    pub fn is_empty(&self) -> bool {
        self.level.is_none()
            && self.statuses.is_empty()
            && self.search.as_deref().map_or(true, |s| s.trim().is_empty())
            && self.within.is_none()
    }

    pub fn matches(&self, item: &DefaulterItem) -> bool {
        if let Some(level) = self.level {
            if item.level != level {
                return false;
            }
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&item.status) {
            return false;
        }
        if let Some(needle) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let needle = needle.to_lowercase();
            if !item.name.to_lowercase().contains(&needle) && !item.id.to_lowercase().contains(&needle) {
                return false;
            }
        }
        if let Some((level, id)) = &self.within {
            match bucket_key(item, *level) {
                Some(node) if node.id == *id => {}
                _ => return false,
            }
        }
        true
    }

    pub fn apply(&self, items: &[DefaulterItem]) -> Vec<DefaulterItem> {
        items.iter().filter(|i| self.matches(i)).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HierarchyRefs, NodeRef};

    fn item(id: &str, name: &str, level: HierarchyLevel, status: StatusTier, group: Option<&str>) -> DefaulterItem {
        DefaulterItem {
            id: id.into(),
            name: name.into(),
            level,
            status,
            last_filled_week: Some(1),
            weeks_owed: 0,
            refs: HierarchyRefs {
                group: group.map(|g| NodeRef { id: g.into(), name: g.into() }),
                ..Default::default()
            },
        }
    }

    fn sample() -> Vec<DefaulterItem> {
        vec![
            item("d1", "Surulere", HierarchyLevel::District, StatusTier::Red, Some("g1")),
            item("d2", "Yaba", HierarchyLevel::District, StatusTier::Green, Some("g2")),
            item("g1", "Mainland", HierarchyLevel::Group, StatusTier::Orange, None),
            item("d3", "Ojuelegba", HierarchyLevel::District, StatusTier::Yellow, Some("g1")),
        ]
    }

    #[test]
    fn empty_filter_keeps_everything_in_order() {
        let f = DefaulterFilter::default();
        assert!(f.is_empty());
        let out = f.apply(&sample());
        let ids: Vec<&str> = out.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["d1", "d2", "g1", "d3"]);
    }

    #[test]
    fn filters_by_level_and_status() {
        let f = DefaulterFilter {
            level: Some(HierarchyLevel::District),
            statuses: vec![StatusTier::Red, StatusTier::Yellow],
            ..Default::default()
        };
        let ids: Vec<String> = f.apply(&sample()).into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["d1", "d3"]);
    }

    #[test]
    fn search_is_case_insensitive_on_name_or_id() {
        let f = DefaulterFilter {
            search: Some("YAB".into()),
            ..Default::default()
        };
        assert_eq!(f.apply(&sample()).len(), 1);
        let f = DefaulterFilter {
            search: Some("g1".into()),
            ..Default::default()
        };
        assert_eq!(f.apply(&sample())[0].name, "Mainland");
    }

    #[test]
    fn within_restricts_to_subtree_including_the_node_itself() {
        let f = DefaulterFilter {
            within: Some((HierarchyLevel::Group, "g1".into())),
            ..Default::default()
        };
        let ids: Vec<String> = f.apply(&sample()).into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["d1", "g1", "d3"]);
    }
}
