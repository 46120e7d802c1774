use crate::status::StatusTier;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;

/// Organizational level, ordered from the top of the tree down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HierarchyLevel {
    State,
    Region,
    OldGroup,
    Group,
    District,
}

impl HierarchyLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            HierarchyLevel::State => "state",
            HierarchyLevel::Region => "region",
            HierarchyLevel::OldGroup => "old_group",
            HierarchyLevel::Group => "group",
            HierarchyLevel::District => "district",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HierarchyLevel::State => "State",
            HierarchyLevel::Region => "Region",
            HierarchyLevel::OldGroup => "Old Group",
            HierarchyLevel::Group => "Group",
            HierarchyLevel::District => "District",
        }
    }
}

impl fmt::Display for HierarchyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for HierarchyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect();
        match norm.as_str() {
            "state" => Ok(HierarchyLevel::State),
            "region" => Ok(HierarchyLevel::Region),
            "oldgroup" => Ok(HierarchyLevel::OldGroup),
            "group" => Ok(HierarchyLevel::Group),
            "district" => Ok(HierarchyLevel::District),
            _ => Err(format!("unknown hierarchy level '{}'", s.trim())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeRef {
    pub id: String,
    pub name: String,
}

impl NodeRef {
    /// Builds a reference from loose id/name columns. No id means no reference;
    /// a blank name falls back to the id.
    pub fn from_parts(id: Option<String>, name: Option<String>) -> Option<NodeRef> {
        let id = id.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())?;
        let name = name
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| id.clone());
        Some(NodeRef { id, name })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HierarchyRefs {
    pub state: Option<NodeRef>,
    pub region: Option<NodeRef>,
    pub old_group: Option<NodeRef>,
    pub group: Option<NodeRef>,
    pub district: Option<NodeRef>,
}

impl HierarchyRefs {
    pub fn at(&self, level: HierarchyLevel) -> Option<&NodeRef> {
        match level {
            HierarchyLevel::State => self.state.as_ref(),
            HierarchyLevel::Region => self.region.as_ref(),
            HierarchyLevel::OldGroup => self.old_group.as_ref(),
            HierarchyLevel::Group => self.group.as_ref(),
            HierarchyLevel::District => self.district.as_ref(),
        }
    }

    pub fn name_at(&self, level: HierarchyLevel) -> String {
        self.at(level).map(|r| r.name.clone()).unwrap_or_default()
    }
}

/// Raw defaulter row as exported by the monitoring endpoint. Everything is
/// optional text so that cleaning can decide what to keep.
#[derive(Debug, Default, Deserialize)]
pub struct RawDefaulterRow {
    #[serde(rename = "id")]
    pub id: Option<String>,
    #[serde(rename = "name")]
    pub name: Option<String>,
    #[serde(rename = "level")]
    pub level: Option<String>,
    #[serde(rename = "status")]
    pub status: Option<String>,
    #[serde(rename = "lastFilledWeek")]
    pub last_filled_week: Option<String>,
    #[serde(rename = "weeksOwed")]
    pub weeks_owed: Option<String>,
    #[serde(rename = "stateId")]
    pub state_id: Option<String>,
    #[serde(rename = "stateName")]
    pub state_name: Option<String>,
    #[serde(rename = "regionId")]
    pub region_id: Option<String>,
    #[serde(rename = "regionName")]
    pub region_name: Option<String>,
    #[serde(rename = "oldGroupId")]
    pub old_group_id: Option<String>,
    #[serde(rename = "oldGroupName")]
    pub old_group_name: Option<String>,
    #[serde(rename = "groupId")]
    pub group_id: Option<String>,
    #[serde(rename = "groupName")]
    pub group_name: Option<String>,
}

impl RawDefaulterRow {
    pub fn from_json(obj: &Map<String, Value>) -> Self {
        RawDefaulterRow {
            id: json_text(obj, "id"),
            name: json_text(obj, "name"),
            level: json_text(obj, "level"),
            status: json_text(obj, "status"),
            last_filled_week: json_text(obj, "lastFilledWeek"),
            weeks_owed: json_text(obj, "weeksOwed"),
            state_id: json_text(obj, "stateId"),
            state_name: json_text(obj, "stateName"),
            region_id: json_text(obj, "regionId"),
            region_name: json_text(obj, "regionName"),
            old_group_id: json_text(obj, "oldGroupId"),
            old_group_name: json_text(obj, "oldGroupName"),
            group_id: json_text(obj, "groupId"),
            group_name: json_text(obj, "groupName"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RawAttendanceRow {
    #[serde(rename = "id")]
    pub id: Option<String>,
    #[serde(rename = "year")]
    pub year: Option<String>,
    #[serde(rename = "month")]
    pub month: Option<String>,
    #[serde(rename = "week")]
    pub week: Option<String>,
    #[serde(rename = "districtId")]
    pub district_id: Option<String>,
    #[serde(rename = "districtName")]
    pub district_name: Option<String>,
    #[serde(rename = "groupId")]
    pub group_id: Option<String>,
    #[serde(rename = "groupName")]
    pub group_name: Option<String>,
    #[serde(rename = "oldGroupId")]
    pub old_group_id: Option<String>,
    #[serde(rename = "oldGroupName")]
    pub old_group_name: Option<String>,
    #[serde(rename = "regionId")]
    pub region_id: Option<String>,
    #[serde(rename = "regionName")]
    pub region_name: Option<String>,
    #[serde(rename = "stateId")]
    pub state_id: Option<String>,
    #[serde(rename = "stateName")]
    pub state_name: Option<String>,
    #[serde(rename = "men")]
    pub men: Option<String>,
    #[serde(rename = "women")]
    pub women: Option<String>,
    #[serde(rename = "youthBoys")]
    pub youth_boys: Option<String>,
    #[serde(rename = "youthGirls")]
    pub youth_girls: Option<String>,
    #[serde(rename = "childrenBoys")]
    pub children_boys: Option<String>,
    #[serde(rename = "childrenGirls")]
    pub children_girls: Option<String>,
}

impl RawAttendanceRow {
    pub fn from_json(obj: &Map<String, Value>) -> Self {
        RawAttendanceRow {
            id: json_text(obj, "id"),
            year: json_text(obj, "year"),
            month: json_text(obj, "month"),
            week: json_text(obj, "week"),
            district_id: json_text(obj, "districtId"),
            district_name: json_text(obj, "districtName"),
            group_id: json_text(obj, "groupId"),
            group_name: json_text(obj, "groupName"),
            old_group_id: json_text(obj, "oldGroupId"),
            old_group_name: json_text(obj, "oldGroupName"),
            region_id: json_text(obj, "regionId"),
            region_name: json_text(obj, "regionName"),
            state_id: json_text(obj, "stateId"),
            state_name: json_text(obj, "stateName"),
            men: json_text(obj, "men"),
            women: json_text(obj, "women"),
            youth_boys: json_text(obj, "youthBoys"),
            youth_girls: json_text(obj, "youthGirls"),
            children_boys: json_text(obj, "childrenBoys"),
            children_girls: json_text(obj, "childrenGirls"),
        }
    }
}

// The API sends ids as numbers or strings depending on the endpoint.
fn json_text(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefaulterItem {
    pub id: String,
    pub name: String,
    pub level: HierarchyLevel,
    pub status: StatusTier,
    pub last_filled_week: Option<u32>,
    pub weeks_owed: u32,
    pub refs: HierarchyRefs,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceRecord {
    pub id: String,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub week: u32,
    pub refs: HierarchyRefs,
    pub men: u64,
    pub women: u64,
    pub youth_boys: u64,
    pub youth_girls: u64,
    pub children_boys: u64,
    pub children_girls: u64,
}

// Sums saturate rather than wrap.
impl AttendanceRecord {
    pub fn youth(&self) -> u64 {
        self.youth_boys.saturating_add(self.youth_girls)
    }

    pub fn children(&self) -> u64 {
        self.children_boys.saturating_add(self.children_girls)
    }

    pub fn total(&self) -> u64 {
        self.men
            .saturating_add(self.women)
            .saturating_add(self.youth())
            .saturating_add(self.children())
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct BucketSummaryRow {
    #[serde(rename = "Name")]
    #[tabled(rename = "Name")]
    pub name: String,
    #[serde(rename = "Total")]
    #[tabled(rename = "Total")]
    pub total: usize,
    #[serde(rename = "Red")]
    #[tabled(rename = "Red")]
    pub red: usize,
    #[serde(rename = "Orange")]
    #[tabled(rename = "Orange")]
    pub orange: usize,
    #[serde(rename = "Yellow")]
    #[tabled(rename = "Yellow")]
    pub yellow: usize,
    #[serde(rename = "Green")]
    #[tabled(rename = "Green")]
    pub green: usize,
    #[serde(rename = "CompliancePct")]
    #[tabled(rename = "CompliancePct")]
    pub compliance_pct: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct DefaulterDetailRow {
    #[serde(rename = "Name")]
    #[tabled(rename = "Name")]
    pub name: String,
    #[serde(rename = "Level")]
    #[tabled(rename = "Level")]
    pub level: String,
    #[serde(rename = "Status")]
    #[tabled(rename = "Status")]
    pub status: String,
    #[serde(rename = "LastFilledWeek")]
    #[tabled(rename = "LastFilledWeek")]
    pub last_filled_week: String,
    #[serde(rename = "WeeksOwed")]
    #[tabled(rename = "WeeksOwed")]
    pub weeks_owed: u32,
    #[serde(rename = "State")]
    #[tabled(rename = "State")]
    pub state: String,
    #[serde(rename = "Region")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "OldGroup")]
    #[tabled(rename = "OldGroup")]
    pub old_group: String,
    #[serde(rename = "Group")]
    #[tabled(rename = "Group")]
    pub group: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct AttendanceSummaryRow {
    #[serde(rename = "Name")]
    #[tabled(rename = "Name")]
    pub name: String,
    #[serde(rename = "Records")]
    #[tabled(rename = "Records")]
    pub records: usize,
    #[serde(rename = "Men")]
    #[tabled(rename = "Men")]
    pub men: u64,
    #[serde(rename = "Women")]
    #[tabled(rename = "Women")]
    pub women: u64,
    #[serde(rename = "Youth")]
    #[tabled(rename = "Youth")]
    pub youth: u64,
    #[serde(rename = "Children")]
    #[tabled(rename = "Children")]
    pub children: u64,
    #[serde(rename = "Total")]
    #[tabled(rename = "Total")]
    pub total: u64,
    #[serde(rename = "AvgPerRecord")]
    #[tabled(rename = "AvgPerRecord")]
    pub avg_per_record: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ReminderRow {
    #[serde(rename = "Recipient")]
    #[tabled(rename = "Recipient")]
    pub recipient: String,
    #[serde(rename = "RecipientId")]
    #[tabled(rename = "RecipientId")]
    pub recipient_id: String,
    #[serde(rename = "Level")]
    #[tabled(rename = "Level")]
    pub level: String,
    #[serde(rename = "Status")]
    #[tabled(rename = "Status")]
    pub status: String,
    #[serde(rename = "Message")]
    #[tabled(rename = "Message")]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub current_week: u32,
    pub grouped_by: HierarchyLevel,
    pub total_entities: usize,
    pub red: usize,
    pub orange: usize,
    pub yellow: usize,
    pub green: usize,
    pub compliance_rate: f64,
    pub total_buckets: usize,
    pub attendance_records: usize,
    pub attendance_total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn level_parses_loose_spellings() {
        assert_eq!("old_group".parse::<HierarchyLevel>(), Ok(HierarchyLevel::OldGroup));
        assert_eq!("Old Group".parse::<HierarchyLevel>(), Ok(HierarchyLevel::OldGroup));
        assert_eq!("old-group".parse::<HierarchyLevel>(), Ok(HierarchyLevel::OldGroup));
        assert_eq!(" DISTRICT ".parse::<HierarchyLevel>(), Ok(HierarchyLevel::District));
        assert!("zone".parse::<HierarchyLevel>().is_err());
    }

    #[test]
    fn levels_are_ordered_top_down() {
        assert!(HierarchyLevel::State < HierarchyLevel::Region);
        assert!(HierarchyLevel::Group < HierarchyLevel::District);
    }

    #[test]
    fn node_ref_requires_id_and_falls_back_to_it_for_name() {
        assert_eq!(NodeRef::from_parts(None, Some("Lagos".into())), None);
        assert_eq!(NodeRef::from_parts(Some("  ".into()), Some("Lagos".into())), None);
        let r = NodeRef::from_parts(Some("7".into()), Some(" ".into())).unwrap();
        assert_eq!(r.name, "7");
    }

    #[test]
    fn raw_row_from_json_stringifies_numbers() {
        let v = json!({"id": 12, "name": "Ikeja", "lastFilledWeek": 4, "stateName": null});
        let row = RawDefaulterRow::from_json(v.as_object().unwrap());
        assert_eq!(row.id.as_deref(), Some("12"));
        assert_eq!(row.last_filled_week.as_deref(), Some("4"));
        assert_eq!(row.state_name, None);
    }

    #[test]
    fn attendance_total_sums_all_counts() {
        let r = AttendanceRecord {
            id: "a".into(),
            year: Some(2024),
            month: Some(3),
            week: 10,
            refs: HierarchyRefs::default(),
            men: 10,
            women: 12,
            youth_boys: 3,
            youth_girls: 4,
            children_boys: 5,
            children_girls: 6,
        };
        assert_eq!(r.youth(), 7);
        assert_eq!(r.children(), 11);
        assert_eq!(r.total(), 40);
    }

    #[test]
    fn attendance_total_saturates_instead_of_wrapping() {
        let r = AttendanceRecord {
            id: "a".into(),
            year: None,
            month: None,
            week: 1,
            refs: HierarchyRefs::default(),
            men: u64::MAX,
            women: 1,
            youth_boys: u64::MAX,
            youth_girls: 2,
            children_boys: 0,
            children_girls: 0,
        };
        assert_eq!(r.youth(), u64::MAX);
        assert_eq!(r.total(), u64::MAX);
    }
}
