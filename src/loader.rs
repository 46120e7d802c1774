use crate::error::{ReportError, Result};
use crate::status::{ReportWeek, StatusTier};
use crate::types::{
    AttendanceRecord, DefaulterItem, HierarchyLevel, HierarchyRefs, NodeRef, RawAttendanceRow,
    RawDefaulterRow,
};
use crate::util::{clean_text, parse_count, parse_i32_safe, parse_u32_safe};
use csv::ReaderBuilder;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
    pub derived_statuses: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputFormat {
    Csv,
    Json,
}

fn input_format(path: &str) -> Result<InputFormat> {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("csv") => Ok(InputFormat::Csv),
        Some("json") => Ok(InputFormat::Json),
        _ => Err(ReportError::UnsupportedFormat {
            path: path.to_string(),
        }),
    }
}

/// Read the rows of a CSV file, counting undecodable rows as errors.
fn read_csv_rows<T: serde::de::DeserializeOwned>(path: &str) -> Result<(Vec<T>, usize)> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    let mut rows = Vec::new();
    let mut errors = 0usize;
    for result in rdr.deserialize::<T>() {
        match result {
            Ok(r) => rows.push(r),
            Err(e) => {
                debug!(error = %e, "skipping undecodable CSV row");
                errors += 1;
            }
        }
    }
    Ok((rows, errors))
}

/// Read a JSON export: either a bare array or the API envelope `{ "data": [...] }`.
/// Entries that are not objects count as errors.
fn read_json_objects(path: &str) -> Result<(Vec<Map<String, Value>>, usize)> {
    let text = std::fs::read_to_string(path).map_err(|e| ReportError::io(path, e))?;
    let value: Value = serde_json::from_str(&text)?;
    let entries = match value {
        Value::Array(a) => a,
        Value::Object(mut o) => match o.remove("data") {
            Some(Value::Array(a)) => a,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    let mut objects = Vec::with_capacity(entries.len());
    let mut errors = 0usize;
    for entry in entries {
        match entry {
            Value::Object(o) => objects.push(o),
            _ => errors += 1,
        }
    }
    Ok((objects, errors))
}

fn build_refs(
    state: (Option<String>, Option<String>),
    region: (Option<String>, Option<String>),
    old_group: (Option<String>, Option<String>),
    group: (Option<String>, Option<String>),
    district: (Option<String>, Option<String>),
) -> HierarchyRefs {
    HierarchyRefs {
        state: NodeRef::from_parts(state.0, state.1),
        region: NodeRef::from_parts(region.0, region.1),
        old_group: NodeRef::from_parts(old_group.0, old_group.1),
        group: NodeRef::from_parts(group.0, group.1),
        district: NodeRef::from_parts(district.0, district.1),
    }
}

/// Turn one raw defaulter row into an item. Returns `None` when the row lacks
/// an id, a name or a recognised level. The flag reports whether the status
/// had to be derived locally.
pub fn clean_defaulter(row: RawDefaulterRow, week: ReportWeek) -> Option<(DefaulterItem, bool)> {
    let id = clean_text(row.id.as_deref())?;
    let name = clean_text(row.name.as_deref())?;
    let level: HierarchyLevel = clean_text(row.level.as_deref())?.parse().ok()?;

    // A week outside the ISO range is treated as no submission on record.
    let last_filled_week =
        parse_u32_safe(row.last_filled_week.as_deref()).filter(|w| (1..=53).contains(w));
    let derived_owed = week.weeks_owed(last_filled_week);
    let weeks_owed = derived_owed
        .or_else(|| parse_u32_safe(row.weeks_owed.as_deref()))
        .unwrap_or(0);

    // The backend's status is authoritative; only fill it in when it is absent.
    let backend_status = clean_text(row.status.as_deref()).and_then(|s| s.parse::<StatusTier>().ok());
    let derived = backend_status.is_none();
    let status = backend_status.unwrap_or_else(|| StatusTier::classify(derived_owed));

    let refs = build_refs(
        (row.state_id, row.state_name),
        (row.region_id, row.region_name),
        (row.old_group_id, row.old_group_name),
        (row.group_id, row.group_name),
        (None, None),
    );

    Some((
        DefaulterItem {
            id,
            name,
            level,
            status,
            last_filled_week,
            weeks_owed,
            refs,
        },
        derived,
    ))
}

pub fn load_defaulters(path: &str, week: ReportWeek) -> Result<(Vec<DefaulterItem>, LoadReport)> {
    let (rows, decode_errors): (Vec<RawDefaulterRow>, usize) = match input_format(path)? {
        InputFormat::Csv => read_csv_rows(path)?,
        InputFormat::Json => {
            let (objs, errors) = read_json_objects(path)?;
            (objs.iter().map(RawDefaulterRow::from_json).collect(), errors)
        }
    };

    let mut report = LoadReport {
        total_rows: rows.len() + decode_errors,
        parse_errors: decode_errors,
        ..Default::default()
    };
    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        match clean_defaulter(row, week) {
            Some((item, derived)) => {
                if derived {
                    report.derived_statuses += 1;
                }
                items.push(item);
            }
            None => report.parse_errors += 1,
        }
    }
    report.loaded_rows = items.len();

    if report.parse_errors > 0 {
        warn!(path, skipped = report.parse_errors, "defaulter rows skipped");
    }
    info!(
        path,
        total = report.total_rows,
        loaded = report.loaded_rows,
        derived = report.derived_statuses,
        "loaded defaulters"
    );
    Ok((items, report))
}

/// Turn one raw attendance row into a record. Rows without a district id or
/// with a week outside 1..=53 are rejected, as are malformed head counts.
pub fn clean_attendance(row: RawAttendanceRow, index: usize) -> std::result::Result<AttendanceRecord, String> {
    let week = parse_u32_safe(row.week.as_deref())
        .filter(|w| (1..=53).contains(w))
        .ok_or_else(|| format!("invalid week {:?}", row.week))?;
    let refs = build_refs(
        (row.state_id, row.state_name),
        (row.region_id, row.region_name),
        (row.old_group_id, row.old_group_name),
        (row.group_id, row.group_name),
        (row.district_id, row.district_name),
    );
    if refs.district.is_none() {
        return Err("missing district id".to_string());
    }
    Ok(AttendanceRecord {
        id: clean_text(row.id.as_deref()).unwrap_or_else(|| format!("row-{}", index + 1)),
        year: parse_i32_safe(row.year.as_deref()),
        month: parse_u32_safe(row.month.as_deref()).filter(|m| (1..=12).contains(m)),
        week,
        refs,
        men: parse_count(row.men.as_deref())?,
        women: parse_count(row.women.as_deref())?,
        youth_boys: parse_count(row.youth_boys.as_deref())?,
        youth_girls: parse_count(row.youth_girls.as_deref())?,
        children_boys: parse_count(row.children_boys.as_deref())?,
        children_girls: parse_count(row.children_girls.as_deref())?,
    })
}

pub fn load_attendance(path: &str) -> Result<(Vec<AttendanceRecord>, LoadReport)> {
    let (rows, decode_errors): (Vec<RawAttendanceRow>, usize) = match input_format(path)? {
        InputFormat::Csv => read_csv_rows(path)?,
        InputFormat::Json => {
            let (objs, errors) = read_json_objects(path)?;
            (objs.iter().map(RawAttendanceRow::from_json).collect(), errors)
        }
    };

    let mut report = LoadReport {
        total_rows: rows.len() + decode_errors,
        parse_errors: decode_errors,
        ..Default::default()
    };
    let mut records = Vec::with_capacity(rows.len());
    for (idx, row) in rows.into_iter().enumerate() {
        match clean_attendance(row, idx) {
            Ok(r) => records.push(r),
            Err(reason) => {
                debug!(row = idx + 1, %reason, "skipping attendance row");
                report.parse_errors += 1;
            }
        }
    }
    report.loaded_rows = records.len();

    if report.parse_errors > 0 {
        warn!(path, skipped = report.parse_errors, "attendance rows skipped");
    }
    info!(path, total = report.total_rows, loaded = report.loaded_rows, "loaded attendance records");
    Ok((records, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str, name: &str, level: &str) -> RawDefaulterRow {
        RawDefaulterRow {
            id: Some(id.into()),
            name: Some(name.into()),
            level: Some(level.into()),
            ..Default::default()
        }
    }

    const WEEK: ReportWeek = ReportWeek { year: 2024, week: 10 };

    #[test]
    fn rejects_rows_without_identity_or_level() {
        assert!(clean_defaulter(raw("", "X", "district"), WEEK).is_none());
        assert!(clean_defaulter(raw("1", " ", "district"), WEEK).is_none());
        assert!(clean_defaulter(raw("1", "X", "parish"), WEEK).is_none());
    }

    #[test]
    fn derives_status_and_weeks_when_backend_omits_them() {
        let mut row = raw("1", "Ikeja", "district");
        row.last_filled_week = Some("8".into());
        let (item, derived) = clean_defaulter(row, WEEK).unwrap();
        assert!(derived);
        assert_eq!(item.weeks_owed, 2);
        assert_eq!(item.status, StatusTier::Orange);

        let (never, _) = clean_defaulter(raw("2", "Epe", "district"), WEEK).unwrap();
        assert_eq!(never.status, StatusTier::Red);
        assert_eq!(never.last_filled_week, None);
    }

    #[test]
    fn impossible_last_week_counts_as_never_submitted() {
        for bad in ["54", "100", "0"] {
            let mut row = raw("1", "Ikeja", "district");
            row.last_filled_week = Some(bad.into());
            let (item, derived) = clean_defaulter(row, WEEK).unwrap();
            assert!(derived);
            assert_eq!(item.last_filled_week, None, "week {}", bad);
            assert_eq!(item.status, StatusTier::Red, "week {}", bad);
            assert_eq!(item.weeks_owed, 0);
        }
    }

    #[test]
    fn backend_status_wins_but_weeks_are_rederived() {
        let mut row = raw("1", "Ikeja", "district");
        row.status = Some("Yellow".into());
        row.last_filled_week = Some("7".into());
        row.weeks_owed = Some("1".into());
        let (item, derived) = clean_defaulter(row, WEEK).unwrap();
        assert!(!derived);
        assert_eq!(item.status, StatusTier::Yellow);
        assert_eq!(item.weeks_owed, 3);
    }

    #[test]
    fn keeps_backend_weeks_when_no_last_week_known() {
        let mut row = raw("1", "Ikeja", "group");
        row.status = Some("red".into());
        row.weeks_owed = Some("5".into());
        let (item, _) = clean_defaulter(row, WEEK).unwrap();
        assert_eq!(item.weeks_owed, 5);
        assert_eq!(item.level, HierarchyLevel::Group);
    }

    #[test]
    fn attendance_requires_district_and_valid_week() {
        let base = || RawAttendanceRow {
            district_id: Some("d1".into()),
            week: Some("5".into()),
            men: Some("10".into()),
            ..Default::default()
        };
        let ok = clean_attendance(base(), 0).unwrap();
        assert_eq!(ok.id, "row-1");
        assert_eq!(ok.total(), 10);
        assert_eq!(ok.refs.district.as_ref().unwrap().name, "d1");

        let mut no_district = base();
        no_district.district_id = None;
        assert!(clean_attendance(no_district, 0).is_err());

        let mut bad_week = base();
        bad_week.week = Some("54".into());
        assert!(clean_attendance(bad_week, 0).is_err());

        let mut bad_count = base();
        bad_count.women = Some("-2".into());
        assert!(clean_attendance(bad_count, 0).is_err());
    }

    #[test]
    fn oversized_head_counts_are_rejected() {
        let row = RawAttendanceRow {
            district_id: Some("d1".into()),
            week: Some("5".into()),
            men: Some(u64::MAX.to_string()),
            women: Some("1".into()),
            ..Default::default()
        };
        let err = clean_attendance(row, 0).unwrap_err();
        assert!(err.contains("exceeds"), "{}", err);
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let err = load_defaulters("defaulters.xlsx", WEEK).unwrap_err();
        assert!(matches!(err, ReportError::UnsupportedFormat { .. }));
    }
}
