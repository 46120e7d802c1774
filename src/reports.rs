use crate::hierarchy::{Bucket, DefaulterBucket};
use crate::status::{ReportWeek, StatusCounts, StatusTier};
use crate::types::{
    AttendanceRecord, AttendanceSummaryRow, BucketSummaryRow, DefaulterDetailRow, DefaulterItem,
    HierarchyLevel, ReminderRow, SummaryStats,
};
use crate::util::format_number;
use std::cmp::Ordering;

pub fn defaulter_summary_rows(buckets: &[DefaulterBucket]) -> Vec<BucketSummaryRow> {
    buckets
        .iter()
        .map(|b| BucketSummaryRow {
            name: b.name.clone(),
            total: b.items.len(),
            red: b.counts.red,
            orange: b.counts.orange,
            yellow: b.counts.yellow,
            green: b.counts.green,
            compliance_pct: format_number(b.counts.compliance_rate(), 2),
        })
        .collect()
}

/// Most severe first, then most weeks owed, then name.
fn severity_order(a: &DefaulterItem, b: &DefaulterItem) -> Ordering {
    a.status
        .cmp(&b.status)
        .then_with(|| b.weeks_owed.cmp(&a.weeks_owed))
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.id.cmp(&b.id))
}

pub fn sorted_by_severity(items: &[DefaulterItem]) -> Vec<DefaulterItem> {
    let mut sorted = items.to_vec();
    sorted.sort_by(severity_order);
    sorted
}

pub fn defaulter_detail_rows(items: &[DefaulterItem]) -> Vec<DefaulterDetailRow> {
    sorted_by_severity(items)
        .into_iter()
        .map(|i| DefaulterDetailRow {
            level: i.level.label().to_string(),
            status: i.status.label().to_string(),
            last_filled_week: i
                .last_filled_week
                .map(|w| w.to_string())
                .unwrap_or_else(|| "-".to_string()),
            weeks_owed: i.weeks_owed,
            state: i.refs.name_at(HierarchyLevel::State),
            region: i.refs.name_at(HierarchyLevel::Region),
            old_group: i.refs.name_at(HierarchyLevel::OldGroup),
            group: i.refs.name_at(HierarchyLevel::Group),
            name: i.name,
        })
        .collect()
}

pub fn attendance_summary_rows(buckets: &[Bucket<AttendanceRecord>]) -> Vec<AttendanceSummaryRow> {
    buckets
        .iter()
        .map(|b| {
            let mut row = AttendanceSummaryRow {
                name: b.name.clone(),
                records: b.items.len(),
                men: 0,
                women: 0,
                youth: 0,
                children: 0,
                total: 0,
                avg_per_record: String::new(),
            };
            for r in &b.items {
                row.men = row.men.saturating_add(r.men);
                row.women = row.women.saturating_add(r.women);
                row.youth = row.youth.saturating_add(r.youth());
                row.children = row.children.saturating_add(r.children());
                row.total = row.total.saturating_add(r.total());
            }
            let avg = if row.records == 0 {
                0.0
            } else {
                row.total as f64 / row.records as f64
            };
            row.avg_per_record = format_number(avg, 2);
            row
        })
        .collect()
}

pub fn reminder_message(item: &DefaulterItem) -> String {
    match item.last_filled_week {
        None => format!(
            "{} ({}) has not submitted any attendance record.",
            item.name, item.level
        ),
        Some(last) => format!(
            "{} ({}) owes {} week{} of attendance; last filled week {}.",
            item.name,
            item.level,
            item.weeks_owed,
            if item.weeks_owed == 1 { "" } else { "s" },
            last
        ),
    }
}

/// One reminder for every entity that is not up to date, most severe first.
pub fn reminders(items: &[DefaulterItem]) -> Vec<ReminderRow> {
    sorted_by_severity(items)
        .into_iter()
        .filter(|i| i.status != StatusTier::Green)
        .map(|i| ReminderRow {
            message: reminder_message(&i),
            recipient: i.name,
            recipient_id: i.id,
            level: i.level.label().to_string(),
            status: i.status.label().to_string(),
        })
        .collect()
}

pub fn generate_summary(
    items: &[DefaulterItem],
    records: &[AttendanceRecord],
    buckets: &[DefaulterBucket],
    week: ReportWeek,
    grouped_by: HierarchyLevel,
) -> SummaryStats {
    let counts: StatusCounts = items.iter().map(|i| &i.status).collect();
    SummaryStats {
        current_week: week.week,
        grouped_by,
        total_entities: items.len(),
        red: counts.red,
        orange: counts.orange,
        yellow: counts.yellow,
        green: counts.green,
        compliance_rate: counts.compliance_rate(),
        total_buckets: buckets.len(),
        attendance_records: records.len(),
        attendance_total: records.iter().fold(0u64, |acc, r| acc.saturating_add(r.total())),
    }
}
