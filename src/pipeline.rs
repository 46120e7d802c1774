//! End-to-end report generation: filter, group, build rows, write files.
use crate::config::AppConfig;
use crate::error::{ReportError, Result};
use crate::hierarchy::{group_by, group_defaulters};
use crate::html::{render_defaulters_html, HtmlReport};
use crate::output::{write_csv, write_json, write_text, write_tsv};
use crate::reports::{
    attendance_summary_rows, defaulter_detail_rows, defaulter_summary_rows, generate_summary,
    reminders,
};
use crate::status::ReportWeek;
use crate::types::{
    AttendanceRecord, AttendanceSummaryRow, BucketSummaryRow, DefaulterDetailRow, DefaulterItem,
    ReminderRow, SummaryStats,
};
use std::path::PathBuf;
use tracing::info;

pub const SUMMARY_CSV: &str = "report1_defaulters_summary.csv";
pub const DETAIL_CSV: &str = "report2_defaulters_detail.csv";
pub const ATTENDANCE_CSV: &str = "report3_attendance_summary.csv";
pub const REMINDERS_CSV: &str = "reminders.csv";
pub const CLIPBOARD_TSV: &str = "defaulters_clipboard.tsv";
pub const HTML_REPORT: &str = "defaulters_report.html";
pub const SUMMARY_JSON: &str = "summary.json";

#[derive(Debug)]
pub struct ReportBundle {
    pub week: ReportWeek,
    pub summary_rows: Vec<BucketSummaryRow>,
    pub detail_rows: Vec<DefaulterDetailRow>,
    pub attendance_rows: Vec<AttendanceSummaryRow>,
    pub reminders: Vec<ReminderRow>,
    pub summary: SummaryStats,
    pub files: Vec<PathBuf>,
}

/// Unwraps session data, failing with [`ReportError::NoData`] when `what`
/// has not been loaded yet.
pub fn require_loaded<T>(data: Option<T>, what: &'static str) -> Result<T> {
    data.ok_or(ReportError::NoData(what))
}

/// Builds every report from the loaded data and writes them under the
/// configured output directory. The attendance report is only written when
/// records are present.
pub fn generate_reports(
    cfg: &AppConfig,
    week: ReportWeek,
    defaulters: &[DefaulterItem],
    records: &[AttendanceRecord],
    generated_at: &str,
) -> Result<ReportBundle> {
    let filter = cfg.filter()?;
    let items = filter.apply(defaulters);
    info!(
        total = defaulters.len(),
        selected = items.len(),
        grouped_by = cfg.group_by.as_str(),
        "generating reports"
    );

    let buckets = group_defaulters(&items, cfg.group_by);
    let summary_rows = defaulter_summary_rows(&buckets);
    let detail_rows = defaulter_detail_rows(&items);
    let reminder_rows = reminders(&items);
    let summary = generate_summary(&items, records, &buckets, week, cfg.group_by);

    let mut files = Vec::new();

    let path = cfg.output_path(SUMMARY_CSV);
    write_csv(&path, &summary_rows)?;
    files.push(path);

    let path = cfg.output_path(DETAIL_CSV);
    write_csv(&path, &detail_rows)?;
    files.push(path);

    let path = cfg.output_path(CLIPBOARD_TSV);
    write_tsv(&path, &detail_rows)?;
    files.push(path);

    let path = cfg.output_path(REMINDERS_CSV);
    write_csv(&path, &reminder_rows)?;
    files.push(path);

    let attendance_rows = if records.is_empty() {
        Vec::new()
    } else {
        let rows = attendance_summary_rows(&group_by(records, cfg.group_by));
        let path = cfg.output_path(ATTENDANCE_CSV);
        write_csv(&path, &rows)?;
        files.push(path);
        rows
    };

    let html = render_defaulters_html(&HtmlReport {
        title: &cfg.title,
        generated_at,
        week,
        grouped_by: cfg.group_by,
        buckets: &buckets,
    });
    let path = cfg.output_path(HTML_REPORT);
    write_text(&path, &html)?;
    files.push(path);

    let path = cfg.output_path(SUMMARY_JSON);
    write_json(&path, &summary)?;
    files.push(path);

    info!(files = files.len(), output_dir = %cfg.output_dir, "reports written");
    Ok(ReportBundle {
        week,
        summary_rows,
        detail_rows,
        attendance_rows,
        reminders: reminder_rows,
        summary,
        files,
    })
}
