//! Printable HTML rendering of the grouped defaulters report.
//!
//! The output is a single self-contained document meant to be opened in a
//! browser and printed to PDF. Rendering is deterministic: the caller passes
//! the generation timestamp in, so equal inputs give identical bytes.

use crate::hierarchy::DefaulterBucket;
use crate::reports::sorted_by_severity;
use crate::status::{ReportWeek, StatusCounts, StatusTier};
use crate::types::HierarchyLevel;
use crate::util::{format_int, format_number, html_escape};
use std::fmt::Write as _;

pub struct HtmlReport<'a> {
    pub title: &'a str,
    pub generated_at: &'a str,
    pub week: ReportWeek,
    pub grouped_by: HierarchyLevel,
    pub buckets: &'a [DefaulterBucket],
}

impl HtmlReport<'_> {
    fn overall(&self) -> StatusCounts {
        self.buckets
            .iter()
            .flat_map(|b| b.items.iter().map(|i| &i.status))
            .collect()
    }
}

pub fn render_defaulters_html(report: &HtmlReport<'_>) -> String {
    let mut out = String::with_capacity(16 * 1024);
    let title = html_escape(report.title);

    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(out, "<title>{}</title>", title);
    out.push_str("<style>");
    out.push_str(PRINT_CSS);
    out.push_str("</style>\n</head>\n<body>\n");

    let _ = writeln!(out, "<header><h1>{}</h1>", title);
    let _ = writeln!(
        out,
        "<p class=\"meta\">Generated {} &middot; Week {} of {} &middot; Grouped by {}</p></header>",
        html_escape(report.generated_at),
        report.week.week,
        report.week.year,
        report.grouped_by.label()
    );

    write_legend(&mut out);

    if report.buckets.is_empty() {
        out.push_str("<p class=\"empty\">No defaulters to report.</p>\n");
    } else {
        write_overall(&mut out, &report.overall(), report.buckets.len(), report.grouped_by);
        for bucket in report.buckets {
            write_bucket(&mut out, bucket);
        }
    }

    out.push_str("</body>\n</html>\n");
    out
}

fn write_legend(out: &mut String) {
    out.push_str("<section class=\"legend\">");
    for tier in StatusTier::ALL {
        let _ = write!(
            out,
            "<span class=\"chip\" style=\"color:{};background:{}\">{} {}</span>",
            tier.colour(),
            tier.background(),
            tier.emoji(),
            tier.label()
        );
    }
    out.push_str("</section>\n");
}

fn count_cells(out: &mut String, counts: &StatusCounts) {
    for tier in StatusTier::ALL {
        let _ = write!(
            out,
            "<td class=\"num\" style=\"color:{}\">{}</td>",
            tier.colour(),
            format_int(counts.get(tier))
        );
    }
}

fn write_overall(out: &mut String, counts: &StatusCounts, buckets: usize, level: HierarchyLevel) {
    out.push_str("<section class=\"summary\"><h2>Summary</h2>\n<table><thead><tr>");
    out.push_str("<th>Entities</th>");
    for tier in StatusTier::ALL {
        let _ = write!(out, "<th>{} {}</th>", tier.emoji(), tier.label());
    }
    let _ = write!(out, "<th>Compliance</th><th>{}s</th></tr></thead>\n<tbody><tr>", level.label());
    let _ = write!(out, "<td class=\"num\">{}</td>", format_int(counts.total()));
    count_cells(out, counts);
    let _ = write!(
        out,
        "<td class=\"num\">{}%</td><td class=\"num\">{}</td>",
        format_number(counts.compliance_rate(), 1),
        format_int(buckets)
    );
    out.push_str("</tr></tbody></table></section>\n");
}

fn write_bucket(out: &mut String, bucket: &DefaulterBucket) {
    let _ = writeln!(
        out,
        "<section class=\"bucket\"><h2>{} <small>({})</small></h2>",
        html_escape(&bucket.name),
        format_int(bucket.items.len())
    );

    out.push_str("<table class=\"counts\"><tbody><tr>");
    count_cells(out, &bucket.counts);
    let _ = write!(
        out,
        "<td class=\"num\">{}% compliant</td>",
        format_number(bucket.counts.compliance_rate(), 1)
    );
    out.push_str("</tr></tbody></table>\n");

    out.push_str(
        "<table class=\"members\"><thead><tr><th>Name</th><th>Level</th><th>Status</th>\
         <th>Last Filled Week</th><th>Weeks Owed</th></tr></thead>\n<tbody>\n",
    );
    for item in sorted_by_severity(&bucket.items) {
        let last = item
            .last_filled_week
            .map(|w| w.to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "<tr style=\"background:{}\"><td>{}</td><td>{}</td><td style=\"color:{}\">{} {}</td>\
             <td class=\"num\">{}</td><td class=\"num\">{}</td></tr>",
            item.status.background(),
            html_escape(&item.name),
            item.level.label(),
            item.status.colour(),
            item.status.emoji(),
            item.status.label(),
            last,
            item.weeks_owed
        );
    }
    out.push_str("</tbody></table></section>\n");
}

const PRINT_CSS: &str = r#"
body { font-family: system-ui, -apple-system, 'Segoe UI', sans-serif; color: #111827; margin: 2rem; }
header { border-bottom: 2px solid #e5e7eb; margin-bottom: 1rem; }
h1 { font-size: 1.6rem; margin: 0 0 .25rem; }
h2 { font-size: 1.15rem; margin: 1.25rem 0 .5rem; }
.meta { color: #6b7280; font-size: .85rem; }
.legend .chip { display: inline-block; padding: .15rem .5rem; margin-right: .5rem; border-radius: .75rem; font-size: .8rem; }
table { border-collapse: collapse; width: 100%; margin-bottom: .5rem; }
th, td { border: 1px solid #e5e7eb; padding: .3rem .5rem; text-align: left; font-size: .85rem; }
th { background: #f9fafb; }
td.num { text-align: right; }
.empty { color: #6b7280; font-style: italic; }
@media print {
  body { margin: 0; }
  .bucket { page-break-inside: avoid; }
  tr { -webkit-print-color-adjust: exact; print-color-adjust: exact; }
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::group_defaulters;
    use crate::types::{DefaulterItem, HierarchyRefs, NodeRef};

    fn items() -> Vec<DefaulterItem> {
        vec![
            DefaulterItem {
                id: "1".into(),
                name: "St. <Mark> & Co".into(),
                level: HierarchyLevel::District,
                status: StatusTier::Red,
                last_filled_week: None,
                weeks_owed: 0,
                refs: HierarchyRefs {
                    region: Some(NodeRef { id: "r1".into(), name: "Ibadan".into() }),
                    ..Default::default()
                },
            },
            DefaulterItem {
                id: "2".into(),
                name: "Agodi".into(),
                level: HierarchyLevel::District,
                status: StatusTier::Green,
                last_filled_week: Some(10),
                weeks_owed: 0,
                refs: HierarchyRefs::default(),
            },
        ]
    }

    fn render(buckets: &[DefaulterBucket]) -> String {
        render_defaulters_html(&HtmlReport {
            title: "Defaulters Report",
            generated_at: "2024-03-08 09:00",
            week: ReportWeek::new(2024, 10),
            grouped_by: HierarchyLevel::Region,
            buckets,
        })
    }

    #[test]
    fn renders_sections_and_escapes_names() {
        let buckets = group_defaulters(&items(), HierarchyLevel::Region);
        let html = render(&buckets);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("St. &lt;Mark&gt; &amp; Co"));
        assert!(!html.contains("<Mark>"));
        assert!(html.contains("<h2>Ibadan <small>(1)</small></h2>"));
        assert!(html.contains("<h2>Unassigned <small>(1)</small></h2>"));
        assert!(html.contains("Week 10 of 2024"));
        assert!(html.contains("50.0%"));
        for tier in StatusTier::ALL {
            assert!(html.contains(tier.label()));
        }
    }

    #[test]
    fn rendering_is_deterministic() {
        let buckets = group_defaulters(&items(), HierarchyLevel::Region);
        assert_eq!(render(&buckets), render(&buckets));
    }

    #[test]
    fn empty_report_has_note() {
        let html = render(&[]);
        assert!(html.contains("No defaulters to report."));
        assert!(!html.contains("class=\"bucket\""));
    }
}
