use crate::error::{ReportError, Result};
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};
use tracing::debug;

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ReportError::io(parent.display().to_string(), e))?;
    }
    Ok(())
}

fn write_delimited<T: Serialize>(path: &Path, rows: &[T], delimiter: u8) -> Result<()> {
    ensure_parent(path)?;
    let mut wtr = csv::WriterBuilder::new().delimiter(delimiter).from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush().map_err(|e| ReportError::io(path.display().to_string(), e))?;
    debug!(path = %path.display(), rows = rows.len(), "wrote table");
    Ok(())
}

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    write_delimited(path, rows, b',')
}

/// Tab-separated text, pasteable straight into a spreadsheet.
pub fn write_tsv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    write_delimited(path, rows, b'\t')
}

/// Render rows as tab-separated text in memory.
pub fn to_tsv_string<T: Serialize>(rows: &[T]) -> Result<String> {
    let mut wtr = csv::WriterBuilder::new().delimiter(b'\t').from_writer(Vec::new());
    for r in rows {
        wtr.serialize(r)?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| ReportError::io("<memory>", e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    write_text(path, &s)
}

pub fn write_text(path: &Path, contents: &str) -> Result<()> {
    ensure_parent(path)?;
    std::fs::write(path, contents).map_err(|e| ReportError::io(path.display().to_string(), e))?;
    debug!(path = %path.display(), bytes = contents.len(), "wrote file");
    Ok(())
}

/// Markdown table of the first `max_rows` rows, with a note when rows were
/// left out.
pub fn render_preview<T: Tabled>(rows: &[T], max_rows: usize) -> String {
    if rows.is_empty() {
        return "(no rows)".to_string();
    }
    let shown = rows.len().min(max_rows);
    let mut text = Table::new(&rows[..shown]).with(Style::markdown()).to_string();
    if shown < rows.len() {
        text.push_str(&format!("\n(showing {} of {} rows)", shown, rows.len()));
    }
    text
}

pub fn preview_table_rows<T: Tabled>(rows: &[T], max_rows: usize) {
    println!("{}\n", render_preview(rows, max_rows));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Tabled)]
    struct Row {
        #[serde(rename = "Name")]
        #[tabled(rename = "Name")]
        name: &'static str,
        #[serde(rename = "Count")]
        #[tabled(rename = "Count")]
        count: u32,
    }

    #[test]
    fn tsv_uses_tabs_and_headers() {
        let rows = vec![Row { name: "Ikeja", count: 3 }, Row { name: "Epe", count: 0 }];
        let text = to_tsv_string(&rows).unwrap();
        assert_eq!(text, "Name\tCount\nIkeja\t3\nEpe\t0\n");
    }

    #[test]
    fn writers_create_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/report.csv");
        write_csv(&path, &[Row { name: "Yaba", count: 1 }]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "Name,Count\nYaba,1\n");
    }

    #[test]
    fn preview_notes_truncated_rows() {
        let rows = vec![
            Row { name: "Ikeja", count: 3 },
            Row { name: "Epe", count: 0 },
            Row { name: "Yaba", count: 1 },
        ];
        let text = render_preview(&rows, 2);
        assert!(text.starts_with("| Name"));
        assert!(text.contains("Epe"));
        assert!(!text.contains("Yaba"));
        assert!(text.ends_with("(showing 2 of 3 rows)"));

        let all = render_preview(&rows, 10);
        assert!(!all.contains("showing"));
        assert_eq!(render_preview::<Row>(&[], 5), "(no rows)");
    }
}
