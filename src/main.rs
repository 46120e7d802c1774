// Entry point and interactive menu.
//
// - Option [1] loads the defaulters export and prints load diagnostics.
// - Option [2] loads attendance records (optional, feeds report 3).
// - Option [3] generates every report and previews them on the console.
// After generating reports the user can go back to the menu or exit.
use attendance_report::config::AppConfig;
use attendance_report::pipeline::{self, ReportBundle};
use attendance_report::types::{AttendanceRecord, DefaulterItem};
use attendance_report::{loader, output, util};
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::{Mutex, MutexGuard};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

// Loaded data lives for the whole session so reports can be regenerated
// without reloading the exports.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| {
    Mutex::new(AppState {
        defaulters: None,
        attendance: None,
    })
});

struct AppState {
    defaulters: Option<Vec<DefaulterItem>>,
    attendance: Option<Vec<AttendanceRecord>>,
}

fn state() -> MutexGuard<'static, AppState> {
    APP_STATE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// `None` once stdin is closed.
fn read_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        let Some(resp) = read_line("Back to Report Selection (Y/N): ") else {
            return false;
        };
        match resp.to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn handle_load_defaulters(cfg: &AppConfig) {
    let week = cfg.report_week();
    match loader::load_defaulters(&cfg.defaulters_path, week) {
        Ok((items, report)) => {
            println!(
                "Processing defaulters... ({} rows read, {} loaded for week {})",
                util::format_int(report.total_rows),
                util::format_int(report.loaded_rows),
                week.week
            );
            println!(
                "Note: {} rows skipped due to parse/validation errors.",
                util::format_int(report.parse_errors)
            );
            if report.derived_statuses > 0 {
                println!(
                    "Info: Derived status for {} rows without one.",
                    util::format_int(report.derived_statuses)
                );
            }
            println!();
            state().defaulters = Some(items);
        }
        Err(e) => {
            error!(path = %cfg.defaulters_path, error = %e, "failed to load defaulters");
            eprintln!("Failed to load file: {}\n", e);
        }
    }
}

fn handle_load_attendance(cfg: &AppConfig) {
    match loader::load_attendance(&cfg.attendance_path) {
        Ok((records, report)) => {
            println!(
                "Processing attendance... ({} rows read, {} records loaded)",
                util::format_int(report.total_rows),
                util::format_int(report.loaded_rows)
            );
            println!(
                "Note: {} rows skipped due to parse/validation errors.\n",
                util::format_int(report.parse_errors)
            );
            state().attendance = Some(records);
        }
        Err(e) => {
            error!(path = %cfg.attendance_path, error = %e, "failed to load attendance");
            eprintln!("Failed to load file: {}\n", e);
        }
    }
}

fn print_previews(cfg: &AppConfig, bundle: &ReportBundle) {
    let level = cfg.group_by.label();

    println!("Report 1: Defaulters Summary by {}", level);
    println!("(Week {} of {})\n", bundle.week.week, bundle.week.year);
    output::preview_table_rows(&bundle.summary_rows, cfg.preview_rows);
    println!("(Full table exported to {})\n", pipeline::SUMMARY_CSV);

    println!("Report 2: Defaulters Detail");
    println!("(Most severe first)\n");
    output::preview_table_rows(&bundle.detail_rows, cfg.preview_rows);
    println!(
        "(Full table exported to {} and {})\n",
        pipeline::DETAIL_CSV,
        pipeline::CLIPBOARD_TSV
    );

    if !bundle.attendance_rows.is_empty() {
        println!("Report 3: Attendance Totals by {}\n", level);
        output::preview_table_rows(&bundle.attendance_rows, cfg.preview_rows);
        println!("(Full table exported to {})\n", pipeline::ATTENDANCE_CSV);
    }

    println!("Reminders ({} pending)\n", util::format_int(bundle.reminders.len()));
    output::preview_table_rows(&bundle.reminders, cfg.preview_rows);

    println!("Printable report: {}", pipeline::HTML_REPORT);
    println!("Summary Stats ({}):", pipeline::SUMMARY_JSON);
    println!(
        "{{\"total_entities\": {}, \"compliance_rate\": {}}}\n",
        util::format_int(bundle.summary.total_entities),
        util::format_number(bundle.summary.compliance_rate, 2)
    );
}

fn handle_generate_reports(cfg: &AppConfig) {
    let (defaulters, attendance) = {
        let st = state();
        (st.defaulters.clone(), st.attendance.clone())
    };
    let defaulters = match pipeline::require_loaded(defaulters, "defaulters") {
        Ok(d) => d,
        Err(e) => {
            warn!(error = %e, "report generation requested before loading");
            println!("Error: {}. Please load the defaulters file first (option 1).\n", e);
            return;
        }
    };
    let attendance = attendance.unwrap_or_default();

    println!("Generating reports...");
    println!("Outputs saved to {}...\n", cfg.output_dir);

    let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M").to_string();
    match pipeline::generate_reports(cfg, cfg.report_week(), &defaulters, &attendance, &generated_at) {
        Ok(bundle) => print_previews(cfg, &bundle),
        Err(e) => {
            error!(error = %e, "report generation failed");
            eprintln!("Write error: {}", e);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_tracing();

    let cfg = match AppConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    loop {
        println!("Attendance Defaulters Reports");
        println!("[1] Load defaulters ({})", cfg.defaulters_path);
        println!("[2] Load attendance records ({})", cfg.attendance_path);
        println!("[3] Generate Reports\n");
        let Some(choice) = read_line("Enter choice: ") else {
            return ExitCode::SUCCESS;
        };
        match choice.as_str() {
            "1" => handle_load_defaulters(&cfg),
            "2" => handle_load_attendance(&cfg),
            "3" => {
                println!();
                handle_generate_reports(&cfg);
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    return ExitCode::SUCCESS;
                }
            }
            _ => println!("Invalid choice. Please enter 1, 2 or 3.\n"),
        }
    }
}
