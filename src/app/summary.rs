//! Final run summary printed to stdout.

use voltdownload_core::RunReport;

/// Returns the summary lines for a finished or interrupted run.
pub(crate) fn report_lines(report: &RunReport) -> Vec<String> {
    let mut lines = Vec::new();
    if report.interrupted {
        lines.push("File Transfer Interrupted.".to_string());
    } else {
        lines.push("File Transfer Complete.".to_string());
    }
    lines.push(format!(
        "Observation {}: {}/{} files complete ({} already present, {} transferred, {} failed)",
        report.observation_id,
        report.completed,
        report.total,
        report.skipped,
        report.downloaded,
        report.failed()
    ));

    if report.errors.is_empty() {
        if !report.interrupted {
            lines.push("File Transfer Success.".to_string());
        }
    } else {
        lines.push("File Transfer Error Summary:".to_string());
        lines.extend(report.errors.iter().map(|error| format!("  {error}")));
    }
    lines
}

pub(crate) fn print_report(report: &RunReport) {
    for line in report_lines(report) {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::report_lines;
    use voltdownload_core::RunReport;

    fn report(errors: Vec<String>, interrupted: bool) -> RunReport {
        RunReport {
            observation_id: 1_096_952_256,
            total: 2,
            completed: 2 - errors.len() as u64,
            skipped: 1,
            downloaded: 1 - errors.len() as u64,
            errors,
            peak_in_flight: 1,
            interrupted,
        }
    }

    #[test]
    fn test_report_lines_success() {
        let lines = report_lines(&report(Vec::new(), false));
        assert_eq!(lines[0], "File Transfer Complete.");
        assert_eq!(
            lines[1],
            "Observation 1096952256: 2/2 files complete (1 already present, 1 transferred, 0 failed)"
        );
        assert_eq!(lines[2], "File Transfer Success.");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_report_lines_lists_errors() {
        let lines = report_lines(&report(vec!["b.dat size mismatch".to_string()], false));
        assert!(lines.contains(&"File Transfer Error Summary:".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("  b.dat size mismatch"));
        assert!(!lines.contains(&"File Transfer Success.".to_string()));
    }

    #[test]
    fn test_report_lines_interrupted() {
        let lines = report_lines(&report(Vec::new(), true));
        assert_eq!(lines[0], "File Transfer Interrupted.");
        assert_eq!(lines.len(), 2);
    }
}
