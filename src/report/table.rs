use crate::config::ReportConfig;
use crate::mail::AnalysisReport;

/// Display one latency value: hours up to a day, days beyond, two decimal
/// places either way. The underlying numbers stay in hours everywhere;
/// only this layer converts.
pub fn format_latency(hours: f64) -> String {
    if hours > 24.0 {
        format!("{:.2} days", hours / 24.0)
    } else {
        format!("{:.2} hours", hours)
    }
}

fn format_cell(slot: Option<f64>) -> String {
    match slot {
        Some(hours) => format_latency(hours),
        None => String::new(),
    }
}

/// Monthly average reply-latency table: month columns, an "All
/// organizations" rollup row on top, one row per external organization
/// with at least one resolved reply.
pub fn render_latency_table(report: &AnalysisReport, layout: &ReportConfig) -> String {
    let mut out = String::new();

    let mut header = format!("{:<width$}", "", width = layout.org_width);
    for column in &report.columns {
        header.push_str(&format!(
            "{:<width$}",
            column.label(),
            width = layout.cell_width
        ));
    }
    push_line(&mut out, &header);

    if report.overall.iter().any(|slot| slot.is_some()) {
        push_row(&mut out, "All", &report.overall, layout);
    }
    for org in report.table_orgs() {
        push_row(&mut out, org, &report.rows[org], layout);
    }

    out
}

/// Non-responsive organizations: contacted at least once, never a
/// resolvable reply.
pub fn render_no_reply_table(report: &AnalysisReport, layout: &ReportConfig) -> String {
    let mut out = String::new();
    push_line(
        &mut out,
        &format!(
            "{:<width$}{}",
            "Organization",
            "Times Contacted",
            width = layout.org_width
        ),
    );
    for entry in &report.non_responsive {
        push_line(
            &mut out,
            &format!(
                "{:<width$}{}",
                entry.org,
                entry.contacted,
                width = layout.org_width
            ),
        );
    }
    out
}

fn push_row(out: &mut String, name: &str, row: &[Option<f64>], layout: &ReportConfig) {
    let mut line = format!("{:<width$}", name, width = layout.org_width);
    for slot in row {
        line.push_str(&format!(
            "{:<width$}",
            format_cell(*slot),
            width = layout.cell_width
        ));
    }
    push_line(out, &line);
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line.trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::{analyze, AddressEntry, EmailRecord, Role};

    #[test]
    fn test_format_latency() {
        assert_eq!(format_latency(2.0), "2.00 hours");
        assert_eq!(format_latency(0.5), "0.50 hours");
        // A full day still reads in hours; only beyond 24h switches
        assert_eq!(format_latency(24.0), "24.00 hours");
        assert_eq!(format_latency(36.0), "1.50 days");
        assert_eq!(format_latency(48.0), "2.00 days");
    }

    fn record(
        time: i64,
        message_id: &str,
        in_reply_to: Option<&str>,
        sender: &str,
        receiver: &str,
    ) -> EmailRecord {
        EmailRecord {
            time,
            message_id: message_id.to_string(),
            in_reply_to: in_reply_to.map(|s| s.to_string()),
            addresses: vec![
                AddressEntry {
                    role: Role::Sender,
                    address: sender.to_string(),
                },
                AddressEntry {
                    role: Role::Receiver,
                    address: receiver.to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_latency_table_layout() {
        let records = vec![
            record(0, "m1", None, "b@workpatterns.com", "a@orgx.com"),
            record(7200, "m2", Some("m1"), "a@orgx.com", "b@workpatterns.com"),
            // orgy is contacted but never replies
            record(100, "m3", None, "b@workpatterns.com", "c@orgy.com"),
        ];
        let report = analyze(&records, "workpatterns");
        let table = render_latency_table(&report, &ReportConfig::default());

        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("January 1970"));
        assert!(lines[1].starts_with("All"));
        assert!(lines[1].contains("2.00 hours"));
        assert!(lines[2].starts_with("orgx"));
        // Zero-sum and focal rows never render in the main table
        assert!(!table.contains("orgy"));
        assert!(!table.contains("workpatterns"));
    }

    #[test]
    fn test_no_reply_table() {
        let records = vec![
            record(0, "m1", None, "b@workpatterns.com", "c@orgy.com"),
            record(50, "m2", None, "b@workpatterns.com", "c@orgy.com"),
        ];
        let report = analyze(&records, "workpatterns");
        let table = render_no_reply_table(&report, &ReportConfig::default());

        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Organization"));
        assert!(lines[1].starts_with("orgy"));
        assert!(lines[1].trim_end().ends_with('2'));
    }

    #[test]
    fn test_empty_report_renders_header_only() {
        let report = analyze(&[], "workpatterns");
        let table = render_latency_table(&report, &ReportConfig::default());
        assert_eq!(table, "\n");
    }
}
