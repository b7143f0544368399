use rayon::prelude::*;
use std::collections::HashMap;

use super::orgs::classify_addresses;
use super::types::{EmailRecord, Mailbox, MonthColumn};

/// An organization that was contacted by the focal organization but has no
/// resolvable reply latency in any month.
#[derive(Debug, Clone, PartialEq)]
pub struct NonResponsive {
    pub org: String,
    /// Number of messages the organization received from the focal org
    pub contacted: usize,
}

/// Output of one batch run over a dataset.
///
/// Every row in `rows` has exactly `columns.len()` slots; `overall` is the
/// combined "All organizations" row over the externals that appear in the
/// main table. The focal organization keeps its own mailbox and row here,
/// but is excluded from `overall` and `non_responsive` and skipped by the
/// table renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub focal_org: String,
    pub columns: Vec<MonthColumn>,
    pub mailboxes: HashMap<String, Mailbox>,
    pub rows: HashMap<String, Vec<Option<f64>>>,
    pub overall: Vec<Option<f64>>,
    pub non_responsive: Vec<NonResponsive>,
}

impl AnalysisReport {
    /// External organizations that appear in the main table (nonzero row
    /// sum, focal excluded), sorted by name. The rollup averages over
    /// exactly this set.
    pub fn table_orgs(&self) -> Vec<&str> {
        let mut orgs: Vec<&str> = self
            .rows
            .iter()
            .filter(|(org, row)| org.as_str() != self.focal_org && row_sum(row) != 0.0)
            .map(|(org, _)| org.as_str())
            .collect();
        orgs.sort_unstable();
        orgs
    }
}

/// Run the full reply-latency analysis for one focal organization.
///
/// One-shot batch: sort by time, discover the month columns, index by
/// message id, accumulate per-organization mailboxes, then compute each
/// organization's monthly averages (in parallel; rows are independent)
/// and derive the rollup and non-responsive set.
pub fn analyze(records: &[EmailRecord], focal_org: &str) -> AnalysisReport {
    let mut records = records.to_vec();
    // Stable, so same-time records keep their input order
    records.sort_by_key(|r| r.time);

    let columns = discover_columns(&records);
    let col_index: HashMap<MonthColumn, usize> = columns
        .iter()
        .enumerate()
        .map(|(i, col)| (*col, i))
        .collect();

    let index: HashMap<&str, &EmailRecord> = records
        .iter()
        .map(|r| (r.message_id.as_str(), r))
        .collect();

    let mailboxes = build_mailboxes(&records, focal_org);

    let rows: HashMap<String, Vec<Option<f64>>> = mailboxes
        .par_iter()
        .map(|(org, mailbox)| {
            let row = monthly_averages(&mailbox.sent, &index, &col_index, columns.len());
            (org.clone(), row)
        })
        .collect();

    let overall = overall_row(&rows, focal_org, columns.len());
    let non_responsive = non_responsive_orgs(&mailboxes, &rows, focal_org);

    AnalysisReport {
        focal_org: focal_org.to_string(),
        columns,
        mailboxes,
        rows,
        overall,
        non_responsive,
    }
}

/// Distinct (month, year) labels in chronological order of first
/// occurrence. This sequence is the table header and fixes the length of
/// every monthly average row.
fn discover_columns(records: &[EmailRecord]) -> Vec<MonthColumn> {
    let mut columns: Vec<MonthColumn> = Vec::new();
    for record in records {
        let col = MonthColumn::of_timestamp(record.time);
        if !columns.contains(&col) {
            columns.push(col);
        }
    }
    columns
}

/// Group records into per-organization mailboxes, keeping only records
/// where the focal organization is the sender or among the receivers.
fn build_mailboxes(records: &[EmailRecord], focal_org: &str) -> HashMap<String, Mailbox> {
    let mut mailboxes: HashMap<String, Mailbox> = HashMap::new();

    for record in records {
        let (sender, receivers) = classify_addresses(&record.addresses);
        if sender != focal_org && !receivers.iter().any(|r| r == focal_org) {
            continue;
        }

        mailboxes
            .entry(sender)
            .or_default()
            .sent
            .push(record.message_id.clone());

        for receiver in receivers {
            mailboxes
                .entry(receiver)
                .or_default()
                .received
                .push(record.clone());
        }
    }

    mailboxes
}

/// Running sum/count for one calendar month of original-message dates.
///
/// The aggregator walks an organization's sent messages with at most one
/// bucket open at a time; crossing into a different month closes the
/// bucket into its row slot and opens a fresh one.
struct MonthBucket {
    column: MonthColumn,
    sum: f64,
    count: u32,
}

impl MonthBucket {
    fn open(column: MonthColumn, latency: f64) -> Self {
        Self {
            column,
            sum: latency,
            count: 1,
        }
    }

    fn add(&mut self, latency: f64) {
        self.sum += latency;
        self.count += 1;
    }

    fn close_into(self, row: &mut [Option<f64>], col_index: &HashMap<MonthColumn, usize>) {
        if let Some(&slot) = col_index.get(&self.column) {
            row[slot] = Some(self.sum / self.count as f64);
        }
    }
}

/// Monthly average reply latencies for one organization's sent messages.
///
/// A sent message contributes only when its `in_reply_to` resolves in the
/// index; the latency is bucketed under the month of the *original*
/// message, not the reply. Column slots come from position in the
/// discovered column sequence.
fn monthly_averages(
    sent: &[String],
    index: &HashMap<&str, &EmailRecord>,
    col_index: &HashMap<MonthColumn, usize>,
    n_columns: usize,
) -> Vec<Option<f64>> {
    let mut row: Vec<Option<f64>> = vec![None; n_columns];
    let mut bucket: Option<MonthBucket> = None;

    for message_id in sent {
        let Some(reply) = index.get(message_id.as_str()) else {
            continue;
        };
        let Some(target_id) = reply.in_reply_to.as_deref() else {
            continue;
        };
        // Reply target outside the dataset: no contribution
        let Some(original) = index.get(target_id) else {
            continue;
        };

        let column = MonthColumn::of_timestamp(original.time);
        let latency_hours = (reply.time - original.time) as f64 / 3600.0;

        match &mut bucket {
            Some(open) if open.column == column => open.add(latency_hours),
            _ => {
                if let Some(done) = bucket.take() {
                    done.close_into(&mut row, col_index);
                }
                bucket = Some(MonthBucket::open(column, latency_hours));
            }
        }
    }

    if let Some(done) = bucket {
        done.close_into(&mut row, col_index);
    }

    row
}

/// Sum of a row with "no data" slots counted as zero.
fn row_sum(row: &[Option<f64>]) -> f64 {
    row.iter().flatten().sum()
}

/// The "All organizations" combined row: per column, the mean over the
/// external organizations that appear in the main table (nonzero row sum,
/// focal excluded), with missing slots counted as zero. With nothing to
/// combine the row is all "no data" rather than a division by zero.
fn overall_row(
    rows: &HashMap<String, Vec<Option<f64>>>,
    focal_org: &str,
    n_columns: usize,
) -> Vec<Option<f64>> {
    let mut included: Vec<&String> = rows
        .keys()
        .filter(|org| org.as_str() != focal_org && row_sum(&rows[*org]) != 0.0)
        .collect();
    if included.is_empty() {
        return vec![None; n_columns];
    }
    // Sorted so floating-point summation order is deterministic
    included.sort();

    (0..n_columns)
        .map(|slot| {
            let total: f64 = included
                .iter()
                .map(|org| rows[*org][slot].unwrap_or(0.0))
                .sum();
            Some(total / included.len() as f64)
        })
        .collect()
}

/// External organizations with at least one received message and no
/// resolvable reply latency anywhere, sorted by name. Organizations the
/// focal org never wrote to are excluded outright.
fn non_responsive_orgs(
    mailboxes: &HashMap<String, Mailbox>,
    rows: &HashMap<String, Vec<Option<f64>>>,
    focal_org: &str,
) -> Vec<NonResponsive> {
    let mut flagged: Vec<NonResponsive> = mailboxes
        .iter()
        .filter(|(org, mailbox)| {
            org.as_str() != focal_org
                && !mailbox.received.is_empty()
                && row_sum(&rows[org.as_str()]) == 0.0
        })
        .map(|(org, mailbox)| NonResponsive {
            org: org.clone(),
            contacted: mailbox.received.len(),
        })
        .collect();
    flagged.sort_by(|a, b| a.org.cmp(&b.org));
    flagged
}
