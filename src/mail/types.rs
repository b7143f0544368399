use chrono::{DateTime, Datelike};
use serde::{Deserialize, Serialize};

/// Role of a single address entry on a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Sender,
    Receiver,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressEntry {
    pub role: Role,
    pub address: String,
}

/// One email as it appears in the dataset.
///
/// Serde field names follow the JSON export shape (`message-id`,
/// `in-reply-to`). Exactly one `sender` entry per record; `in_reply_to`
/// may name a message that is not in the dataset at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailRecord {
    /// Unix epoch seconds
    pub time: i64,
    #[serde(rename = "message-id")]
    pub message_id: String,
    #[serde(rename = "in-reply-to", default)]
    pub in_reply_to: Option<String>,
    #[serde(default)]
    pub addresses: Vec<AddressEntry>,
}

impl EmailRecord {
    pub fn sender_address(&self) -> Option<&str> {
        self.addresses
            .iter()
            .find(|a| a.role == Role::Sender)
            .map(|a| a.address.as_str())
    }
}

/// Cached record with file modification time for invalidation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedRecord {
    pub record: EmailRecord,
    pub mtime: u64, // File modification time in seconds since epoch
}

/// One (month, year) column of the output table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonthColumn {
    /// Calendar month, 1-12
    pub month: u32,
    pub year: i32,
}

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

impl MonthColumn {
    /// Month/year of an epoch timestamp, in UTC.
    /// Out-of-range timestamps clamp to the epoch rather than failing.
    pub fn of_timestamp(secs: i64) -> Self {
        let date = DateTime::from_timestamp(secs, 0).unwrap_or_default();
        Self {
            month: date.month(),
            year: date.year(),
        }
    }

    /// Header label, e.g. "January 2021"
    pub fn label(&self) -> String {
        let name = MONTH_NAMES
            .get(self.month.saturating_sub(1) as usize)
            .unwrap_or(&"Unknown");
        format!("{} {}", name, self.year)
    }
}

/// Per-organization correspondence with the focal organization.
///
/// `sent` holds message ids in accumulation order (which follows the
/// chronological record order); `received` holds the full records so the
/// contacted count and timestamps stay available to reports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mailbox {
    pub sent: Vec<String>,
    pub received: Vec<EmailRecord>,
}
