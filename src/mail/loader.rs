use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use mail_parser::MessageParser;
use rayon::prelude::*;
use walkdir::WalkDir;

use super::cache::{file_mtime, load_cache, partition_files, save_cache};
use super::types::{AddressEntry, CachedRecord, EmailRecord, Role};

/// Load records from a JSON export: an array of record objects in the
/// `message-id`/`in-reply-to` field shape.
pub fn load_json_records(path: &str) -> Result<Vec<EmailRecord>> {
    let content = std::fs::read_to_string(path)?;
    let records: Vec<EmailRecord> = serde_json::from_str(&content)?;
    Ok(records)
}

/// Scan a maildir and build analysis records from message headers.
///
/// Walks `cur/` and `new/`, reuses the on-disk scan cache for unchanged
/// files, and parses only new or modified messages in parallel. Files
/// that cannot be parsed, or that carry no Message-ID (nothing can thread
/// against them), are skipped rather than failing the scan.
pub fn scan_maildir<F>(mail_dir: &str, progress: F) -> Result<Vec<EmailRecord>>
where
    F: Fn(usize, usize) + Sync, // (current, total)
{
    let file_paths = collect_maildir_files(Path::new(mail_dir));
    let total = file_paths.len();

    let cache = load_cache();
    let (to_parse, mut entries) = partition_files(&file_paths, &cache);

    let cache_hits = entries.len();
    let to_parse_count = to_parse.len();
    progress(cache_hits, total);

    if !to_parse.is_empty() {
        let processed = AtomicUsize::new(0);

        let parsed: Vec<(String, CachedRecord)> = to_parse
            .into_par_iter()
            .filter_map(|path| {
                let entry = parse_mail_file(&path).map(|record| {
                    let mtime = file_mtime(&path).unwrap_or(0);
                    (
                        path.to_string_lossy().to_string(),
                        CachedRecord { record, mtime },
                    )
                });

                let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
                if done % 100 == 0 || done == to_parse_count {
                    progress(cache_hits + done, total);
                }

                entry
            })
            .collect();

        entries.extend(parsed);
    }

    progress(total, total);

    if let Err(e) = save_cache(&entries) {
        eprintln!("Cache write error: {}", e);
    }

    Ok(entries.into_values().map(|c| c.record).collect())
}

/// All regular files under the maildir's `cur/` and `new/` subdirectories.
fn collect_maildir_files(mail_dir: &Path) -> Vec<PathBuf> {
    let mut file_paths = Vec::new();
    for subdir in &["cur", "new"] {
        for entry in WalkDir::new(mail_dir.join(subdir))
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if entry.file_type().is_file() {
                file_paths.push(entry.into_path());
            }
        }
    }
    file_paths
}

/// Parse one maildir file into an analysis record.
///
/// Returns None for unreadable or unparseable files and for messages
/// without a Message-ID.
fn parse_mail_file(path: &Path) -> Option<EmailRecord> {
    let raw = std::fs::read(path).ok()?;
    let message = MessageParser::default().parse(&raw)?;

    let message_id = message.message_id()?.to_string();
    let time = message.date().map(|d| d.to_timestamp()).unwrap_or(0);
    let in_reply_to = message
        .in_reply_to()
        .as_text_list()
        .and_then(|ids| ids.first().map(|s| s.to_string()));

    let mut addresses = Vec::new();
    if let Some(sender) = flatten_addresses(message.from()).into_iter().next() {
        addresses.push(AddressEntry {
            role: Role::Sender,
            address: sender,
        });
    }
    for address in flatten_addresses(message.to())
        .into_iter()
        .chain(flatten_addresses(message.cc()))
    {
        addresses.push(AddressEntry {
            role: Role::Receiver,
            address,
        });
    }

    Some(EmailRecord {
        time,
        message_id,
        in_reply_to,
        addresses,
    })
}

/// Flatten a parsed address header into bare addresses, groups included.
fn flatten_addresses(addr: Option<&mail_parser::Address>) -> Vec<String> {
    let Some(addr) = addr else {
        return Vec::new();
    };
    match addr {
        mail_parser::Address::List(list) => list
            .iter()
            .filter_map(|a| a.address.as_ref().map(|s| s.to_string()))
            .collect(),
        mail_parser::Address::Group(groups) => groups
            .iter()
            .flat_map(|g| {
                g.addresses
                    .iter()
                    .filter_map(|a| a.address.as_ref().map(|s| s.to_string()))
            })
            .collect(),
    }
}
