use std::collections::{HashMap, HashSet};

use anyhow::{bail, Result};

use mailstats::config::Config;
use mailstats::mail::{
    classify_addresses, load_json_records, org_of_address, scan_maildir, EmailRecord,
};

/// Data-quality audit for an analysis dataset: duplicate message ids,
/// dangling reply references, malformed addresses, and how much of the
/// dataset actually involves the focal organization.
fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config = Config::load();

    let focal_org = args
        .iter()
        .position(|a| a == "--focal")
        .and_then(|i| args.get(i + 1).cloned())
        .unwrap_or_else(|| config.focal_org.clone());

    let records = load_records(&args, &config)?;
    println!("Total records: {}", records.len());

    // Duplicate message ids break index lookups silently: later records
    // shadow earlier ones.
    let mut id_counts: HashMap<&str, usize> = HashMap::new();
    for record in &records {
        *id_counts.entry(record.message_id.as_str()).or_default() += 1;
    }
    let duplicates: Vec<_> = id_counts.iter().filter(|&(_, count)| *count > 1).collect();
    println!("Duplicate message ids: {}", duplicates.len());
    for (id, count) in duplicates.iter().take(5) {
        println!("  {} appears {} times", &id[..id.len().min(60)], count);
    }

    let id_set: HashSet<&str> = records.iter().map(|r| r.message_id.as_str()).collect();
    let dangling = records
        .iter()
        .filter(|r| {
            r.in_reply_to
                .as_deref()
                .is_some_and(|target| !id_set.contains(target))
        })
        .count();
    println!("Dangling reply references: {}", dangling);

    let mut malformed = 0;
    let mut samples: Vec<&str> = Vec::new();
    for record in &records {
        for entry in &record.addresses {
            if org_of_address(&entry.address).is_empty() {
                malformed += 1;
                if samples.len() < 5 {
                    samples.push(entry.address.as_str());
                }
            }
        }
    }
    println!("Addresses with no resolvable organization: {}", malformed);
    for address in samples {
        println!("  {}", address);
    }

    let without_sender = records
        .iter()
        .filter(|r| r.sender_address().is_none())
        .count();
    println!("Records without a sender entry: {}", without_sender);

    if focal_org.is_empty() {
        println!("No focal organization configured; correspondence check skipped");
        return Ok(());
    }

    let outside = records
        .iter()
        .filter(|record| {
            let (sender, receivers) = classify_addresses(&record.addresses);
            sender != focal_org && !receivers.iter().any(|r| r == &focal_org)
        })
        .count();
    println!(
        "Records outside '{}' correspondence: {} ({} analyzed)",
        focal_org,
        outside,
        records.len() - outside
    );

    Ok(())
}

fn load_records(args: &[String], config: &Config) -> Result<Vec<EmailRecord>> {
    let json = args
        .iter()
        .position(|a| a == "--json")
        .and_then(|i| args.get(i + 1).cloned())
        .or_else(|| config.json.clone());
    if let Some(path) = json {
        return load_json_records(&path);
    }

    let maildir = args
        .iter()
        .position(|a| a == "--maildir")
        .and_then(|i| args.get(i + 1).cloned())
        .map(|m| shellexpand::tilde(&m).into_owned())
        .or_else(|| config.maildir_path());
    if let Some(dir) = maildir {
        return scan_maildir(&dir, |_, _| {});
    }

    bail!("no dataset: set json or maildir in config.toml, or pass --json/--maildir");
}
