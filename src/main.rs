use anyhow::{bail, Result};

use mailstats::config::Config;
use mailstats::mail::{analyze, load_json_records, scan_maildir, EmailRecord};
use mailstats::report::{render_latency_table, render_no_reply_table};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let config = Config::load();

    let focal_org = flag_value(&args, "--focal").unwrap_or_else(|| config.focal_org.clone());
    if focal_org.is_empty() {
        bail!("no focal organization: set focal_org in config.toml or pass --focal NAME");
    }

    let json = flag_value(&args, "--json").or_else(|| config.json.clone());
    let maildir = flag_value(&args, "--maildir")
        .map(|m| shellexpand::tilde(&m).into_owned())
        .or_else(|| config.maildir_path());

    let records = load_records(json.as_deref(), maildir.as_deref())?;
    eprintln!("Analyzing {} records for '{}'", records.len(), focal_org);

    let report = analyze(&records, &focal_org);

    if !args.iter().any(|a| a == "--no-reply-only") {
        println!("Email Response Times");
        print!("{}", render_latency_table(&report, &config.report));
        println!();
    }
    println!("Non-responsive Organizations");
    print!("{}", render_no_reply_table(&report, &config.report));

    Ok(())
}

fn load_records(json: Option<&str>, maildir: Option<&str>) -> Result<Vec<EmailRecord>> {
    if let Some(path) = json {
        return load_json_records(path);
    }
    if let Some(dir) = maildir {
        return scan_maildir(dir, |current, total| {
            if current % 5000 == 0 && current < total {
                eprintln!("Scan progress: {}/{}", current, total);
            }
        });
    }
    bail!("no dataset: set json or maildir in config.toml, or pass --json/--maildir");
}

/// Value following a `--flag`, if present
fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1).cloned())
}

fn print_usage() {
    println!("Usage: mailstats [OPTIONS]");
    println!();
    println!("Monthly average reply latency per organization, plus the");
    println!("organizations that never reply.");
    println!();
    println!("Options:");
    println!("  --focal NAME      focal organization (overrides config.toml)");
    println!("  --json PATH       JSON export of email records");
    println!("  --maildir PATH    maildir to scan instead of a JSON export");
    println!("  --no-reply-only   print only the non-responsive table");
}
