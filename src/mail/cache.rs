use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::Result;
use rayon::prelude::*;

use super::types::CachedRecord;

const CACHE_VERSION: u32 = 1;

/// On-disk scan cache: parsed records keyed by source file path, each with
/// the file's mtime at parse time for invalidation.
#[derive(serde::Serialize, serde::Deserialize)]
struct CacheFile {
    version: u32,
    records: HashMap<String, CachedRecord>,
}

fn cache_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|p| p.join("mailstats/records.bin"))
}

/// Load the scan cache, or an empty map when there is none (missing file,
/// unreadable contents, version mismatch — a cold scan, never an error).
pub fn load_cache() -> HashMap<String, CachedRecord> {
    match cache_path() {
        Some(path) => read_cache_from(&path),
        None => HashMap::new(),
    }
}

/// Persist the scan cache (binary format for speed).
pub fn save_cache(records: &HashMap<String, CachedRecord>) -> Result<()> {
    match cache_path() {
        Some(path) => write_cache_to(&path, records),
        None => Ok(()),
    }
}

fn read_cache_from(path: &Path) -> HashMap<String, CachedRecord> {
    let Ok(file) = File::open(path) else {
        return HashMap::new();
    };
    let reader = BufReader::new(file);
    let cache: CacheFile = match bincode::deserialize_from(reader) {
        Ok(c) => c,
        Err(_) => return HashMap::new(),
    };
    if cache.version != CACHE_VERSION {
        return HashMap::new();
    }
    cache.records
}

fn write_cache_to(path: &Path, records: &HashMap<String, CachedRecord>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let cache = CacheFile {
        version: CACHE_VERSION,
        records: records.clone(),
    };
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    bincode::serialize_into(writer, &cache)?;
    Ok(())
}

/// File modification time in seconds since epoch.
pub fn file_mtime(path: &Path) -> Option<u64> {
    let mtime = fs::metadata(path).ok()?.modified().ok()?;
    mtime
        .duration_since(SystemTime::UNIX_EPOCH)
        .ok()
        .map(|d| d.as_secs())
}

/// Split scanned file paths into (files that need parsing, cache entries
/// that are still valid).
///
/// Fast path: when the file count matches the cache size the whole cache
/// is taken as-is without touching any mtimes; the maildir rarely changes
/// in place. Otherwise every path's mtime is checked in parallel.
pub fn partition_files(
    file_paths: &[PathBuf],
    cache: &HashMap<String, CachedRecord>,
) -> (Vec<PathBuf>, HashMap<String, CachedRecord>) {
    if file_paths.len() == cache.len() {
        return (Vec::new(), cache.clone());
    }

    let checked: Vec<(Option<PathBuf>, Option<(String, CachedRecord)>)> = file_paths
        .par_iter()
        .map(|path| {
            let key = path.to_string_lossy().to_string();
            match cache.get(&key) {
                Some(cached) if file_mtime(path) == Some(cached.mtime) => {
                    (None, Some((key, cached.clone())))
                }
                // Modified since the cached parse, or new file
                _ => (Some(path.clone()), None),
            }
        })
        .collect();

    let mut to_parse = Vec::new();
    let mut still_valid = HashMap::new();
    for (parse, hit) in checked {
        if let Some(path) = parse {
            to_parse.push(path);
        }
        if let Some((key, cached)) = hit {
            still_valid.insert(key, cached);
        }
    }

    (to_parse, still_valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::types::EmailRecord;

    fn sample_record(id: &str) -> CachedRecord {
        CachedRecord {
            record: EmailRecord {
                time: 1000,
                message_id: id.to_string(),
                in_reply_to: None,
                addresses: Vec::new(),
            },
            mtime: 42,
        }
    }

    #[test]
    fn test_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.bin");

        let mut records = HashMap::new();
        records.insert("/mail/cur/a".to_string(), sample_record("m1"));
        records.insert("/mail/cur/b".to_string(), sample_record("m2"));
        write_cache_to(&path, &records).unwrap();

        let loaded = read_cache_from(&path);
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded["/mail/cur/a"].record.message_id, "m1");
        assert_eq!(loaded["/mail/cur/b"].mtime, 42);
    }

    #[test]
    fn test_missing_cache_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_cache_from(&dir.path().join("nope.bin")).is_empty());
    }

    #[test]
    fn test_garbage_cache_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.bin");
        fs::write(&path, b"not bincode").unwrap();
        assert!(read_cache_from(&path).is_empty());
    }

    #[test]
    fn test_partition_detects_new_and_stale_files() {
        let dir = tempfile::tempdir().unwrap();
        let fresh = dir.path().join("fresh");
        let stale = dir.path().join("stale");
        fs::write(&fresh, b"x").unwrap();
        fs::write(&stale, b"y").unwrap();

        let mut cache = HashMap::new();
        let mut hit = sample_record("m1");
        hit.mtime = file_mtime(&fresh).unwrap();
        cache.insert(fresh.to_string_lossy().to_string(), hit);
        let mut miss = sample_record("m2");
        miss.mtime = 1; // long before the file's real mtime
        cache.insert(stale.to_string_lossy().to_string(), miss);

        // Third path forces the slow path (counts differ)
        let unknown = dir.path().join("unknown");
        fs::write(&unknown, b"z").unwrap();

        let paths = vec![fresh.clone(), stale.clone(), unknown.clone()];
        let (to_parse, still_valid) = partition_files(&paths, &cache);

        assert_eq!(still_valid.len(), 1);
        assert!(still_valid.contains_key(&*fresh.to_string_lossy()));
        let mut to_parse_names = to_parse.clone();
        to_parse_names.sort();
        let mut expected = vec![stale, unknown];
        expected.sort();
        assert_eq!(to_parse_names, expected);
    }
}
