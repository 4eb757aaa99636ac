//! Persistent snapshot of a built [`CorpusIndex`], keyed by the corpus
//! source descriptor. Cache state never changes ranking; it only decides
//! whether a build can be skipped.

use crate::index::CorpusIndex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

const FORMAT_VERSION: u32 = 1;

/// On-disk record. The version field guards against decoding snapshots
/// produced by an incompatible build.
#[derive(Deserialize)]
struct CacheRecord {
    version: u32,
    index: CorpusIndex,
}

#[derive(Serialize)]
struct CacheRecordRef<'a> {
    version: u32,
    index: &'a CorpusIndex,
}

/// Outcome of a cache lookup. `Miss` and `Corrupt` both mean "build
/// fresh"; they are distinct so the caller can log what happened.
pub enum CacheOutcome {
    Hit(CorpusIndex),
    Miss,
    Corrupt,
}

/// Cache file for a source descriptor: the literal descriptor string with
/// `-table` appended. No normalization; previously produced cache files
/// must keep resolving to the same name.
pub fn cache_path(descriptor: &str) -> PathBuf {
    PathBuf::from(format!("{descriptor}-table"))
}

/// Write a snapshot of `index`. Callers treat failure as best-effort: a
/// search must not fail because its cache could not be written.
pub fn save(index: &CorpusIndex, descriptor: &str) -> Result<(), bincode::Error> {
    let record = CacheRecordRef {
        version: FORMAT_VERSION,
        index,
    };
    let bytes = bincode::serialize(&record)?;
    fs::write(cache_path(descriptor), bytes)?;
    Ok(())
}

/// Read back a snapshot. A missing file is a `Miss`; an unreadable,
/// undecodable, or wrong-version file is `Corrupt`.
pub fn load(descriptor: &str) -> CacheOutcome {
    let bytes = match fs::read(cache_path(descriptor)) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return CacheOutcome::Miss,
        Err(_) => return CacheOutcome::Corrupt,
    };
    match bincode::deserialize::<CacheRecord>(&bytes) {
        Ok(record) if record.version == FORMAT_VERSION => CacheOutcome::Hit(record.index),
        Ok(_) | Err(_) => CacheOutcome::Corrupt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::DocumentIndex;
    use tempfile::tempdir;

    fn descriptor_in(dir: &std::path::Path) -> String {
        dir.join("corpus").to_string_lossy().into_owned()
    }

    #[test]
    fn cache_path_is_literal_concatenation() {
        assert_eq!(
            cache_path("~/Desktop/ufo"),
            PathBuf::from("~/Desktop/ufo-table")
        );
        assert_eq!(
            cache_path("http://example.com/"),
            PathBuf::from("http://example.com/-table")
        );
    }

    #[test]
    fn missing_file_is_a_miss() {
        let dir = tempdir().unwrap();
        assert!(matches!(load(&descriptor_in(dir.path())), CacheOutcome::Miss));
    }

    #[test]
    fn save_then_load_round_trips_counts() {
        let dir = tempdir().unwrap();
        let descriptor = descriptor_in(dir.path());

        let mut index = CorpusIndex::default();
        index.insert("d1".into(), DocumentIndex::from_text("dog cat dog"));
        index.insert("d2".into(), DocumentIndex::from_text("bird"));
        save(&index, &descriptor).unwrap();

        let CacheOutcome::Hit(loaded) = load(&descriptor) else {
            panic!("expected a cache hit");
        };
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.document("d1").unwrap().count("dog"), 2);
        assert_eq!(loaded.document("d1").unwrap().term_frequency("cat"), 0.5);
    }

    #[test]
    fn garbled_bytes_are_corrupt_not_a_crash() {
        let dir = tempdir().unwrap();
        let descriptor = descriptor_in(dir.path());
        fs::write(cache_path(&descriptor), b"not a cache record").unwrap();
        assert!(matches!(load(&descriptor), CacheOutcome::Corrupt));
    }

    #[test]
    fn truncated_record_is_corrupt() {
        let dir = tempdir().unwrap();
        let descriptor = descriptor_in(dir.path());

        let mut index = CorpusIndex::default();
        index.insert("d1".into(), DocumentIndex::from_text("dog"));
        save(&index, &descriptor).unwrap();

        let path = cache_path(&descriptor);
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();
        assert!(matches!(load(&descriptor), CacheOutcome::Corrupt));
    }
}
