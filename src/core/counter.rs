//! Persistent lifetime keystroke counter.
//!
//! The counter lives in memory as an [`AtomicU64`] so the event loop can bump
//! it while the autosave thread reads it. On disk it is a single 8-byte
//! little-endian integer with no header. A missing record means zero.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Size of the on-disk record in bytes.
pub const RECORD_LEN: usize = 8;

/// Directory name under the per-user data directory.
pub const APP_DIR_NAME: &str = "WpmMeter";

/// File name of the counter record.
pub const RECORD_FILE_NAME: &str = "keystrokes.bin";

/// Errors from loading or persisting the counter record.
#[derive(Debug)]
pub enum CounterError {
    /// Could not determine the per-user data directory
    NoDataDir,
    /// The record exists but is not a valid 8-byte integer
    Corrupt { path: PathBuf, len: u64 },
    /// IO error reading or writing the record
    Io(io::Error),
}

impl std::fmt::Display for CounterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CounterError::NoDataDir => write!(f, "Could not determine data directory"),
            CounterError::Corrupt { path, len } => write!(
                f,
                "Corrupt counter record at {}: expected {RECORD_LEN} bytes, found {len}",
                path.display()
            ),
            CounterError::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for CounterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CounterError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CounterError {
    fn from(e: io::Error) -> Self {
        CounterError::Io(e)
    }
}

/// Default record location: `<data dir>/WpmMeter/keystrokes.bin`.
pub fn default_record_path() -> Result<PathBuf, CounterError> {
    let data_dir = dirs::data_dir().ok_or(CounterError::NoDataDir)?;
    Ok(data_dir.join(APP_DIR_NAME).join(RECORD_FILE_NAME))
}

/// Cumulative keystroke counter with load/persist against a byte record.
#[derive(Debug, Default)]
pub struct CounterStore {
    keystrokes: AtomicU64,
}

impl CounterStore {
    /// Create a counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a counter starting at `value`.
    pub fn with_value(value: u64) -> Self {
        Self {
            keystrokes: AtomicU64::new(value),
        }
    }

    /// Record one accepted keystroke.
    pub fn increment(&self) {
        self.keystrokes.fetch_add(1, Ordering::Relaxed);
    }

    /// Current value.
    pub fn snapshot(&self) -> u64 {
        self.keystrokes.load(Ordering::Relaxed)
    }

    /// Write the current value to `path`.
    ///
    /// The record is written to a temporary file next to `path` and renamed
    /// over it, so readers see either the previous record or the new one.
    pub fn persist(&self, path: &Path) -> Result<(), CounterError> {
        let value = self.snapshot();
        write_record(path, value)?;
        tracing::debug!(keystrokes = value, path = %path.display(), "persisted counter");
        Ok(())
    }

    /// Replace the in-memory value with the record at `path`.
    ///
    /// Returns 0 without error when no record exists.
    pub fn load(&self, path: &Path) -> Result<u64, CounterError> {
        let value = read_record(path)?;
        self.keystrokes.store(value, Ordering::Relaxed);
        tracing::debug!(keystrokes = value, path = %path.display(), "loaded counter");
        Ok(value)
    }
}

/// Thread-safe shared counter.
pub type SharedCounter = Arc<CounterStore>;

/// Create a new shared counter starting at zero.
pub fn create_shared_counter() -> SharedCounter {
    Arc::new(CounterStore::new())
}

/// Read a record without touching any counter.
///
/// The length is checked before anything is read, so a stray large file is
/// rejected without being buffered.
pub fn read_record(path: &Path) -> Result<u64, CounterError> {
    let mut file = match fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(CounterError::Io(e)),
    };

    let len = file.metadata()?.len();
    if len != RECORD_LEN as u64 {
        return Err(CounterError::Corrupt {
            path: path.to_path_buf(),
            len,
        });
    }

    let mut record = [0u8; RECORD_LEN];
    file.read_exact(&mut record)?;
    Ok(u64::from_le_bytes(record))
}

fn write_record(path: &Path, value: u64) -> Result<(), CounterError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(&value.to_le_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| CounterError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;
    use tempfile::tempdir;

    #[test]
    fn test_increment_and_snapshot() {
        let counter = CounterStore::new();
        assert_eq!(counter.snapshot(), 0);

        counter.increment();
        counter.increment();
        assert_eq!(counter.snapshot(), 2);
        // snapshot does not mutate
        assert_eq!(counter.snapshot(), 2);
    }

    #[test]
    fn test_concurrent_callers_each_increment_once() {
        for n in [1usize, 100] {
            let counter = create_shared_counter();
            let barrier = Arc::new(Barrier::new(n));

            let handles: Vec<_> = (0..n)
                .map(|_| {
                    let counter = counter.clone();
                    let barrier = barrier.clone();
                    thread::spawn(move || {
                        barrier.wait();
                        counter.increment();
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }

            assert_eq!(counter.snapshot(), n as u64);
        }
    }

    #[test]
    fn test_many_increments_across_threads() {
        let n = 10_000usize;
        let threads = 8;
        let counter = create_shared_counter();

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let counter = counter.clone();
                thread::spawn(move || {
                    for i in 0..n {
                        if i % threads == t {
                            counter.increment();
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counter.snapshot(), n as u64);
    }

    #[test]
    fn test_persist_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(RECORD_FILE_NAME);

        for value in [0u64, 1, 1_234_567, u32::MAX as u64 + 1, u64::MAX] {
            CounterStore::with_value(value).persist(&path).unwrap();

            let restored = CounterStore::new();
            assert_eq!(restored.load(&path).unwrap(), value);
            assert_eq!(restored.snapshot(), value);
        }
    }

    #[test]
    fn test_record_is_little_endian() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(RECORD_FILE_NAME);

        CounterStore::with_value(0x0102_0304_0506_0708)
            .persist(&path)
            .unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes, vec![0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_persist_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(APP_DIR_NAME).join(RECORD_FILE_NAME);

        CounterStore::with_value(42).persist(&path).unwrap();
        assert_eq!(read_record(&path).unwrap(), 42);
    }

    #[test]
    fn test_persist_replaces_previous_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(RECORD_FILE_NAME);

        CounterStore::with_value(7).persist(&path).unwrap();
        CounterStore::with_value(9).persist(&path).unwrap();

        assert_eq!(fs::read(&path).unwrap().len(), RECORD_LEN);
        assert_eq!(read_record(&path).unwrap(), 9);
        // no stray temp files left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_load_missing_is_zero() {
        let dir = tempdir().unwrap();
        let counter = CounterStore::with_value(5);

        let value = counter.load(&dir.path().join("missing.bin")).unwrap();
        assert_eq!(value, 0);
        assert_eq!(counter.snapshot(), 0);
    }

    #[test]
    fn test_load_short_record_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(RECORD_FILE_NAME);
        fs::write(&path, [1u8, 2, 3]).unwrap();

        let counter = CounterStore::with_value(5);
        let err = counter.load(&path).unwrap_err();

        assert!(matches!(err, CounterError::Corrupt { len: 3, .. }));
        // a failed load leaves the in-memory value alone
        assert_eq!(counter.snapshot(), 5);
    }

    #[test]
    fn test_load_empty_record_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(RECORD_FILE_NAME);
        fs::write(&path, b"").unwrap();

        assert!(matches!(
            read_record(&path),
            Err(CounterError::Corrupt { len: 0, .. })
        ));
    }

    #[test]
    fn test_load_oversized_record_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(RECORD_FILE_NAME);
        fs::write(&path, [0u8; 12]).unwrap();

        assert!(matches!(
            read_record(&path),
            Err(CounterError::Corrupt { len: 12, .. })
        ));
    }

    #[test]
    fn test_large_record_rejected_by_length() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(RECORD_FILE_NAME);
        let len = 1u64 << 30;
        // sparse, so the test itself stays cheap
        fs::File::create(&path).unwrap().set_len(len).unwrap();

        match read_record(&path) {
            Err(CounterError::Corrupt { len: found, .. }) => assert_eq!(found, len),
            other => panic!("expected corrupt record, got {other:?}"),
        }
    }

    #[test]
    fn test_error_display() {
        let err = CounterError::NoDataDir;
        assert_eq!(err.to_string(), "Could not determine data directory");

        let err = CounterError::Corrupt {
            path: PathBuf::from("keystrokes.bin"),
            len: 3,
        };
        assert!(err.to_string().contains("expected 8 bytes, found 3"));
    }

    #[test]
    fn test_default_record_path() {
        if let Ok(path) = default_record_path() {
            assert!(path.ends_with(Path::new(APP_DIR_NAME).join(RECORD_FILE_NAME)));
        }
    }
}
