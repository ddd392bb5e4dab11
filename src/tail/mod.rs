//! Log file tailing
//!
//! Polls a growing text file and hands back only the lines appended
//! since the previous poll. Only newline-terminated lines are emitted;
//! an unterminated tail stays unconsumed until its newline arrives.
//!
//! Truncation and rotation are not handled: if the file shrinks below
//! the cursor, nothing is read until it grows past the cursor again.

use log::{debug, info, warn};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Read position within the tailed file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TailCursor {
    /// End of the last complete line consumed
    pub byte_offset: u64,
    /// Last observed modification time
    pub modification_time: Option<SystemTime>,
    /// File length at the last poll that touched the file
    pub observed_len: u64,
}

/// Result of one poll
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TailUpdate {
    /// File changed since the last poll (new bytes or newer mtime)
    pub grew: bool,
    /// Complete lines appended since the last poll, newline stripped
    pub lines: Vec<String>,
}

/// Incremental reader for an append-only log file
#[derive(Debug, Clone)]
pub struct FileTailer {
    path: PathBuf,
    cursor: TailCursor,
}

impl FileTailer {
    /// Tailer that will read the file from the beginning
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cursor: TailCursor::default(),
        }
    }

    /// Attach to a file: bulk-load its existing complete lines and seed
    /// the cursor after them so later polls only see appended lines.
    ///
    /// A missing file is not an error; it is picked up once created.
    pub fn attach(path: impl Into<PathBuf>) -> (Self, Vec<String>) {
        let mut tailer = Self::new(path);

        let meta = match std::fs::metadata(&tailer.path) {
            Ok(meta) => meta,
            Err(e) => {
                warn!(
                    "Could not open log file '{}' ({}) - create it with chat lines",
                    tailer.path.display(),
                    e
                );
                return (tailer, Vec::new());
            }
        };

        match read_complete_lines(&tailer.path, 0) {
            Ok((lines, offset)) => {
                tailer.cursor = TailCursor {
                    byte_offset: offset,
                    modification_time: meta.modified().ok(),
                    observed_len: meta.len(),
                };
                info!(
                    "Attached to '{}': {} existing lines, cursor at {}",
                    tailer.path.display(),
                    lines.len(),
                    offset
                );
                (tailer, lines)
            }
            Err(e) => {
                warn!("Failed to read log file '{}': {}", tailer.path.display(), e);
                (tailer, Vec::new())
            }
        }
    }

    /// Read lines appended since the last poll.
    ///
    /// I/O failures are treated as "nothing new" and retried next poll.
    pub fn poll(&mut self) -> TailUpdate {
        let meta = match std::fs::metadata(&self.path) {
            Ok(meta) => meta,
            Err(e) => {
                debug!("Stat failed for {}: {}", self.path.display(), e);
                return TailUpdate::default();
            }
        };

        let size = meta.len();
        let mtime = meta.modified().ok();
        let not_newer = match (mtime, self.cursor.modification_time) {
            (Some(now), Some(seen)) => now <= seen,
            (None, _) => true,
            (Some(_), None) => false,
        };

        if not_newer && size <= self.cursor.byte_offset {
            return TailUpdate::default();
        }

        let grew = !not_newer || size > self.cursor.observed_len;
        if size < self.cursor.byte_offset {
            warn!(
                "{} shrank to {} bytes, below cursor {} (truncation is not handled)",
                self.path.display(),
                size,
                self.cursor.byte_offset
            );
        }

        let lines = match read_complete_lines(&self.path, self.cursor.byte_offset) {
            Ok((lines, offset)) => {
                debug!(
                    "Polled {}: {} new bytes, {} lines",
                    self.path.display(),
                    offset - self.cursor.byte_offset,
                    lines.len()
                );
                self.cursor.byte_offset = offset;
                lines
            }
            Err(e) => {
                debug!("Failed to read {}: {}", self.path.display(), e);
                return TailUpdate {
                    grew,
                    lines: Vec::new(),
                };
            }
        };

        self.cursor.modification_time = mtime;
        self.cursor.observed_len = size;

        TailUpdate { grew, lines }
    }

    pub fn cursor(&self) -> &TailCursor {
        &self.cursor
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read newline-terminated lines starting at `offset`.
///
/// Returns the lines and the offset just past the last complete one.
fn read_complete_lines(path: &Path, offset: u64) -> io::Result<(Vec<String>, u64)> {
    let mut reader = BufReader::new(File::open(path)?);
    reader.seek(SeekFrom::Start(offset))?;

    let mut lines = Vec::new();
    let mut pos = offset;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf)?;
        if n == 0 || buf.last() != Some(&b'\n') {
            break;
        }
        pos += n as u64;
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
        lines.push(String::from_utf8_lossy(&buf).into_owned());
    }

    Ok((lines, pos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn append(path: &Path, text: &str) {
        let mut f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .unwrap();
        f.write_all(text.as_bytes()).unwrap();
    }

    #[test]
    fn test_attach_bulk_loads_existing_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        append(&path, "first\nsecond\n");

        let (mut tailer, lines) = FileTailer::attach(&path);
        assert_eq!(lines, vec!["first", "second"]);
        assert_eq!(tailer.cursor().byte_offset, 13);
        assert!(tailer.poll().lines.is_empty());
    }

    #[test]
    fn test_poll_without_writes_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        append(&path, "old\n");
        let (mut tailer, _) = FileTailer::attach(&path);

        assert_eq!(tailer.poll(), TailUpdate::default());
        assert_eq!(tailer.poll(), TailUpdate::default());
    }

    #[test]
    fn test_one_line_is_emitted_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        append(&path, "old\n");
        let (mut tailer, _) = FileTailer::attach(&path);

        append(&path, "user: hello there\n");
        let update = tailer.poll();
        assert!(update.grew);
        assert_eq!(update.lines, vec!["user: hello there"]);

        let update = tailer.poll();
        assert!(!update.grew);
        assert!(update.lines.is_empty());
    }

    #[test]
    fn test_partial_line_is_deferred() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        append(&path, "");
        let (mut tailer, _) = FileTailer::attach(&path);

        append(&path, "half a li");
        let update = tailer.poll();
        assert!(update.grew);
        assert!(update.lines.is_empty());
        assert_eq!(tailer.cursor().byte_offset, 0);

        // Re-scan with nothing new does not count as growth
        let update = tailer.poll();
        assert!(!update.grew);
        assert!(update.lines.is_empty());

        append(&path, "ne\n");
        assert_eq!(tailer.poll().lines, vec!["half a line"]);
        assert!(tailer.poll().lines.is_empty());
    }

    #[test]
    fn test_attach_leaves_unterminated_tail_for_later() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        append(&path, "done\npend");

        let (mut tailer, lines) = FileTailer::attach(&path);
        assert_eq!(lines, vec!["done"]);
        assert_eq!(tailer.cursor().byte_offset, 5);

        append(&path, "ing\n");
        assert_eq!(tailer.poll().lines, vec!["pending"]);
    }

    #[test]
    fn test_several_lines_in_one_poll() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        append(&path, "");
        let (mut tailer, _) = FileTailer::attach(&path);

        append(&path, "a\n\nb: c\n");
        assert_eq!(tailer.poll().lines, vec!["a", "", "b: c"]);
    }

    #[test]
    fn test_missing_file_is_transient() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("later.txt");

        let (mut tailer, lines) = FileTailer::attach(&path);
        assert!(lines.is_empty());
        assert_eq!(tailer.poll(), TailUpdate::default());

        append(&path, "now it exists\n");
        let update = tailer.poll();
        assert!(update.grew);
        assert_eq!(update.lines, vec!["now it exists"]);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        std::fs::write(&path, b"ok \xff\n").unwrap();
        let (_, lines) = FileTailer::attach(&path);
        assert_eq!(lines, vec!["ok \u{fffd}"]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        append(&path, "dos: line\r\n");
        let (_, lines) = FileTailer::attach(&path);
        assert_eq!(lines, vec!["dos: line"]);
    }
}
