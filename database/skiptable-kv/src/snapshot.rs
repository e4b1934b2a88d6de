//! Flat-file snapshots of a skip list.
//!
//! One record per line, `key:value`. Only the first `:` splits a line, so
//! values may contain the delimiter; keys may not. Blank lines, lines without
//! a delimiter, and lines with an empty key or value are skipped on load.

use std::{
    fs::{self, File},
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use bytes::Bytes;
use tracing::{info, warn};

use crate::{error::SnapshotError, skiplist::SkipList};

pub const DELIMITER: u8 = b':';

/// A key or value type that can be stored in a snapshot line.
pub trait SnapshotField: Sized {
    fn encode(&self) -> &[u8];
    /// `None` marks the line as malformed.
    fn decode(raw: &[u8]) -> Option<Self>;
}

impl SnapshotField for String {
    fn encode(&self) -> &[u8] {
        self.as_bytes()
    }

    fn decode(raw: &[u8]) -> Option<Self> {
        std::str::from_utf8(raw).ok().map(str::to_string)
    }
}

impl SnapshotField for Bytes {
    fn encode(&self) -> &[u8] {
        self
    }

    fn decode(raw: &[u8]) -> Option<Self> {
        Some(Bytes::copy_from_slice(raw))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: usize,
}

/// Splits a single line (without its terminator) into a record.
pub fn parse_line<K: SnapshotField, V: SnapshotField>(line: &[u8]) -> Option<(K, V)> {
    let split = line.iter().position(|&b| b == DELIMITER)?;
    let (key, value) = (&line[..split], &line[split + 1..]);
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((K::decode(key)?, V::decode(value)?))
}

/// Feeds every well-formed record of `reader` to `sink`, in file order.
pub fn read_records<K, V, R>(mut reader: R, mut sink: impl FnMut(K, V)) -> io::Result<LoadReport>
where
    K: SnapshotField,
    V: SnapshotField,
    R: BufRead,
{
    let mut report = LoadReport::default();
    let mut line = Vec::new();
    let mut lineno = 0;

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        lineno += 1;

        // Only the terminator goes; anything else, `\r` included, is data.
        let raw = line.strip_suffix(b"\n").unwrap_or(&line);

        match parse_line::<K, V>(raw) {
            Some((key, value)) => {
                sink(key, value);
                report.loaded += 1;
            }
            None => {
                if !raw.is_empty() {
                    warn!(line = lineno, "skipping malformed snapshot record");
                }
                report.skipped += 1;
            }
        }
    }

    Ok(report)
}

/// Writes `key:value\n` for each record and returns how many were written.
pub fn write_records<'a, K, V, W>(
    writer: &mut W,
    records: impl IntoIterator<Item = (&'a K, &'a V)>,
) -> io::Result<usize>
where
    K: SnapshotField + 'a,
    V: SnapshotField + 'a,
    W: Write,
{
    let mut written = 0;
    for (key, value) in records {
        writer.write_all(key.encode())?;
        writer.write_all(&[DELIMITER])?;
        writer.write_all(value.encode())?;
        writer.write_all(b"\n")?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

/// Replays the snapshot at `path` into `list`. Later lines win over earlier
/// ones with the same key.
pub fn load<K, V>(list: &mut SkipList<K, V>, path: impl AsRef<Path>) -> Result<LoadReport, SnapshotError>
where
    K: SnapshotField + Ord,
    V: SnapshotField,
{
    let path = path.as_ref();
    let file = File::open(path).map_err(SnapshotError::io(path))?;
    let report = read_records(BufReader::new(file), |key, value| {
        let _ = list.insert(key, value);
    })
    .map_err(SnapshotError::io(path))?;

    info!(?path, loaded = report.loaded, skipped = report.skipped, "snapshot loaded");
    Ok(report)
}

/// Writes every entry of `list` in ascending key order, replacing whatever
/// was at `path`.
pub fn dump<K, V>(list: &SkipList<K, V>, path: impl AsRef<Path>) -> Result<usize, SnapshotError>
where
    K: SnapshotField,
    V: SnapshotField,
{
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(SnapshotError::io(parent))?;
    }

    let file = File::create(path).map_err(SnapshotError::io(path))?;
    let mut writer = BufWriter::new(file);
    let written = write_records(&mut writer, list.iter()).map_err(SnapshotError::io(path))?;

    info!(?path, written, "snapshot dumped");
    Ok(written)
}
