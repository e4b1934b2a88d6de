//! Driver for the skiptable memtable: opens a table from its snapshot, applies
//! commands, and reports results to any writer.

use std::{
    io::Write,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use anyhow::{anyhow, Result};
use rand::Rng;
use skiptable_kv::{Config, DeleteStatus, InsertStatus, MemTable};
use tracing::{debug, info};

pub struct Driver {
    config: Config,
    table: MemTable<String, String>,
}

impl Driver {
    /// An empty table; nothing is read from disk.
    pub fn new(config: Config) -> Result<Driver> {
        let table = MemTable::with_config(&config)?;
        Ok(Driver { config, table })
    }

    /// A table holding whatever the configured snapshot holds, if it exists.
    pub fn open(config: Config) -> Result<Driver> {
        let driver = Driver::new(config)?;
        let path = &driver.config.snapshot_path;
        if path.exists() {
            let report = driver.table.load(path)?;
            debug!(?report, "opened snapshot");
        } else {
            info!(?path, "no snapshot yet, starting empty");
        }
        Ok(driver)
    }

    pub fn table(&self) -> &MemTable<String, String> {
        &self.table
    }

    pub fn persist(&self) -> Result<usize> {
        Ok(self.table.dump(&self.config.snapshot_path)?)
    }

    pub fn put(&self, key: &str, value: &str, out: &mut impl Write) -> Result<InsertStatus> {
        if key.is_empty() || key.contains(|c: char| c == ':' || c == '\n') {
            return Err(anyhow!("key {:?} cannot be stored in a snapshot", key));
        }
        if value.is_empty() || value.contains('\n') {
            return Err(anyhow!("value {:?} cannot be stored in a snapshot", value));
        }
        let status = self.table.insert(key.to_string(), value.to_string());
        writeln!(out, "{:?} {}:{}", status, key, value)?;
        Ok(status)
    }

    pub fn get(&self, key: &str, out: &mut impl Write) -> Result<Option<String>> {
        let value = self.table.search(key);
        match &value {
            Some(value) => writeln!(out, "{}:{}", key, value)?,
            None => writeln!(out, "{} not found", key)?,
        }
        Ok(value)
    }

    pub fn del(&self, key: &str, out: &mut impl Write) -> Result<DeleteStatus> {
        let status = self.table.delete(key);
        writeln!(out, "{:?} {}", status, key)?;
        Ok(status)
    }

    pub fn show(&self, out: &mut impl Write) -> Result<()> {
        let list = self.table.read();
        write!(out, "{}", *list)?;
        writeln!(out, "size: {}", list.size())?;
        Ok(())
    }

    /// Walks through insert, update, search and delete on a fresh table.
    pub fn demo(&self, out: &mut impl Write) -> Result<()> {
        for (key, value) in [("a", "1"), ("c", "3"), ("b", "2")] {
            let _ = self.put(key, value, out)?;
        }
        let ordered: Vec<String> = self.table.scan().map(|(k, v)| format!("{}:{}", k, v)).collect();
        writeln!(out, "scan: {}", ordered.join(" "))?;
        writeln!(out, "size: {}", self.table.size())?;

        self.get("b", out)?;
        let _ = self.del("b", out)?;
        self.get("b", out)?;
        writeln!(out, "size: {}", self.table.size())?;

        let _ = self.put("x", "1", out)?;
        let _ = self.put("x", "2", out)?;
        self.get("x", out)?;

        self.show(out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StressReport {
    pub threads: usize,
    pub ops_per_thread: usize,
    pub inserted: usize,
    pub found: usize,
    pub size: usize,
    pub insert_elapsed: Duration,
    pub search_elapsed: Duration,
}

/// Every thread inserts `ops` random keys into one shared table, then every
/// thread searches `ops` random keys.
pub fn stress(config: &Config, threads: usize, ops: usize) -> Result<StressReport> {
    let table = Arc::new(MemTable::<u32, u32>::with_config(config)?);
    let key_space = u32::try_from(threads.saturating_mul(ops).max(1))?;

    let started = Instant::now();
    let inserted = fan_out(threads, |_| {
        let table = Arc::clone(&table);
        move || {
            let mut rng = rand::thread_rng();
            (0..ops)
                .filter(|_| {
                    let key = rng.gen_range(0..key_space);
                    table.insert(key, key) == InsertStatus::Inserted
                })
                .count()
        }
    })?;
    let insert_elapsed = started.elapsed();

    let started = Instant::now();
    let found = fan_out(threads, |_| {
        let table = Arc::clone(&table);
        move || {
            let mut rng = rand::thread_rng();
            (0..ops)
                .filter(|_| table.contains_key(&rng.gen_range(0..key_space)))
                .count()
        }
    })?;
    let search_elapsed = started.elapsed();

    let report = StressReport {
        threads,
        ops_per_thread: ops,
        inserted,
        found,
        size: table.size(),
        insert_elapsed,
        search_elapsed,
    };
    info!(?report, "stress run finished");
    Ok(report)
}

fn fan_out<F, W>(threads: usize, make: F) -> Result<usize>
where
    F: Fn(usize) -> W,
    W: FnOnce() -> usize + Send + 'static,
{
    let handles: Vec<_> = (0..threads).map(|t| thread::spawn(make(t))).collect();
    let mut total = 0;
    for handle in handles {
        total += handle
            .join()
            .map_err(|_| anyhow!("stress worker panicked"))?;
    }
    Ok(total)
}
