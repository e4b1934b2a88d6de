use std::{
    io::{self, Write},
    path::PathBuf,
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use skiptable_c::{stress, Driver};
use skiptable_kv::{
    config::{DEFAULT_MAX_LEVEL, DEFAULT_SNAPSHOT_PATH},
    Config,
};

#[derive(Parser)]
#[command(name = "skiptable")]
#[command(about = "An ordered in-memory key-value table on a skip list")]
struct Cli {
    /// Ceiling for entry levels
    #[arg(long, default_value_t = DEFAULT_MAX_LEVEL)]
    max_level: usize,
    /// Snapshot file read on start and written after changes
    #[arg(long, default_value = DEFAULT_SNAPSHOT_PATH)]
    store: PathBuf,
    /// Fixed seed for level assignment
    #[arg(long)]
    seed: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a short insert/search/delete walkthrough on an empty table
    Demo,
    /// Hammer one shared table from several threads
    Stress {
        #[arg(long, default_value_t = 4)]
        threads: usize,
        #[arg(long, default_value_t = 100_000)]
        ops: usize,
    },
    /// Insert or update a key
    Put { key: String, value: String },
    /// Look a key up
    Get { key: String },
    /// Delete a key
    Del { key: String },
    /// Print every level of the table
    Show,
}

fn main() -> Result<()> {
    setup_logging()?;
    cmain(Cli::parse())
}

fn cmain(cli: Cli) -> Result<()> {
    let config = Config::new()
        .max_level(cli.max_level)
        .snapshot_path(&cli.store)
        .seed(cli.seed);
    config.validate()?;

    let mut out = io::stdout().lock();
    match cli.command {
        Commands::Demo => Driver::new(config)?.demo(&mut out)?,
        Commands::Stress { threads, ops } => {
            let report = stress(&config, threads, ops)?;
            writeln!(
                out,
                "{} threads x {} ops: inserted {} in {:?}, found {} in {:?}, size {}",
                report.threads,
                report.ops_per_thread,
                report.inserted,
                report.insert_elapsed,
                report.found,
                report.search_elapsed,
                report.size
            )?;
        }
        Commands::Put { key, value } => {
            let driver = Driver::open(config)?;
            let _ = driver.put(&key, &value, &mut out)?;
            driver.persist()?;
        }
        Commands::Get { key } => {
            Driver::open(config)?.get(&key, &mut out)?;
        }
        Commands::Del { key } => {
            let driver = Driver::open(config)?;
            let _ = driver.del(&key, &mut out)?;
            driver.persist()?;
        }
        Commands::Show => Driver::open(config)?.show(&mut out)?,
    }
    Ok(())
}

fn setup_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn run(store: &std::path::Path, args: &[&str]) -> Result<()> {
        let store = store.to_str().unwrap();
        let argv = ["skiptable", "--max-level", "6", "--store", store];
        cmain(Cli::try_parse_from(argv.iter().chain(args))?)
    }

    #[test]
    fn put_and_del_persist_through_cmain() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("store").join("dumpFile");

        run(&store, &["put", "b", "2\r"]).unwrap();
        run(&store, &["put", "a", "1"]).unwrap();
        assert_eq!(fs::read_to_string(&store).unwrap(), "a:1\nb:2\r\n");

        run(&store, &["del", "a"]).unwrap();
        assert_eq!(fs::read_to_string(&store).unwrap(), "b:2\r\n");
    }

    #[test]
    fn zero_max_level_is_refused() {
        let cli = Cli::try_parse_from(["skiptable", "--max-level", "0", "show"]).unwrap();
        assert!(cmain(cli).is_err());
    }
}
