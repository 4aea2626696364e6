#![allow(missing_docs)]
use clap::Parser;
use cuckoo_table::{config, CuckooConfig, CuckooMap};
use std::time::Instant;

/// Fills a cuckoo map with sequential keys and reports how the table evolved.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Number of entries to insert.
    #[arg(default_value_t = 1_000_000)]
    count: u64,
    /// Initial number of buckets.
    #[arg(long, default_value_t = config::DEFAULT_BUCKET_COUNT)]
    buckets: usize,
    /// Slots in each bucket.
    #[arg(long, default_value_t = config::DEFAULT_SLOTS_PER_BUCKET)]
    slots: usize,
    /// Displacement search budget.
    #[arg(long, default_value_t = config::DEFAULT_MAX_DISPLACEMENTS)]
    max_displacements: usize,
    /// Size the table for `count` entries up front.
    #[arg(long)]
    reserve: bool,
}

fn main() -> color_eyre::Result<()> {
    let args = Args::parse();
    color_eyre::install()?;
    cuckoo_logger::setup();

    let config = CuckooConfig::new(args.buckets, args.slots)
        .with_max_displacements(args.max_displacements);
    let mut map: CuckooMap<u64, u64> = CuckooMap::with_config(config)?;
    if args.reserve {
        map.reserve(args.count as usize)?;
        log::info!("reserved {} buckets", map.bucket_count());
    }

    let start = Instant::now();
    for key in 0..args.count {
        map.try_insert(key, !key)?;
    }
    log::info!("inserted {} entries in {:.2?}", map.len(), start.elapsed());
    log::info!("{}", map.stats());
    log::info!("load factor {:.3}", map.as_table().load_factor());

    let start = Instant::now();
    for key in 0..args.count {
        let value = map.try_get(&key)?;
        color_eyre::eyre::ensure!(*value == !key, "wrong value for key {key}");
    }
    log::info!("verified {} entries in {:.2?}", map.len(), start.elapsed());

    let start = Instant::now();
    for key in (0..args.count).step_by(2) {
        map.try_remove(&key)?;
    }
    log::info!(
        "removed every other entry in {:.2?}, {} left",
        start.elapsed(),
        map.len()
    );
    Ok(())
}
