//! ringctl - inspect how a ringcache peer set partitions the keyspace

mod config;
mod report;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ringcache::HashRing;
use serde::Serialize;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Comma-separated peer ids
    #[arg(short, long, global = true)]
    peers: Option<String>,

    /// JSON file holding an array of peer ids
    #[arg(long, global = true)]
    peers_file: Option<PathBuf>,

    /// Virtual nodes per peer
    #[arg(short, long, global = true, default_value_t = 50)]
    replicas: usize,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the owner of each key
    Owner {
        /// Keys to place
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Show the share of sampled keys each peer owns
    Spread {
        /// Number of synthetic keys to place
        #[arg(short, long, default_value_t = 100_000)]
        samples: usize,
    },

    /// Show how many keys move when peers join
    Remap {
        /// Peers joining the ring (comma-separated)
        #[arg(short, long, value_delimiter = ',', required = true)]
        add: Vec<String>,

        /// Number of synthetic keys to place
        #[arg(short, long, default_value_t = 100_000)]
        samples: usize,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let peers = config::load_peers(args.peers.as_deref(), args.peers_file.as_deref())?;
    info!("Building ring: {} peers, {} replicas", peers.len(), args.replicas);

    let mut ring = HashRing::new(args.replicas);
    ring.add(&peers);

    match args.command {
        Command::Owner { keys } => {
            let placements = report::owners(&ring, &keys);
            if args.json {
                return print_json(&placements);
            }
            for placement in placements {
                println!(
                    "{}\t{}",
                    placement.key,
                    placement.owner.as_deref().unwrap_or("-")
                );
            }
        }
        Command::Spread { samples } => {
            let spread = report::spread(&ring, samples);
            if args.json {
                return print_json(&spread);
            }
            println!(
                "{} keys over {} virtual nodes",
                spread.samples, spread.virtual_nodes
            );
            for share in spread.shares {
                println!(
                    "  {:<30} {:>9} {:>7.2}%",
                    share.peer,
                    share.keys,
                    share.fraction * 100.0
                );
            }
        }
        Command::Remap { add, samples } => {
            let remap = report::remap(&ring, &add, samples);
            if args.json {
                return print_json(&remap);
            }
            println!(
                "{} of {} keys moved ({:.2}%)",
                remap.moved,
                remap.samples,
                remap.fraction * 100.0
            );
            for share in remap.moved_to {
                println!("  -> {:<27} {:>9}", share.peer, share.keys);
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
