use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use clap::Parser;
use tandem_drain::config::DEFAULT_NUM_ELEMENTS;
use tandem_drain::{Coordinator, Direction, DrainConfig};

/// Populates a list with random values, drains it from both ends and prints
/// what each worker counted.
#[derive(Parser, Debug)]
#[command(name = "tandem-drain", version, about)]
struct Args {
    /// Number of nodes to populate the list with
    #[arg(short = 'n', long, default_value_t = DEFAULT_NUM_ELEMENTS)]
    num_elements: usize,

    /// Refuse to hold more than this many nodes (exercises the out of memory path)
    #[arg(long)]
    node_limit: Option<usize>,

    /// Stack size in bytes for the worker threads
    #[arg(long)]
    stack_size: Option<usize>,

    /// Request shutdown this many milliseconds after start instead of letting
    /// both workers drain the list
    #[arg(long)]
    cancel_after_ms: Option<u64>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut builder = DrainConfig::builder().num_elements(args.num_elements);
    if let Some(limit) = args.node_limit {
        builder = builder.node_limit(limit);
    }
    if let Some(bytes) = args.stack_size {
        builder = builder.stack_size(bytes);
    }
    let config = builder.build();

    let mut coordinator = match Coordinator::initialize(&config) {
        Ok(coordinator) => coordinator,
        Err(error) => {
            log::error!("initialization failed: {error}");
            return ExitCode::FAILURE;
        }
    };

    match args.cancel_after_ms {
        Some(delay) => thread::sleep(Duration::from_millis(delay)),
        None => {
            for direction in Direction::ALL {
                coordinator.join(direction);
            }
        }
    }

    let report = coordinator.shutdown();
    println!("{report}");

    ExitCode::SUCCESS
}
