use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
struct Args {
    /// Instance file describing the warehouse and its deliveries
    input: PathBuf,

    /// Where to write the time-major schedule
    output: PathBuf,

    /// Seed for the idle-walk shuffle
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Give up on a path once it takes this many times the direct distance
    #[arg(long, default_value_t = 20)]
    detour_factor: i32,

    /// Replay the schedule in the terminal at this frame rate
    #[arg(short, long, default_value_t = 0.)]
    fps: f32,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            println!("{e}");
            std::process::exit(1);
        }
    };

    if let Err(report) = porter::run(
        &args.input,
        &args.output,
        args.seed,
        args.detour_factor,
        args.fps,
    ) {
        println!("{report:?}");
        std::process::exit(1);
    }
}
