mod args;
mod backfill;

use clap::Parser;
use log::{debug, LevelFilter};

use std::io;
use std::process::exit;

use crate::args::Args;

fn main() {
    let args = Args::parse();

    let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
    if args.verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
    debug!("main: args: verbose: {}, live: {}", args.verbose, args.live);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = backfill::run(&args, &mut out) {
        eprintln!("ERROR: {}", e);
        if let Some(hint) = e.hint() {
            eprintln!("\n{}", hint);
        }
        exit(1);
    }
}
