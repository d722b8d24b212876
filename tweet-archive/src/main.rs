use clap::Parser;
use tweet_archive::{init_logging, run, Args};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    run(&args)
}
