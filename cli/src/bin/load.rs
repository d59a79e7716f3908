use std::fs::File;
use std::io::{stdin, Read};
use std::process::ExitCode;

use clap::Parser;

use cli::{banner, init_logging, open_existing, run, CommonArgs};
use common::err::DumpError;
use engine::LoadFlags;

/// Restore a fresh SQLite database from a binary dump stream produced by
/// `store`.
#[derive(Parser, Debug)]
#[command(name = "load", version, about = "Restore a SQLite database from a binary stream")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Read the dump from this file instead of stdin.
    #[arg(short = 'i', long, value_name = "FILE")]
    input: Option<std::path::PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config = args.common.load_config();
    let log_factory = init_logging(args.common.debug, config.log_dir.clone());
    let _ = log_factory.log_dir();
    banner("load");

    run("load", || {
        let conn = open_existing(&args.common.dbfile)?;

        let mut flags = LoadFlags::empty();
        if args.common.schema_only {
            flags |= LoadFlags::SCHEMA_ONLY;
        }

        let overrides = args.common.effective_overrides(&config);

        let mut input: Box<dyn Read> = match &args.input {
            Some(path) => Box::new(File::open(path).map_err(|e| DumpError::io("opening input file", e))?),
            None => Box::new(stdin()),
        };

        engine::load(&conn, &mut input, flags, &overrides)
    })
}
