use std::fs::File;
use std::io::{stdout, Write};
use std::process::ExitCode;

use clap::Parser;

use cli::{banner, init_logging, open_existing, run, CommonArgs};
use common::err::DumpError;
use engine::StoreFlags;

/// Dump a SQLite database's pragmas, schema, and table data to a
/// self-describing binary stream.
#[derive(Parser, Debug)]
#[command(name = "store", version, about = "Dump a SQLite database to a binary stream")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Write the dump to this file instead of stdout.
    #[arg(short = 'o', long, value_name = "FILE")]
    out: Option<std::path::PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config = args.common.load_config();
    let log_factory = init_logging(args.common.debug, config.log_dir.clone());
    let _ = log_factory.log_dir();
    banner("store");

    run("store", || {
        let conn = open_existing(&args.common.dbfile)?;

        let mut flags = StoreFlags::empty();
        if args.common.schema_only {
            flags |= StoreFlags::SCHEMA_ONLY;
        }

        let overrides = args.common.effective_overrides(&config);

        let mut out: Box<dyn Write> = match &args.out {
            Some(path) => Box::new(File::create(path).map_err(|e| DumpError::io("opening output file", e))?),
            None => Box::new(stdout()),
        };

        engine::store(&conn, &mut out, flags, &overrides)?;
        out.flush().map_err(|e| DumpError::io("flushing output", e))
    })
}
