use std::{
    error::Error,
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::PathBuf,
    process::ExitCode,
};

use clap::Parser;
use dspasm::{words_to_bytes_be, Assembler, Settings};
use tracing::Level;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Assembly source file
    source: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pre-defined labels (repeatable)
    #[arg(short = 'D', long, value_name="NAME=val", value_parser = dspasm::parse_defines::<String, i32>)]
    define: Vec<(String, i32)>,

    /// Search directory for included files
    #[arg(short = 'I', long)]
    include: Option<PathBuf>,

    /// Keep assembling and emit output despite errors
    #[arg(short, long)]
    force: bool,

    /// One of `TRACE`, `DEBUG`, `INFO`, `WARN`, or `ERROR`
    #[arg(short, long, default_value_t = Level::INFO)]
    log_level: Level,
}

fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(io::stderr)
        .init();

    if let Err(e) = main_real(args) {
        tracing::error!("{e}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn main_real(args: Args) -> Result<(), Box<dyn Error>> {
    let text = fs::read_to_string(&args.source).map_err(|e| format!("cant open file: {e}"))?;

    let settings = Settings {
        force: args.force,
        ..Settings::default()
    };
    let mut asm = Assembler::new(settings);
    if let Some(dir) = &args.include {
        asm.set_include_dir(dir);
    }
    for (name, val) in &args.define {
        asm.define(name, *val as u16);
    }

    tracing::trace!("starting assembly");
    let words = asm.assemble(&text)?;
    tracing::debug!("assembled {} words", words.len());

    let mut output: Box<dyn Write> = match args.output.clone() {
        Some(path) => Box::new(BufWriter::new(
            File::options()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)
                .map_err(|e| format!("cant open file: {e}"))?,
        )),
        None => Box::new(io::stdout()),
    };

    tracing::trace!("writing");
    output.write_all(&words_to_bytes_be(&words))?;
    output.flush()?;
    Ok(())
}
