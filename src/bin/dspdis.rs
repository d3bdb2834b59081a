use std::{
    error::Error,
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::PathBuf,
    process::ExitCode,
};

use clap::Parser;
use dspasm::{bytes_to_words_be, Disassembler, Settings};
use indexmap::IndexMap;
use serde::{de, Deserialize, Deserializer};
use serde_derive::Deserialize;
use tracing::Level;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// DSP binary image of big-endian 16-bit words
    binary: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Prefix each line with its program counter
    #[arg(long)]
    show_pc: bool,

    /// Prefix each line with the raw instruction words
    #[arg(long)]
    show_hex: bool,

    /// Print raw addresses instead of named hardware registers
    #[arg(long)]
    no_names: bool,

    /// Print register numbers instead of register names
    #[arg(long)]
    no_registers: bool,

    /// Lower-case mnemonics
    #[arg(long)]
    lower_case: bool,

    /// Separate mnemonics from operands with a tab
    #[arg(long)]
    tabs: bool,

    /// TOML file with a `[symbols]` table of NAME = "address" pairs
    #[arg(short, long)]
    symbols: Option<PathBuf>,

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
    let bytes = fs::read(&args.binary).map_err(|e| format!("cant open file: {e}"))?;
    let words = bytes_to_words_be(&bytes);

    let settings = Settings {
        show_pc: args.show_pc,
        show_hex: args.show_hex,
        decode_names: !args.no_names,
        decode_registers: !args.no_registers,
        lower_case_ops: args.lower_case,
        print_tabs: args.tabs,
        ..Settings::default()
    };
    let mut dis = Disassembler::new(settings);

    if let Some(path) = &args.symbols {
        let text = fs::read_to_string(path).map_err(|e| format!("cant open file: {e}"))?;
        let file: SymbolFile = toml::from_str(&text)?;
        for (name, addr) in file.symbols {
            dis.add_name(addr, name);
        }
    }

    tracing::trace!("disassembling {} words", words.len());
    let mut text = String::new();
    let clean = dis.disassemble(&words, &mut text);

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
    output.write_all(text.as_bytes())?;
    output.flush()?;

    if !clean {
        return Err("some words did not decode cleanly".into());
    }
    Ok(())
}

#[derive(Deserialize)]
struct SymbolFile {
    #[serde(deserialize_with = "deserialize_symbols")]
    symbols: IndexMap<String, u16>,
}

fn deserialize_symbols<'de, D>(deserializer: D) -> Result<IndexMap<String, u16>, D::Error>
where
    D: Deserializer<'de>,
{
    let string_map = IndexMap::<String, String>::deserialize(deserializer)?;
    let mut map = IndexMap::new();
    for (name, buf) in string_map {
        let value = if let Some(hex) = buf.strip_prefix("0x").or_else(|| buf.strip_prefix("0X")) {
            u16::from_str_radix(hex, 16).map_err(|e| {
                de::Error::custom(format!("{buf} is not a valid base 16 address: {e}"))
            })?
        } else {
            buf.parse::<u16>().map_err(|e| {
                de::Error::custom(format!("{buf} is not a valid base 10 address: {e}"))
            })?
        };
        map.insert(name, value);
    }
    Ok(map)
}
