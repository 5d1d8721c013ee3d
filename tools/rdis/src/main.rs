//! rdis: disassemble legacy 8/16-bit binary images.
//!
//! Reads a raw image, follows code from the given entry points in the
//! chosen instruction language and prints the listing, followed by a
//! hex dump with the bytes never reached set apart.

use std::fs;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::rc::Rc;

use anyhow::{anyhow, bail, Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rdis_core::hex::{hex_dump, parse_unsigned, Style};
use rdis_core::{decoding, dump_lang, Decoding, LangRegistry};
use rdis_disas::{Api, Disassembler, Format};

#[derive(Parser, Debug)]
#[command(name = "rdis", version)]
#[command(about = "Table-driven disassembler for legacy 8/16-bit images")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Disassemble an image from its entry points
    Dis {
        /// Raw image file
        image: PathBuf,

        /// Language of the entry points given without one
        #[arg(long, default_value = "z80")]
        lang: String,

        /// Load address of the first byte
        #[arg(long, default_value = "0", value_parser = parse_number)]
        origin: u32,

        /// Entry point as ADDR or ADDR:LANG; defaults to the origin
        #[arg(long = "entry", value_name = "ADDR[:LANG]")]
        entries: Vec<String>,

        /// API vector table of the image's platform
        #[arg(long, default_value = "none")]
        api: String,

        /// Character decoding for the hex dump
        #[arg(long, default_value = "ascii")]
        decoding: String,

        /// Directory of .lang and .api files shadowing the built-ins
        #[arg(long, value_name = "DIR")]
        lang_dir: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
        color: ColorChoice,
    },
    /// Hex dump an image
    Hexdump {
        image: PathBuf,

        #[arg(long, default_value = "0", value_parser = parse_number)]
        origin: u32,

        #[arg(long, default_value = "ascii")]
        decoding: String,
    },
    /// Print a compiled language table
    DumpLang {
        name: String,

        #[arg(long, value_name = "DIR")]
        lang_dir: Option<PathBuf>,
    },
    /// List the built-in languages
    Langs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

fn parse_number(s: &str) -> Result<u32, String> {
    parse_unsigned(s).ok_or_else(|| format!("invalid number {s:?}"))
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rdis=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("rdis: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match cli.command {
        Command::Dis {
            image,
            lang,
            origin,
            entries,
            api,
            decoding,
            lang_dir,
            color,
        } => {
            let data = read_image(&image)?;
            let langs = registry(lang_dir.as_deref());
            let api = Api::load(&api, lang_dir.as_deref(), &langs)
                .with_context(|| format!("loading API {api:?}"))?;
            let format = Format::new(origin)
                .with_decoding(lookup_decoding(&decoding)?)
                .with_api(Rc::new(api));

            let mut dis = Disassembler::new(&data, format, &langs);
            if entries.is_empty() {
                let lang = langs
                    .get(&lang)
                    .with_context(|| format!("loading language {lang:?}"))?;
                dis.note_entry_point(origin, &lang);
            }
            for entry in &entries {
                let (address, name) = parse_entry(entry, &lang)?;
                let lang = langs
                    .get(name)
                    .with_context(|| format!("loading language {name:?}"))?;
                dis.note_entry_point(address, &lang);
            }
            debug!(queued = dis.queue_len(), "starting disassembly");
            dis.run();

            let style = match color {
                ColorChoice::Always => Style::Ansi,
                ColorChoice::Never => Style::Plain,
                ColorChoice::Auto if io::stdout().is_terminal() => Style::Ansi,
                ColorChoice::Auto => Style::Plain,
            };
            dis.print_results(&mut out, style)?;
        }
        Command::Hexdump {
            image,
            origin,
            decoding,
        } => {
            let data = read_image(&image)?;
            let decoding = lookup_decoding(&decoding)?;
            hex_dump(
                &data,
                origin,
                Some(decoding.as_ref()),
                None,
                Style::Plain,
                &mut out,
            )?;
        }
        Command::DumpLang { name, lang_dir } => {
            let langs = registry(lang_dir.as_deref());
            let lang = langs
                .get(&name)
                .with_context(|| format!("loading language {name:?}"))?;
            dump_lang(&lang, &mut out)?;
        }
        Command::Langs => {
            for name in LangRegistry::builtin_names() {
                writeln!(out, "{name}")?;
            }
        }
    }
    out.flush()?;
    Ok(())
}

fn read_image(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("reading {}", path.display()))
}

fn registry(lang_dir: Option<&Path>) -> LangRegistry {
    match lang_dir {
        Some(dir) => LangRegistry::new().with_search_path(dir),
        None => LangRegistry::new(),
    }
}

fn lookup_decoding(name: &str) -> Result<Box<dyn Decoding>> {
    decoding::builtin(name).ok_or_else(|| anyhow!("unknown decoding {name:?}"))
}

/// Split `ADDR[:LANG]`, falling back to `default_lang`.
fn parse_entry<'a>(
    entry: &'a str,
    default_lang: &'a str,
) -> Result<(u32, &'a str)> {
    let (address, lang) = match entry.split_once(':') {
        Some((address, lang)) => (address, lang),
        None => (entry, default_lang),
    };
    let Some(address) = parse_unsigned(address) else {
        bail!("invalid entry point {entry:?}");
    };
    Ok((address, lang))
}
