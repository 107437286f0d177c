//! Command line reader for texts, links and notes.
//!
//! ```bash
//! folio parse "Genesis 1:4-6"
//! folio text "Genesis 1:4" --context
//! folio links "Genesis 1" --filter Rashi
//! ```
//!
//! Output is JSON on stdout. Configuration is read from the platform config
//! directory, `--config`, and `FOLIO_` environment variables.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use derive_more::{Display, Error};
use exn::ResultExt;
use folio_client::Library;
use folio_config::Config;
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

type Result<T> = std::result::Result<T, exn::Exn<ErrorKind>>;

#[derive(Debug, Display, Error)]
enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("could not start the library")]
    Startup,
    #[display("{_0} failed")]
    Command(#[error(not(source))] &'static str),
    #[display("could not write output")]
    Output,
}

#[derive(Parser, Debug)]
#[command(name = "folio", about = "Read texts, links and notes by ref")]
struct Args {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, env = "FOLIO_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a ref and print its structured, normal and display forms
    Parse { reference: String },
    /// Fetch the text of a ref
    Text {
        reference: String,
        /// Include the surrounding section
        #[arg(long)]
        context: bool,
        /// Version title, e.g. "The Contemporary Torah, Jewish Publication Society, 2006"
        #[arg(long, requires = "language")]
        version: Option<String>,
        /// Language of the version ("en" or "he")
        #[arg(long, requires = "version")]
        language: Option<String>,
    },
    /// Fetch the links of a ref
    Links {
        reference: String,
        /// Only links from this category or collective title; `<name>|Quoting`
        /// for quoting commentary. May be repeated.
        #[arg(long)]
        filter: Vec<String>,
    },
    /// Fetch the notes of a ref
    Notes { reference: String },
    /// Fetch the source sheets of a ref
    Sheets { reference: String },
    /// Ask the API what a name refers to
    Name {
        query: String,
        /// Only complete refs
        #[arg(long)]
        ref_only: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let config = match Config::load(args.config.as_deref()).or_raise(|| ErrorKind::Config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err:?}");
            return ExitCode::FAILURE;
        },
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.filter));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    match run(&config, args.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{}", *err);
            eprintln!("{err:?}");
            ExitCode::FAILURE
        },
    }
}

async fn run(config: &Config, command: Command) -> Result<()> {
    let library = Library::from_config(config).await.or_raise(|| ErrorKind::Startup)?;
    let output = match command {
        Command::Parse { reference } => {
            let parsed = library.resolve_ref(&reference).await.or_raise(|| ErrorKind::Command("parse"))?;
            let parser = library.parser();
            json!({
                "parsed": parsed,
                "normal": parser.normalize(&parsed.reference),
                "display": parser.humanize(&parsed.reference),
                "sectionRef": parser.section_ref(&parsed.reference).ok(),
            })
        },
        Command::Text { reference, context, version, language } => {
            let reference = resolve(&library, &reference, "text").await?;
            let mut settings = library.text_settings().with_context(context);
            if let (Some(language), Some(version)) = (language, version) {
                settings = settings.with_version(language, version);
            }
            let payload = library.texts().get_or_fetch(&reference, &settings).await.or_raise(|| ErrorKind::Command("text"))?;
            to_value(payload.as_ref())?
        },
        Command::Links { reference, filter } => {
            let reference = resolve(&library, &reference, "links").await?;
            library.related().links(&reference).await.or_raise(|| ErrorKind::Command("links"))?;
            to_value(&library.related().links_filtered(&reference, &filter))?
        },
        Command::Notes { reference } => {
            let reference = resolve(&library, &reference, "notes").await?;
            let notes = library.related().notes(&reference).await.or_raise(|| ErrorKind::Command("notes"))?;
            to_value(notes.as_ref())?
        },
        Command::Sheets { reference } => {
            let reference = resolve(&library, &reference, "sheets").await?;
            let sheets = library.related().sheets(&reference).await.or_raise(|| ErrorKind::Command("sheets"))?;
            to_value(sheets.as_ref())?
        },
        Command::Name { query, ref_only } => {
            let response = library.names().lookup(&query, ref_only).await.or_raise(|| ErrorKind::Command("name"))?;
            to_value(response.as_ref())?
        },
    };
    let rendered = serde_json::to_string_pretty(&output).or_raise(|| ErrorKind::Output)?;
    println!("{rendered}");
    Ok(())
}

/// The display form of a user-typed ref, repairing its capitalization if
/// needed.
async fn resolve(library: &Library, reference: &str, command: &'static str) -> Result<String> {
    let parsed = library.resolve_ref(reference).await.or_raise(|| ErrorKind::Command(command))?;
    Ok(library.parser().humanize(&parsed.reference))
}

fn to_value(value: &impl serde::Serialize) -> Result<Value> {
    serde_json::to_value(value).or_raise(|| ErrorKind::Output)
}
