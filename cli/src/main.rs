use clap::{CommandFactory, Parser, ValueEnum};
use hyconf::{Document, LoadOptions, Syntax, Value};
use serde::Serialize;
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "hyconf")]
#[command(about = "Inspect hybrid INI/TOML/YAML configuration files", long_about = None)]
#[command(after_help = "\x1b[1;4mExamples:\x1b[0m
  Print a whole configuration file as JSON:
    \x1b[1mhyconf\x1b[0m app.conf

  Read one key from a section:
    \x1b[1mhyconf\x1b[0m app.conf --section db --get port

  Override values before printing as YAML:
    \x1b[1mhyconf\x1b[0m app.conf --set 'db.port=6432' --format yaml

  Parse raw text:
    \x1b[1mhyconf\x1b[0m 'name = demo'")]
struct Cli {
    #[arg(help = "Input source: file path or raw configuration text")]
    input: Option<String>,

    #[arg(short = 'c', long = "conf", value_name = "FILE", help = "Configuration file to load")]
    conf: Option<String>,

    #[arg(long, value_enum, help = "Line syntax (default: from the file extension)")]
    syntax: Option<SyntaxArg>,

    #[arg(short, long, help = "Section to read from")]
    section: Option<String>,

    #[arg(short, long, value_name = "KEY", help = "Print only the value at this dotted key")]
    get: Option<String>,

    #[arg(long = "set", value_name = "KEY=VALUE", help = "Assign a value before printing (repeatable)")]
    set: Vec<String>,

    #[arg(short, long, value_enum, default_value_t = Format::Json, help = "Output format")]
    format: Format,

    #[arg(short, long, action = clap::ArgAction::Count, help = "Increase log verbosity (-v, -vv, -vvv)")]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SyntaxArg {
    Ini,
    Yaml,
}

impl From<SyntaxArg> for Syntax {
    fn from(arg: SyntaxArg) -> Self {
        match arg {
            SyntaxArg::Ini => Syntax::Ini,
            SyntaxArg::Yaml => Syntax::Yaml,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = process(&cli) {
        eprintln!("Error: {}\n", e);
        let _ = Cli::command().print_help();
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_document(cli: &Cli) -> Result<Document, Box<dyn std::error::Error>> {
    let mut options = LoadOptions::new();
    if let Some(syntax) = cli.syntax {
        options = options.with_syntax(syntax.into());
    }

    let source = cli
        .conf
        .as_deref()
        .or(cli.input.as_deref())
        .ok_or("no input given; pass a file path, raw text or --conf FILE")?;

    let is_file = Path::new(source).exists();
    tracing::debug!(is_file, "reading input");

    let document = if is_file {
        hyconf::load_with_options(source, &options)?
    } else {
        hyconf::from_str_with_options(source, &options)?
    };
    Ok(document)
}

fn process(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut document = load_document(cli)?;
    let section = cli.section.as_deref();

    for assignment in &cli.set {
        let (key, raw) = assignment
            .split_once('=')
            .ok_or_else(|| format!("--set expects KEY=VALUE, got '{}'", assignment))?;
        document.set_parsed(key.trim(), raw.trim(), section)?;
    }

    if let Some(key) = &cli.get {
        let value = document
            .get(key, section)
            .ok_or_else(|| format!("key '{}' not found", key))?;
        return match value {
            Value::Scalar(text) => {
                println!("{}", text);
                Ok(())
            }
            other => print_value(&other, cli.format),
        };
    }

    if let Some(name) = section {
        let table = document
            .get_section(name)
            .ok_or_else(|| format!("section '{}' not found", name))?;
        return print_value(&table, cli.format);
    }

    print_value(&document, cli.format)
}

fn print_value<T: Serialize>(value: &T, format: Format) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(value)?),
        Format::Yaml => print!("{}", serde_yaml::to_string(value)?),
    }
    Ok(())
}
