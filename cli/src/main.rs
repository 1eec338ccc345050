//! ys-load - evaluate a YAMLScript document and print the result as JSON
//!
//! ```text
//! ys-load config.ys
//! echo 'a: 1' | ys-load --pretty
//! ys-load --compile program.ys
//! ```

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use yamlscript_binding::{Error, Evaluator, LibraryConfig};

#[derive(Debug, Parser)]
#[command(name = "ys-load", version, about = "Evaluate YAMLScript via libyamlscript")]
struct Cli {
    /// Input file; reads stdin when omitted or "-"
    input: Option<PathBuf>,

    /// Print the Clojure compilation instead of evaluating
    #[arg(long)]
    compile: bool,

    /// Path to the libyamlscript shared library
    #[arg(long, value_name = "PATH")]
    library: Option<PathBuf>,

    /// libyamlscript version to search for
    #[arg(long = "lib-version", value_name = "VERSION")]
    lib_version: Option<String>,

    /// JSON file with library settings
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Library settings: config file (or environment), then flags
    fn library_config(&self) -> Result<LibraryConfig, Error> {
        let mut config = match &self.config {
            Some(path) => LibraryConfig::from_json_file(path)?,
            None => LibraryConfig::from_env(),
        };
        if let Some(path) = &self.library {
            config.path = Some(path.clone());
        }
        if let Some(version) = &self.lib_version {
            config.version = version.clone();
        }
        Ok(config)
    }

    fn read_input(&self) -> io::Result<String> {
        match &self.input {
            Some(path) if path.as_os_str() != "-" => fs::read_to_string(path),
            _ => {
                let mut buffer = String::new();
                io::stdin().read_to_string(&mut buffer)?;
                Ok(buffer)
            }
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<String, Box<dyn std::error::Error>> {
    let input = cli.read_input()?;
    let config = cli.library_config()?;
    tracing::debug!(?config, "library config");

    let ys = Evaluator::new(&config)?;
    let output = if cli.compile {
        ys.compile(&input)
    } else {
        ys.load(&input).map(|value| {
            if cli.pretty {
                format!("{:#}", value)
            } else {
                value.to_string()
            }
        })
    };
    ys.close();

    Ok(output?)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
