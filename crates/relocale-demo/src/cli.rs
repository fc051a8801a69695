#![forbid(unsafe_code)]

//! Command-line argument parsing for the demo.
//!
//! Parses args manually to keep the binary lean. Supports environment
//! variable overrides via the `RELOCALE_DEMO_*` prefix; explicit flags win
//! over the environment.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::process;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
relocale demo: a window whose strings follow the active language

USAGE:
    relocale-demo [OPTIONS]

OPTIONS:
    --locale=CODE        Initial UI culture, e.g. 'en', 'de', 'de-AT' (default: en)
    --resources=PATH     JSON resource tables to load instead of the built-in ones
    --script=CMDS        Run ';'-separated commands instead of reading stdin
    --help, -h           Show this help message
    --version, -V        Show version

COMMANDS:
    switch               Switch to the next supported language (the button)
    lang CODE            Switch to a specific culture
    close NAME           Close (drop) the element named NAME
    show                 Print the window
    stats                Print registry statistics
    quit                 Exit

ENVIRONMENT VARIABLES:
    RELOCALE_DEMO_LOCALE     Override --locale
    RELOCALE_DEMO_RESOURCES  Override --resources
    RUST_LOG                 Log filter (default: warn)";

/// Parsed command-line options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Opts {
    pub locale: Option<String>,
    pub resources: Option<PathBuf>,
    pub script: Option<String>,
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Run(Opts),
    Help,
    Version,
}

/// A command line that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    UnknownArgument(String),
    MissingValue(&'static str),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownArgument(arg) => write!(f, "unknown argument: {arg}"),
            Self::MissingValue(flag) => write!(f, "{flag} requires a value"),
        }
    }
}

impl std::error::Error for CliError {}

impl Opts {
    /// Parse the process arguments and environment.
    ///
    /// Prints help or version and exits when asked to; prints the error and
    /// exits with status 2 on a bad command line.
    pub fn parse() -> Self {
        match parse_from(env::args().skip(1), |name| env::var(name).ok()) {
            Ok(Parsed::Run(opts)) => opts,
            Ok(Parsed::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Ok(Parsed::Version) => {
                println!("relocale-demo {VERSION}");
                process::exit(0);
            }
            Err(err) => {
                eprintln!("error: {err}\n\nRun with --help for usage.");
                process::exit(2);
            }
        }
    }
}

/// Parse `args` with `env_var` supplying environment overrides.
pub fn parse_from<I, S, E>(args: I, env_var: E) -> Result<Parsed, CliError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    E: Fn(&str) -> Option<String>,
{
    let mut opts = Opts {
        locale: env_var("RELOCALE_DEMO_LOCALE").filter(|v| !v.is_empty()),
        resources: env_var("RELOCALE_DEMO_RESOURCES")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from),
        script: None,
    };

    for arg in args {
        let arg = arg.as_ref();
        match arg {
            "--help" | "-h" => return Ok(Parsed::Help),
            "--version" | "-V" => return Ok(Parsed::Version),
            _ => {}
        }
        if let Some(value) = arg.strip_prefix("--locale=") {
            opts.locale = Some(non_empty(value, "--locale")?.to_string());
        } else if let Some(value) = arg.strip_prefix("--resources=") {
            opts.resources = Some(PathBuf::from(non_empty(value, "--resources")?));
        } else if let Some(value) = arg.strip_prefix("--script=") {
            opts.script = Some(value.to_string());
        } else {
            return Err(CliError::UnknownArgument(arg.to_string()));
        }
    }

    Ok(Parsed::Run(opts))
}

fn non_empty<'a>(value: &'a str, flag: &'static str) -> Result<&'a str, CliError> {
    if value.is_empty() {
        Err(CliError::MissingValue(flag))
    } else {
        Ok(value)
    }
}
