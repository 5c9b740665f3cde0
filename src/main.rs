use anyhow::{Context, Error, Result};
use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use log::LevelFilter;
use std::io::{self, IsTerminal, Write};
use std::net::IpAddr;
use std::process::ExitCode;
use termcolor::{BufferedStandardStream, ColorChoice};

use geolookup::{DatabaseConfig, MaxMindEngine, PlaceholderPolicy, Resolver};

/// Exit code for usage errors and malformed addresses.
const USAGE_EXIT_CODE: u8 = 255;

/// Exit code when the lookup ran but the program itself failed, e.g. the
/// report could not be written. Kept apart from the 1-5 query outcomes.
const RUNTIME_EXIT_CODE: u8 = 70;

/// Check if the error chain contains a broken pipe error.
#[inline(always)]
fn is_broken_pipe(err: &Error) -> bool {
    for cause in err.chain() {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            if io_err.kind() == io::ErrorKind::BrokenPipe {
                return true;
            }
        }
    }
    false
}

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// IPv4 or IPv6 address to look up
    #[clap(value_name = "IP")]
    address: String,

    /// Specify directory containing the MMDB database files
    #[clap(
        short = 'I',
        long,
        value_name = "DIR",
        value_hint = clap::ValueHint::DirPath,
        env = "GEOIP_MMDB_DIR"
    )]
    include: Option<Utf8PathBuf>,

    /// Path of the City database, overriding the one found in DIR
    #[clap(long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    city_db: Option<Utf8PathBuf>,

    /// Path of the ASN database, overriding the one found in DIR
    #[clap(long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    asn_db: Option<Utf8PathBuf>,

    /// Use color to highlight the report labels
    #[clap(short = 'C', long, value_enum, default_value_t = ArgsColorChoice::Auto)]
    color: ArgsColorChoice,

    /// Print the report as a JSON object
    #[clap(long)]
    json: bool,

    /// Also print the complete decoded City database entry
    #[clap(long)]
    dump: bool,

    /// Only fill in missing city and region fields with "--"; leave the
    /// other missing fields empty
    #[clap(long)]
    legacy_placeholders: bool,

    /// Log verbosity on stderr (overrides RUST_LOG)
    #[clap(long, value_enum, value_name = "LEVEL")]
    log_level: Option<LogLevel>,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
enum ArgsColorChoice {
    Always,
    Never,
    Auto,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // --help and --version are reported through this path too
            let code = if err.use_stderr() { USAGE_EXIT_CODE } else { 0 };
            if let Err(print_err) = err.print() {
                eprintln!("{print_err}");
            }
            return ExitCode::from(code);
        }
    };

    let err = match run_main(args) {
        Ok(code) => return code,
        Err(err) => err,
    };

    if is_broken_pipe(&err) {
        return ExitCode::SUCCESS;
    }

    if std::env::var("RUST_BACKTRACE").is_ok_and(|v| v == "1") {
        eprintln!("{:?}", err);
    } else {
        eprintln!("{:#}", err);
    }

    ExitCode::from(RUNTIME_EXIT_CODE)
}

fn init_logger(level: Option<LogLevel>) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(level) = level {
        builder.filter_level(level.into());
    }
    builder.try_init().context("failed to initialize logger")
}

fn run_main(args: Args) -> Result<ExitCode> {
    init_logger(args.log_level)?;

    if args.address.parse::<IpAddr>().is_err() {
        eprintln!("\n  Not a valid IP address.\n");
        return Ok(ExitCode::from(USAGE_EXIT_CODE));
    }

    let mut config = match &args.include {
        Some(dir) => DatabaseConfig::from_dir(dir),
        None => DatabaseConfig::default(),
    };
    if let Some(city) = args.city_db.clone() {
        config = config.with_city(city);
    }
    if let Some(asn) = args.asn_db.clone() {
        config = config.with_asn(asn);
    }
    log::debug!("city database {}, ASN database {}", config.city, config.asn);

    let policy = if args.legacy_placeholders {
        PlaceholderPolicy::Legacy
    } else {
        PlaceholderPolicy::Uniform
    };

    // determine appropriate colormode. auto simply
    // tests if stdout is a tty (if so, then yes color)
    let colormode = match args.color {
        _ if args.json => ColorChoice::Never,
        ArgsColorChoice::Auto => {
            if io::stdout().is_terminal() {
                ColorChoice::Always
            } else {
                ColorChoice::Never
            }
        }
        ArgsColorChoice::Always => ColorChoice::Always,
        ArgsColorChoice::Never => ColorChoice::Never,
    };

    let resolver = Resolver::new(MaxMindEngine, config).with_policy(policy);
    let report = resolver.resolve(&args.address);
    let code = report.exit_code();

    let mut out = BufferedStandardStream::stdout(colormode);
    if args.json {
        report
            .write_json(&mut out, args.dump)
            .context("failed to write JSON report")?;
    } else if let Some(geo) = report.located() {
        report.write_text(&mut out).context("failed to write report")?;
        if args.dump {
            serde_json::to_writer_pretty(&mut out, &geo.entry)?;
            writeln!(out)?;
        }
    }
    out.flush().context("failed to write report")?;

    match report.geo {
        Ok(Some(_)) => {}
        Ok(None) => eprintln!(
            "\n  No entry for this IP address ({}) was found\n",
            report.address
        ),
        Err(err) => eprintln!("\n  {:#}\n", Error::new(err)),
    }

    Ok(ExitCode::from(code))
}
