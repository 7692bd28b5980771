use std::ffi::OsString;
use std::io::{self, Write};

use anyhow::Result;
use clap::{CommandFactory, Parser};
use log::debug;

use crate::config::RunConfig;
use crate::error::{ArgError, EXIT_HELP, EXIT_OK};
use crate::poll::{poll_loop, RunningFlag};
use crate::runtime::TrackingRuntime;
use crate::session::TrackingSession;

const HELP_FLAGS: [&str; 2] = ["--help", "-?"];
const INTERVAL_FLAGS: [&str; 2] = ["--interval", "-i"];
const VERBOSE_FLAGS: [&str; 2] = ["--verbose", "-v"];

const BANNER: &str = "vr-battery ~ controller battery readout";

#[derive(Parser, Debug)]
#[command(name = "vr-battery", disable_help_flag = true, args_override_self = true)]
#[command(about = "Shows the battery charge of both hand controllers until interrupted")]
struct Cli {
    /// Shows this prompt
    #[arg(short = '?', long = "help")]
    help: bool,
    /// Battery charge display update interval in milliseconds (default 1000)
    #[arg(
        short = 'i',
        long = "interval",
        value_name = "MILLISECONDS",
        value_parser = clap::value_parser!(OsString)
    )]
    interval: Option<OsString>,
    /// Enable verbose output (raw charge fractions and runtime diagnostics)
    #[arg(short, long)]
    verbose: bool,
}

/// Recognized tokens, ready for clap. Everything else on the command line is dropped.
#[derive(Debug, Default)]
struct Scan {
    tokens: Vec<OsString>,
    missing_interval: bool,
}

fn scan_tokens(args: Vec<OsString>) -> Scan {
    let mut iter = args.into_iter();
    let mut scan = Scan::default();
    scan.tokens
        .push(iter.next().unwrap_or_else(|| OsString::from("vr-battery")));

    while let Some(token) = iter.next() {
        let Some(flag) = token.to_str() else {
            continue;
        };
        if HELP_FLAGS.contains(&flag) || VERBOSE_FLAGS.contains(&flag) {
            scan.tokens.push(token);
        } else if INTERVAL_FLAGS.contains(&flag) {
            match iter.next() {
                Some(value) => {
                    // Glued form so clap never reads the value as another flag.
                    let mut glued = OsString::from("--interval=");
                    glued.push(value);
                    scan.tokens.push(glued);
                }
                None => scan.missing_interval = true,
            }
        }
    }
    scan
}

fn parse_interval(raw: &OsString) -> Result<u32, ArgError> {
    let invalid = || ArgError::InvalidInterval(raw.to_string_lossy().into_owned());
    let text = raw.to_str().ok_or_else(invalid)?;
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    text.parse::<u32>().map_err(|_| invalid())
}

/// Turns the raw command line (program name first) into a [`RunConfig`].
///
/// A help flag anywhere wins over every other outcome.
pub fn parse_args<I, T>(args: I) -> Result<RunConfig, ArgError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let scan = scan_tokens(args.into_iter().map(Into::into).collect());
    let cli = Cli::parse_from(scan.tokens);

    let mut config = RunConfig {
        verbose: cli.verbose,
        ..RunConfig::default()
    };
    if cli.help {
        config.show_help = true;
        return Ok(config);
    }
    if scan.missing_interval {
        return Err(ArgError::MissingInterval);
    }
    if let Some(raw) = cli.interval.as_ref() {
        config.poll_interval_ms = parse_interval(raw)?;
    }
    Ok(config)
}

pub fn help_text() -> String {
    format!("{BANNER}\n\n{}", Cli::command().render_help())
}

fn configure_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
    builder.format(|buf, record| writeln!(buf, "{}", record.args()));
    builder.target(env_logger::Target::Stdout);
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    } else {
        builder.filter_level(log::LevelFilter::Info);
    }
    let _ = builder.try_init();
}

/// Runs the program and returns the process exit status.
pub fn run<I, T>(args: I) -> Result<i32>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let config = match parse_args(args) {
        Ok(config) => config,
        Err(err) => {
            println!("{err}\nUse --help or -? argument to view help");
            return Ok(err.exit_code());
        }
    };
    if config.show_help {
        println!("{}", help_text());
        return Ok(EXIT_HELP);
    }
    configure_logging(config.verbose);

    let running = RunningFlag::new();
    running.install_handler()?;

    let session = match TrackingSession::open() {
        Ok(session) => session,
        Err(err) => {
            println!("{err}");
            return Ok(err.exit_code());
        }
    };
    let mut stdout = io::stdout().lock();
    drive(session, &config, &running, &mut stdout)
}

/// Resolves the controllers of an open session, polls them until `running`
/// is cleared, then closes the session.
fn drive<R, W>(
    mut session: TrackingSession<R>,
    config: &RunConfig,
    running: &RunningFlag,
    out: &mut W,
) -> Result<i32>
where
    R: TrackingRuntime,
    W: Write,
{
    let controllers = match session.resolve_controllers() {
        Ok(controllers) => controllers,
        Err(err) => {
            session.close();
            writeln!(out, "{err}")?;
            return Ok(err.exit_code());
        }
    };

    let readings = poll_loop(session.runtime(), controllers, config, running, out)?;
    writeln!(out)?;
    out.flush()?;
    debug!("Stopped after {readings} readings");

    session.close();
    Ok(EXIT_OK)
}
