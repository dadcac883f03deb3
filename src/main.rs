use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tcplog::logging::init_logging;
use tcplog::parser::PacketWalker;
use tcplog::{ReportError, WalkError, report};
use tracing::level_filters::LevelFilter;
use tracing::{debug, info};

const EXIT_USAGE: u8 = 1;
const EXIT_LOG_UNREADABLE: u8 = 2;
const EXIT_OUTPUT_UNWRITABLE: u8 = 3;
const EXIT_MALFORMED: u8 = 4;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Recover the TCP conversation stored in a raw IPv4/TCP packet log"
)]
struct Cli {
    /// Log verbosity (off, error, warn, info, debug, trace); RUST_LOG refines it
    #[arg(long, global = true, default_value_t = LevelFilter::WARN)]
    log_level: LevelFilter,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the server-to-client payload to a file
    Extract { log: PathBuf, output: PathBuf },
    /// Print "<server> <client> <ihl> <total length> <data offset> <packets>"
    Summary { log: PathBuf },
    /// Print one line per packet with its addresses, size and TCP flags
    List { log: PathBuf },
}

enum Failure {
    LogUnreadable(anyhow::Error),
    OutputUnwritable(anyhow::Error),
    Malformed(anyhow::Error),
}

impl Failure {
    fn exit_code(&self) -> u8 {
        match self {
            Failure::LogUnreadable(_) => EXIT_LOG_UNREADABLE,
            Failure::OutputUnwritable(_) => EXIT_OUTPUT_UNWRITABLE,
            Failure::Malformed(_) => EXIT_MALFORMED,
        }
    }

    fn error(&self) -> &anyhow::Error {
        match self {
            Failure::LogUnreadable(e) | Failure::OutputUnwritable(e) | Failure::Malformed(e) => e,
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::from(EXIT_USAGE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let _guard = match init_logging(cli.log_file.as_deref(), cli.log_level) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            debug!(error = %failure.error(), "Command failed");
            eprintln!("{:#}", failure.error());
            ExitCode::from(failure.exit_code())
        }
    }
}

fn run(command: Command) -> Result<(), Failure> {
    match command {
        Command::Extract { log, output } => extract(&log, &output),
        Command::Summary { log } => summary(&log),
        Command::List { log } => list(&log),
    }
}

fn extract(log: &Path, output: &Path) -> Result<(), Failure> {
    let walker = open_log(log)?;
    let file = File::create(output)
        .with_context(|| format!("Unable to open the output file {output:?}"))
        .map_err(Failure::OutputUnwritable)?;
    let mut sink = BufWriter::new(file);

    let stats = report::extract_payload(walker, &mut sink)
        .map_err(|e| report_failure(e, log, output))?;
    info!(
        path = ?output,
        bytes = stats.bytes_written,
        packets = stats.packets,
        "Wrote extracted payload"
    );
    Ok(())
}

fn summary(log: &Path) -> Result<(), Failure> {
    let walker = open_log(log)?;
    let summary = report::summarize(walker)
        .map_err(|e| walk_failure(e, log))?
        .ok_or_else(|| Failure::Malformed(anyhow!("Log file {log:?} contains no packets")))?;
    println!("{summary}");
    Ok(())
}

fn list(log: &Path) -> Result<(), Failure> {
    let walker = open_log(log)?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    report::list_packets(walker, &mut out)
        .map_err(|e| report_failure(e, log, Path::new("stdout")))?;
    Ok(())
}

fn open_log(path: &Path) -> Result<PacketWalker<BufReader<File>>, Failure> {
    info!(path = ?path, "Opening packet log");
    PacketWalker::open(path)
        .with_context(|| format!("Unable to open the log file {path:?}"))
        .map_err(Failure::LogUnreadable)
}

fn walk_failure(err: WalkError, log: &Path) -> Failure {
    match err {
        WalkError::Io(_) => Failure::LogUnreadable(
            anyhow::Error::new(err).context(format!("Unable to read the log file {log:?}")),
        ),
        WalkError::Malformed { .. } => Failure::Malformed(
            anyhow::Error::new(err).context(format!("Log file {log:?} is malformed")),
        ),
    }
}

fn report_failure(err: ReportError, log: &Path, output: &Path) -> Failure {
    match err {
        ReportError::Walk(walk) => walk_failure(walk, log),
        ReportError::Output(e) => Failure::OutputUnwritable(
            anyhow::Error::new(e).context(format!("Unable to write to {output:?}")),
        ),
    }
}
