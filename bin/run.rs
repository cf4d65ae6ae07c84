use std::fmt;
use std::io::Write;

use clap::{App, Arg, ArgMatches};
use slog::{info, o, Discard, Drain, Logger};
use slog_term::{FullFormat, TermDecorator};

use mcpu::{
    config::RunConfig,
    emulator::{Cpu, RunOutcome},
    image::{self, ImageError},
    io::port,
    schedule::{Schedule, ScheduleError},
    translate_with_logger,
};

enum Error {
    Translate(Vec<String>),
    Image(ImageError),
    Schedule(ScheduleError),
    Argument(String),
    IO(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Translate(errors) => {
                for err in errors {
                    writeln!(f, "{}", err)?;
                }

                write!(f, "{} error(s), nothing was executed", errors.len())
            }
            Error::Image(err) => write!(f, "could not load image: {}", err),
            Error::Schedule(err) => write!(f, "invalid schedule: {}", err),
            Error::Argument(msg) => write!(f, "{}", msg),
            Error::IO(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::IO(e)
    }
}

impl From<ImageError> for Error {
    fn from(e: ImageError) -> Error {
        Error::Image(e)
    }
}

impl From<ScheduleError> for Error {
    fn from(e: ScheduleError) -> Error {
        Error::Schedule(e)
    }
}

fn parse_arguments() -> ArgMatches<'static> {
    App::new("mcpurun")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compiles and executes programs on the emulated machine")
        .arg(Arg::with_name("source")
             .help("Source file, or the image prefix with --image")
             .value_name("SOURCE")
             .required(true)
             .index(1))
        .arg(Arg::with_name("image")
             .help("Treat SOURCE as the prefix of PREFIX.code and PREFIX.data")
             .long("image"))
        .arg(Arg::with_name("schedule")
             .help("File of scheduled input, one `TICK LINE VALUE` entry per line")
             .long("schedule")
             .short("s")
             .value_name("FILE")
             .takes_value(true))
        .arg(Arg::with_name("ticks")
             .help("Tick budget of the run")
             .long("ticks")
             .short("t")
             .value_name("N")
             .takes_value(true))
        .arg(Arg::with_name("stack")
             .help("Bytes reserved for the stack")
             .long("stack")
             .value_name("BYTES")
             .takes_value(true))
        .arg(Arg::with_name("debug")
             .help("Logs every trace entry of the run")
             .long("debug")
             .short("d"))
        .arg(Arg::with_name("verbose")
             .help("Enables verbose logging")
             .long("verbose")
             .short("v"))
        .get_matches()
}

fn number<T: std::str::FromStr>(args: &ArgMatches, name: &str) -> Result<Option<T>, Error> {
    match args.value_of(name) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| Error::Argument(format!("invalid value for --{}: {}", name, value))),
    }
}

fn config(args: &ArgMatches) -> Result<RunConfig, Error> {
    let mut config = RunConfig::default().with_debug(args.is_present("debug"));

    if let Some(ticks) = number(args, "ticks")? {
        config = config.with_tick_budget(ticks);
    }

    if let Some(bytes) = number(args, "stack")? {
        config = config.with_stack_size(bytes);
    }

    Ok(config)
}

fn run(args: &ArgMatches, logger: Logger) -> Result<RunOutcome, Error> {
    let config = config(args)?;

    let path = args
        .value_of("source")
        .ok_or_else(|| Error::Argument("missing SOURCE".to_string()))?;

    let (code, data) = if args.is_present("image") {
        image::load(path)?
    } else {
        let source = std::fs::read_to_string(path)?;

        let image = translate_with_logger(&source, logger.clone())
            .map_err(|err| Error::Translate(err.verbose(&source)))?;

        (image.code, image.data)
    };

    let schedule = match args.value_of("schedule") {
        Some(path) => Schedule::parse_with_logger(&std::fs::read_to_string(path)?, logger.clone())?,
        None => Schedule::new(),
    };

    let mut cpu = Cpu::with_logger(code, data, schedule, &config, logger.clone());
    let outcome = cpu.run_to_end();

    info!(logger, "run finished";
        "outcome" => ?outcome,
        "ticks" => cpu.ticks(),
        "pc" => cpu.context.pc,
        "flags" => %cpu.context.flags);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    out.write_all(cpu.io.output_buffer(port::CHARACTERS))?;

    for number in cpu.io.numbers() {
        writeln!(out, "{}", number)?;
    }

    out.flush()?;

    Ok(outcome)
}

fn main() {
    let args = parse_arguments();

    let logger = if args.is_present("verbose") || args.is_present("debug") {
        let decorator = TermDecorator::new().stderr().build();
        let drain = FullFormat::new(decorator).build().fuse();
        let drain = slog_async::Async::new(drain).build().fuse();
        Logger::root(drain, o!())
    } else {
        Logger::root(Discard, o!())
    };

    match run(&args, logger) {
        Ok(RunOutcome::Halted) => (),
        Ok(RunOutcome::BudgetExhausted) => {
            eprintln!("tick budget exhausted before HALT");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    }
}
