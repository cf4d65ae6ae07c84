use std::path::PathBuf;

use clap::{App, Arg, ArgMatches};
use itertools::Itertools;
use slog::{o, Discard, Drain, Logger};
use slog_term::{FullFormat, TermDecorator};

use mcpu::{
    image::ImageError,
    parsing::{excerpt, line_location},
    translate_with_logger, Image,
};

enum Error {
    Translate(Vec<String>),
    Image(ImageError),
    IO(std::io::Error),
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

fn parse_arguments() -> ArgMatches<'static> {
    App::new("mcpuc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compiles source files into instruction and data images")
        .arg(Arg::with_name("source")
             .help("File containing the program source")
             .value_name("SOURCE")
             .required(true)
             .index(1))
        .arg(Arg::with_name("output")
             .help("Prefix of the written PREFIX.code and PREFIX.data files")
             .long("output")
             .short("o")
             .value_name("PREFIX")
             .takes_value(true))
        .arg(Arg::with_name("quiet")
             .help("Do not print the listing")
             .long("quiet")
             .short("q"))
        .arg(Arg::with_name("symbols")
             .help("Print the global symbols")
             .long("symbols"))
        .arg(Arg::with_name("verbose")
             .help("Enables verbose logging")
             .long("verbose")
             .short("v"))
        .get_matches()
}

/// Prints the listing with the source line of each statement in front of its first instruction.
fn print_listing(image: &Image, source: &str) {
    let mut previous = None;

    for line in &image.listing {
        let address = line
            .split(':')
            .next()
            .and_then(|addr| u32::from_str_radix(addr, 16).ok());

        if let Some(span) = address.and_then(|addr| image.source_map.get_source_span(addr)) {
            if previous != Some(span.start) {
                let location = line_location(source, span.start);
                println!("; {}: {}", location.line, excerpt(source, span.start));
                previous = Some(span.start);
            }
        }

        println!("{}", line);
    }
}

fn print_symbols(image: &Image) {
    let symbols = image
        .globals
        .iter()
        .sorted_by_key(|symbol| symbol.address())
        .map(|symbol| {
            let address = symbol
                .address()
                .map(|addr| format!("0x{:04x}", addr))
                .unwrap_or_else(|| "-".to_string());

            format!("{:<16} {:<12} {}", symbol.name, symbol.ty.to_string(), address)
        })
        .join("\n");

    println!("{}", symbols);
}

fn compile(args: &ArgMatches, logger: Logger) -> Result<(), Error> {
    let path = PathBuf::from(args.value_of("source").unwrap_or_default());
    let source = std::fs::read_to_string(&path)?;

    let image = translate_with_logger(&source, logger)
        .map_err(|err| Error::Translate(err.verbose(&source)))?;

    let prefix = match args.value_of("output") {
        Some(prefix) => PathBuf::from(prefix),
        None => path.with_extension(""),
    };

    image.save(&prefix)?;

    if !args.is_present("quiet") {
        print_listing(&image, &source);
    }

    if args.is_present("symbols") {
        print_symbols(&image);
    }

    Ok(())
}

fn main() {
    let args = parse_arguments();

    let logger = if args.is_present("verbose") {
        let decorator = TermDecorator::new().stderr().build();
        let drain = FullFormat::new(decorator).build().fuse();
        let drain = slog_async::Async::new(drain).build().fuse();
        Logger::root(drain, o!())
    } else {
        Logger::root(Discard, o!())
    };

    let result = compile(&args, logger);

    match result {
        Ok(()) => (),
        Err(Error::Translate(errors)) => {
            for err in &errors {
                eprintln!("{}", err);
            }

            eprintln!("{} error(s), no image was written", errors.len());
            std::process::exit(1);
        }
        Err(Error::Image(err)) => {
            eprintln!("could not write image: {}", err);
            std::process::exit(1);
        }
        Err(Error::IO(err)) => {
            eprintln!("IO error: {}", err);
            std::process::exit(1);
        }
    }
}
