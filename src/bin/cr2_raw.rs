//! CLI: `cr2_raw <input.CR2> <output.dat> [--format gray8|raw16] [-d|-v]`.
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use log::{error, info, Level};

use cr2_raw::{decode_scan, parse_container, write_dump, DumpFormat};

fn create_cmd_args() -> Command
{
    Command::new("cr2_raw")
        .about("Decode a Canon CR2 raw photo's lossless-JPEG entropy stream into a raw sample dump")
        .arg(Arg::new("input").help("Input CR2 file").value_parser(value_parser!(PathBuf)).required(true))
        .arg(Arg::new("output").help("Output dump path").value_parser(value_parser!(PathBuf)).required(true))
        .arg(
            Arg::new("format")
                .long("format")
                .help("Sink sample encoding")
                .value_parser(["gray8", "raw16"])
                .default_value("raw16"),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .action(ArgAction::SetTrue)
                .help_heading("LOGGING")
                .help("Display debug information and higher"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help_heading("LOGGING")
                .help("Display trace information and higher"),
        )
}

fn setup_logger(options: &ArgMatches)
{
    let log_level = if *options.get_one::<bool>("verbose").unwrap()
    {
        Level::Trace
    }
    else if *options.get_one::<bool>("debug").unwrap()
    {
        Level::Debug
    }
    else
    {
        Level::Warn
    };

    simple_logger::init_with_level(log_level).unwrap();
    info!("logger initialized at level {}", log_level);
}

fn run(options: &ArgMatches) -> Result<(), cr2_raw::DecodeErrors>
{
    let input: &PathBuf = options.get_one("input").unwrap();
    let output: &PathBuf = options.get_one("output").unwrap();
    let format = options.get_one::<String>("format").unwrap();

    info!("decoding {}", input.display());
    let bytes = std::fs::read(input)?;
    let params = parse_container(&bytes)?;
    let predictor_bits = params.predictor_bits;
    let image = decode_scan(&params)?;

    let format = match format.as_str()
    {
        "gray8" => DumpFormat::Gray8 { predictor_bits },
        _ => DumpFormat::Raw16,
    };

    write_dump(&image, output, format)?;
    info!("wrote {}", output.display());

    Ok(())
}

fn main() -> ExitCode
{
    let cmd = create_cmd_args();
    let options = cmd.get_matches();

    setup_logger(&options);

    match run(&options)
    {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) =>
        {
            error!("could not decode CR2 file, reason: {:?}", err);
            ExitCode::FAILURE
        }
    }
}
