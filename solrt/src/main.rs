use clap::{command, ArgAction, ArgMatches, Command};
use clap_complete::{generate, Shell};
use crossterm::style::Stylize;
use solrt::info::Info;
use solrt::json::Json;
use solrt::roundtrip::Roundtrip;
use solrt::Consume;
use std::fmt::Display;
use std::io;
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[macro_use]
extern crate clap;

const PATH: &str = "PATH";
const PATH_HELP: &str = "Sets solution path to process";

fn main() -> miette::Result<()> {
    let app = build_cli();
    let matches = app.get_matches();
    init_tracing(matches.get_flag("debug"));

    match matches.subcommand() {
        Some(("roundtrip", cmd)) => roundtrip(cmd),
        Some(("info", cmd)) => info(cmd),
        Some(("remove-config", cmd)) => remove_config(cmd)?,
        Some(("completion", cmd)) => print_completions(cmd),
        _ => {}
    }
    Ok(())
}

fn init_tracing(debug: bool) {
    let level = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn roundtrip(cmd: &ArgMatches) {
    let mut consumer = Roundtrip::new();
    scan_path(cmd, &mut consumer);
    if !consumer.all_identical() {
        std::process::exit(exitcode::DATAERR);
    }
}

fn info(cmd: &ArgMatches) {
    if cmd.get_flag("json") {
        let mut consumer = Json::new(cmd.get_flag("pretty"));
        scan_path(cmd, &mut consumer);
        if consumer.errors() > 0 {
            std::process::exit(exitcode::NOINPUT);
        }
    } else {
        let mut consumer = Info::new();
        scan_path(cmd, &mut consumer);
        if consumer.errors() > 0 {
            std::process::exit(exitcode::NOINPUT);
        }
    }
}

fn remove_config(cmd: &ArgMatches) -> miette::Result<()> {
    let (Some(path), Some(configuration)) = (
        cmd.get_one::<String>(PATH),
        cmd.get_one::<String>("CONFIGURATION"),
    ) else {
        return Ok(());
    };
    let removed = solrt::remove::remove_config(Path::new(path), configuration)?;
    println!(
        " {} {} and {} project configurations",
        "Removed".green().bold(),
        removed.configuration,
        removed.project_configs
    );
    Ok(())
}

fn scan_path<C: Consume + Display>(cmd: &ArgMatches, consumer: &mut C) {
    if let Some(path) = cmd.get_one::<String>(PATH) {
        solrt::scan_file(Path::new(path), consumer);
        print!("{consumer}");
    }
}

fn print_completions(matches: &ArgMatches) {
    let mut cmd = build_cli();
    let bin_name = cmd.get_name().to_string();
    if let Some(generator) = matches.get_one::<Shell>("generator") {
        generate(*generator, &mut cmd, bin_name, &mut io::stdout());
    }
}

fn build_cli() -> Command {
    command!(crate_name!())
        .arg_required_else_help(true)
        .version(crate_version!())
        .author(crate_authors!("\n"))
        .about(crate_description!())
        .arg(
            arg!(-d --debug)
                .required(false)
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Output diagnostic messages of the parser"),
        )
        .subcommand(
            Command::new("roundtrip")
                .aliases(["rt"])
                .about("Verifies that solution is written back byte for byte")
                .arg(arg!([PATH]).help(PATH_HELP).required(true)),
        )
        .subcommand(
            Command::new("info")
                .aliases(["i"])
                .about("Get information about solution")
                .arg(
                    arg!(-j --json)
                        .required(false)
                        .action(ArgAction::SetTrue)
                        .help("Output solution model as JSON"),
                )
                .arg(
                    arg!(-p --pretty)
                        .required(false)
                        .requires("json")
                        .action(ArgAction::SetTrue)
                        .help("Pretty print JSON output"),
                )
                .arg(arg!([PATH]).help(PATH_HELP).required(true)),
        )
        .subcommand(
            Command::new("remove-config")
                .aliases(["rc"])
                .about("Removes solution configuration and all project configurations mapped to it")
                .arg(arg!([PATH]).help(PATH_HELP).required(true))
                .arg(
                    arg!([CONFIGURATION])
                        .help("Solution configuration like Release|x64")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("completion")
                .about("Generate the autocompletion script for the specified shell")
                .arg(
                    arg!([generator])
                        .value_parser(value_parser!(Shell))
                        .required(true)
                        .index(1),
                ),
        )
}
