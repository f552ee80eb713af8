use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;
use std::process::exit;

use mechtherm::app_logic::{self, TensileArgs, TgaArgs};

/// Arguments shared by both analysis subcommands.
fn with_io_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("input")
            .short('i')
            .long("input")
            .help("An export file or a folder of exports")
            .required(true)
            .value_parser(value_parser!(PathBuf)),
    )
    .arg(
        Arg::new("config")
            .short('c')
            .long("config")
            .help("YAML configuration file")
            .value_parser(value_parser!(PathBuf)),
    )
    .arg(
        Arg::new("out-dir")
            .short('o')
            .long("out-dir")
            .help("Output folder for plots, tables, and JSON"),
    )
    .arg(
        Arg::new("title")
            .short('t')
            .long("title")
            .help("Figure title, also used for the figure file name"),
    )
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = Command::new("mechtherm")
        .version("0.1.0")
        .about("Thermal and tensile characterization of polymer film samples")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(with_io_args(
            Command::new("tga")
                .about("Analyze TGA exports: decomposition events, summary table, and reports"),
        ))
        .subcommand(
            with_io_args(
                Command::new("tensile")
                    .about("Analyze tensile trials: stress-strain curves and properties"),
            )
            .arg(
                Arg::new("sample")
                    .short('s')
                    .long("sample")
                    .help("Sample name shared by every trial"),
            )
            .arg(
                Arg::new("gauge-length")
                    .long("gauge-length")
                    .help("Gauge length in mm")
                    .value_parser(value_parser!(f64)),
            )
            .arg(
                Arg::new("area")
                    .long("area")
                    .help("Cross-section area in mm²")
                    .value_parser(value_parser!(f64)),
            )
            .arg(
                Arg::new("group-by-name")
                    .long("group-by-name")
                    .help("Group trials by sample names derived from file stems")
                    .action(ArgAction::SetTrue),
            ),
        )
        .get_matches();

    let result = match matches.subcommand() {
        Some(("tga", sub)) => {
            let args = TgaArgs {
                input: sub.get_one::<PathBuf>("input").cloned().unwrap_or_default(),
                config: sub.get_one::<PathBuf>("config").cloned(),
                out_dir: sub.get_one::<String>("out-dir").cloned(),
                title: sub.get_one::<String>("title").cloned(),
            };
            app_logic::run_tga(&args)
        }
        Some(("tensile", sub)) => {
            let args = TensileArgs {
                input: sub.get_one::<PathBuf>("input").cloned().unwrap_or_default(),
                config: sub.get_one::<PathBuf>("config").cloned(),
                out_dir: sub.get_one::<String>("out-dir").cloned(),
                title: sub.get_one::<String>("title").cloned(),
                sample: sub.get_one::<String>("sample").cloned(),
                gauge_length_mm: sub.get_one::<f64>("gauge-length").copied(),
                cross_section_area_mm2: sub.get_one::<f64>("area").copied(),
                group_by_name: sub.get_flag("group-by-name"),
            };
            app_logic::run_tensile(&args)
        }
        _ => unreachable!("subcommand_required guarantees a subcommand"),
    };

    if let Err(err) = result {
        eprintln!("error: {err:#}");
        exit(1);
    }
}
