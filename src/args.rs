use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

pub fn build_command() -> Command {
    Command::new("ecm")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Encoder for Error Code Modeler format")
        .arg(
            Arg::new("input")
                .help("Raw CD image file")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("output")
                .help("Output file (default: input with .ecm appended)")
                .required(false)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Quiet mode - no progress or summary output")
                .action(ArgAction::SetTrue),
        )
}
