//! `ecm` - encode a raw CD image into Error Code Modeler format

use std::process;

use anyhow::{Context, Result};
use ecmrs::reporters::{ConsoleEncodeReporter, EncodeReporter, SilentEncodeReporter};
use ecmrs::{args, encode_file, EncodeConfig};

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    let matches = match args::build_command().try_get_matches() {
        Ok(matches) => matches,
        Err(err) => {
            // --help and --version are not usage errors
            let code = if err.use_stderr() { 1 } else { 0 };
            err.print().context("Failed to print usage")?;
            process::exit(code);
        }
    };

    let config = EncodeConfig::from_args(&matches);
    let reporter: Box<dyn EncodeReporter> = if config.quiet {
        Box::new(SilentEncodeReporter::new())
    } else {
        Box::new(ConsoleEncodeReporter::new())
    };

    encode_file(&config, reporter.as_ref()).with_context(|| {
        format!(
            "Failed to encode {} to {}",
            config.input.display(),
            config.output.display()
        )
    })?;

    Ok(())
}
