//! Configuration for encode operations

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Suffix appended to the input path when no output path is given
pub const DEFAULT_SUFFIX: &str = ".ecm";

/// Configuration for one encode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeConfig {
    /// Raw sector image to read
    pub input: PathBuf,
    /// ECM file to write
    pub output: PathBuf,
    /// Suppress progress and summary output
    pub quiet: bool,
}

impl EncodeConfig {
    pub fn new(input: impl Into<PathBuf>, output: Option<PathBuf>, quiet: bool) -> Self {
        let input = input.into();
        let output = output.unwrap_or_else(|| default_output_path(&input));
        Self {
            input,
            output,
            quiet,
        }
    }

    pub fn from_args(matches: &clap::ArgMatches) -> Self {
        let input = matches
            .get_one::<PathBuf>("input")
            .cloned()
            .unwrap_or_default();
        let output = matches.get_one::<PathBuf>("output").cloned();
        let quiet = matches.get_flag("quiet");

        Self::new(input, output, quiet)
    }
}

/// `image.bin` -> `image.bin.ecm`
pub fn default_output_path(input: &Path) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(DEFAULT_SUFFIX);
    PathBuf::from(name)
}
