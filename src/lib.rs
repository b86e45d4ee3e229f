pub mod args;
pub mod config;
pub mod counting_writer;
pub mod domain;
pub mod ecc;
pub mod edc;
pub mod encoder;
pub mod error;
pub mod galois;
pub mod record;
pub mod reporters;
pub mod sector;
pub mod window;

pub use config::EncodeConfig;
pub use domain::{Run, SectorType, TypeTally};
pub use encoder::{encode_file, EncodeStats, Encoder};
pub use error::{EcmError, Result};
pub use sector::classify;
