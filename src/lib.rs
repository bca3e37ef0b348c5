pub mod batch;
pub mod classify;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod logger;
pub mod processing;
pub mod signal;
pub mod utils;
pub mod validation;
pub mod walker;

pub use batch::{convert_directory, process_file, FileOutcome, RunSummary, SkipReason};
pub use classify::{classify, classify_file, decide, Decision, MimeType};
pub use config::{Config, WalkOptions};
pub use error::{ClassificationError, Result, WebpifyError};
pub use processing::{
    convert_image, encode_webp, generate_output_path, is_webp_container, load_image_with_metadata,
    ConversionResult, ImageFile, OutputClaims,
};
pub use signal::{install_ctrl_c_handler, CancellationToken};
pub use walker::ImageWalker;
