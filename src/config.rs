use crate::classify::MimeType;
use crate::cli::Args;
use crate::constants::{DEFAULT_MIME_TYPES, DEFAULT_QUALITY, DEFAULT_SKIP_TYPES, MAX_QUALITY, MIN_QUALITY};
use crate::error::{Result, WebpifyError};
use crate::validation::{absolute_path, ensure_output_directory, validate_input_directory};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::info;

/// How the input directory is traversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkOptions {
    pub recursive: bool,
    pub include_hidden: bool,
    pub follow_symlinks: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            include_hidden: false,
            follow_symlinks: false,
        }
    }
}

/// Validated settings for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub quality: u8,
    pub accepted_types: BTreeSet<MimeType>,
    pub skip_types: BTreeSet<MimeType>,
    pub delete_originals: bool,
    pub walk: WalkOptions,
    pub threads: Option<usize>,
    pub dry_run: bool,
}

impl Config {
    /// Validates the core settings. Does not create the output directory;
    /// see [`Config::prepare_output_dir`].
    pub fn new(
        input_dir: &Path,
        output_dir: &Path,
        quality: Option<u8>,
        mime_types: Option<Vec<String>>,
        skip_types: Option<Vec<String>>,
    ) -> Result<Self> {
        let quality = quality.unwrap_or(DEFAULT_QUALITY);
        if !(MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
            return Err(WebpifyError::InvalidQuality(quality));
        }

        let accepted_types = mime_set(mime_types, DEFAULT_MIME_TYPES);
        if accepted_types.is_empty() {
            return Err(WebpifyError::EmptyAcceptedTypes);
        }
        let skip_types = mime_set(skip_types, DEFAULT_SKIP_TYPES);

        let input_dir = validate_input_directory(input_dir)?;
        let output_dir = absolute_path(output_dir)?;

        Ok(Self {
            input_dir,
            output_dir,
            quality,
            accepted_types,
            skip_types,
            delete_originals: false,
            walk: WalkOptions::default(),
            threads: None,
            dry_run: false,
        })
    }

    pub fn with_delete_originals(mut self, delete: bool) -> Self {
        self.delete_originals = delete;
        self
    }

    pub fn with_walk_options(mut self, walk: WalkOptions) -> Self {
        self.walk = walk;
        self
    }

    pub fn with_threads(mut self, threads: Option<usize>) -> Result<Self> {
        if let Some(0) = threads {
            return Err(WebpifyError::InvalidThreadCount(0));
        }
        self.threads = threads;
        Ok(self)
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Creates the output directory if absent and pins `output_dir` to its
    /// canonical path. A dry run leaves the file system alone.
    pub fn prepare_output_dir(&mut self) -> Result<()> {
        if self.dry_run {
            return Ok(());
        }

        if !self.output_dir.exists() {
            info!("Creating output directory: {}", self.output_dir.display());
        }
        self.output_dir = ensure_output_directory(&self.output_dir)?;
        Ok(())
    }

    /// Resolves command-line arguments into a ready-to-run configuration.
    ///
    /// Every check runs before the output directory is created, so a
    /// rejected invocation leaves no trace on disk.
    pub fn from_args(args: &Args) -> Result<Self> {
        let walk = WalkOptions {
            recursive: !args.no_recursive,
            include_hidden: args.include_hidden,
            follow_symlinks: args.follow_symlinks,
        };

        let mut config = Config::new(
            &args.path,
            &args.output,
            args.quality,
            args.mime_types.clone(),
            args.skip_types.clone(),
        )?
        .with_delete_originals(args.delete)
        .with_walk_options(walk)
        .with_threads(args.threads)?
        .with_dry_run(args.dry_run);

        config.prepare_output_dir()?;
        Ok(config)
    }

    pub fn is_accepted(&self, mime: &MimeType) -> bool {
        self.accepted_types.contains(mime)
    }
}

fn mime_set(values: Option<Vec<String>>, defaults: &[&str]) -> BTreeSet<MimeType> {
    match values {
        Some(values) => values
            .iter()
            .map(|v| MimeType::new(v))
            .filter(|m| !m.is_empty())
            .collect(),
        None => defaults.iter().map(|v| MimeType::new(v)).collect(),
    }
}
