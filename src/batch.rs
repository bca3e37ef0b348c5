use crate::classify::{classify_file, decide, Decision, MimeType};
use crate::config::Config;
use crate::constants::{ERROR_PREFIX, INFO_PREFIX, SKIP_PREFIX, SUCCESS_PREFIX, WARNING_PREFIX};
use crate::error::{ClassificationError, Result, WebpifyError};
use crate::processing::{convert_image, ConversionResult, ImageFile, OutputClaims};
use crate::signal::CancellationToken;
use crate::utils::{calculate_compression_ratio, create_progress_spinner, format_file_size};
use crate::walker::ImageWalker;
use rayon::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Why a file was left alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Listed in the skip types.
    SkipListed(MimeType),
    /// Detected, but not among the accepted types.
    NotAccepted(MimeType),
    /// Content is not an image format we can recognise.
    Unrecognized,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::SkipListed(mime) => write!(f, "mime type {}", mime),
            SkipReason::NotAccepted(mime) => write!(f, "unsupported mime type {}", mime),
            SkipReason::Unrecognized => write!(f, "unrecognized format"),
        }
    }
}

/// Terminal state of one walked file.
#[derive(Debug)]
pub enum FileOutcome {
    Converted {
        image: ImageFile,
        result: ConversionResult,
    },
    /// Dry run: the file would have been converted.
    Planned(ImageFile),
    Skipped {
        path: PathBuf,
        reason: SkipReason,
    },
    Failed {
        path: PathBuf,
        error: WebpifyError,
    },
}

/// Totals for one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub discovered: usize,
    pub converted: usize,
    pub planned: usize,
    pub skipped: usize,
    pub failed: usize,
    pub originals_deleted: usize,
    pub delete_failures: usize,
    pub bytes_before: u64,
    pub bytes_after: u64,
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &FileOutcome) {
        self.discovered += 1;
        match outcome {
            FileOutcome::Converted { result, .. } => {
                self.converted += 1;
                self.bytes_before += result.original_size;
                self.bytes_after += result.webp_size;
                if result.original_deleted {
                    self.originals_deleted += 1;
                }
                if result.delete_error.is_some() {
                    self.delete_failures += 1;
                }
            }
            FileOutcome::Planned(_) => self.planned += 1,
            FileOutcome::Skipped { .. } => self.skipped += 1,
            FileOutcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn merge(mut self, other: RunSummary) -> RunSummary {
        self.discovered += other.discovered;
        self.converted += other.converted;
        self.planned += other.planned;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.originals_deleted += other.originals_deleted;
        self.delete_failures += other.delete_failures;
        self.bytes_before += other.bytes_before;
        self.bytes_after += other.bytes_after;
        self.cancelled |= other.cancelled;
        self
    }

    pub fn compression_ratio(&self) -> f64 {
        calculate_compression_ratio(self.bytes_before, self.bytes_after)
    }

    pub fn print(&self) {
        println!("\n{} Conversion Summary:", INFO_PREFIX);
        println!("  📁 Total files: {}", self.discovered);
        println!("  {} Successfully converted: {}", SUCCESS_PREFIX, self.converted);
        if self.planned > 0 {
            println!("  📝 Would convert (dry run): {}", self.planned);
        }
        println!("  {} Skipped: {}", SKIP_PREFIX, self.skipped);
        println!("  {} Errors: {}", ERROR_PREFIX, self.failed);
        if self.originals_deleted > 0 || self.delete_failures > 0 {
            println!("  🗑️  Originals deleted: {}", self.originals_deleted);
        }
        if self.delete_failures > 0 {
            println!("  {}  Failed deletions: {}", WARNING_PREFIX, self.delete_failures);
        }
        if self.converted > 0 {
            println!(
                "  📊 Size: {} -> {} ({:.1}% smaller)",
                format_file_size(self.bytes_before),
                format_file_size(self.bytes_after),
                self.compression_ratio()
            );
        }
        println!("  ⏱️  Total time: {:.2?}", self.elapsed);
        if self.cancelled {
            println!("  {}  Run was interrupted before all files were processed", WARNING_PREFIX);
        }
    }
}

/// Result of the sequential stage for one walked file.
enum Prepared {
    /// Accepted, and its output path is reserved.
    Ready(ImageFile),
    Done(FileOutcome),
}

/// Classifies `path` and reserves its output path in `claims`.
fn prepare_file(path: &Path, config: &Config, claims: &OutputClaims) -> Prepared {
    let mime = match classify_file(path) {
        Ok(mime) => mime,
        Err(ClassificationError::Unreadable(e)) => {
            return Prepared::Done(FileOutcome::Failed {
                path: path.to_path_buf(),
                error: WebpifyError::Classification(ClassificationError::Unreadable(e)),
            });
        }
        Err(_) => {
            return Prepared::Done(FileOutcome::Skipped {
                path: path.to_path_buf(),
                reason: SkipReason::Unrecognized,
            });
        }
    };

    match decide(&mime, &config.accepted_types, &config.skip_types) {
        Decision::Convert => {}
        Decision::Skip => {
            return Prepared::Done(FileOutcome::Skipped {
                path: path.to_path_buf(),
                reason: SkipReason::SkipListed(mime),
            });
        }
        Decision::NotAccepted => {
            return Prepared::Done(FileOutcome::Skipped {
                path: path.to_path_buf(),
                reason: SkipReason::NotAccepted(mime),
            });
        }
    }

    let image = match ImageFile::new(path, mime, &config.input_dir, &config.output_dir) {
        Ok(image) => image,
        Err(error) => {
            return Prepared::Done(FileOutcome::Failed {
                path: path.to_path_buf(),
                error,
            });
        }
    };

    match claims.claim(&image) {
        Ok(()) => Prepared::Ready(image),
        Err(error) => Prepared::Done(FileOutcome::Failed {
            path: image.source_path,
            error,
        }),
    }
}

fn finish_file(image: ImageFile, config: &Config) -> FileOutcome {
    if config.dry_run {
        return FileOutcome::Planned(image);
    }

    match convert_image(&image, config.quality, config.delete_originals) {
        Ok(result) => FileOutcome::Converted { image, result },
        Err(error) => FileOutcome::Failed {
            path: image.source_path,
            error,
        },
    }
}

/// Classifies one file and converts it if the configuration accepts it.
///
/// Never returns an error: every failure is captured in the outcome so one
/// bad file cannot stop the run. A file whose output path was already
/// claimed by another source in `claims` fails without being touched.
pub fn process_file(path: &Path, config: &Config, claims: &OutputClaims) -> FileOutcome {
    match prepare_file(path, config, claims) {
        Prepared::Ready(image) => finish_file(image, config),
        Prepared::Done(outcome) => outcome,
    }
}

/// Attributes a traversal error to the entry it happened on.
fn walk_failure(error: WebpifyError, input_dir: &Path) -> FileOutcome {
    let path = match &error {
        WebpifyError::WalkdirError(e) => e.path().map(Path::to_path_buf),
        _ => None,
    }
    .unwrap_or_else(|| input_dir.to_path_buf());

    FileOutcome::Failed { path, error }
}

fn report(outcome: &FileOutcome) {
    match outcome {
        FileOutcome::Converted { image, result } => {
            info!(
                "Converted {} to {} ({} -> {})",
                image.source_path.display(),
                image.output_path.display(),
                format_file_size(result.original_size),
                format_file_size(result.webp_size)
            );
            if result.original_deleted {
                info!("Deleted original {}", image.source_path.display());
            }
            if let Some(e) = &result.delete_error {
                warn!("Failed to delete original {}: {}", image.source_path.display(), e);
            }
        }
        FileOutcome::Planned(image) => info!(
            "Would convert {} to {}",
            image.source_path.display(),
            image.output_path.display()
        ),
        FileOutcome::Skipped { path, reason } => {
            debug!("Skipped ({}): {}", reason, path.display())
        }
        FileOutcome::Failed { path, error } => {
            warn!("Error processing {}: {}", path.display(), error)
        }
    }
}

/// Walks `config.input_dir` and converts every accepted file.
///
/// Per-file problems are logged and counted; only a failure to set up the
/// worker pool is returned as an error. When `cancel` fires, no further
/// files are dispatched and the partial summary is returned.
pub fn convert_directory(
    config: &Config,
    cancel: &CancellationToken,
    show_progress: bool,
) -> Result<RunSummary> {
    let start_time = Instant::now();

    let mut walker = ImageWalker::new(&config.input_dir, config.walk);
    if config.output_dir != config.input_dir && config.output_dir.starts_with(&config.input_dir) {
        walker = walker.excluding(&config.output_dir);
    }

    let mut pool_builder = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = config.threads {
        pool_builder = pool_builder.num_threads(threads);
    }
    let pool = pool_builder.build()?;

    info!(
        "Scanning {} with {} worker thread(s)",
        config.input_dir.display(),
        pool.current_num_threads()
    );

    let progress = create_progress_spinner(show_progress);
    let claims = OutputClaims::new();

    // Classification and output claims run in walk order, so when two sources
    // map to the same output the first one by name wins.
    let mut summary = pool.install(|| {
        walker
            .walk()
            .take_while(|_| !cancel.is_cancelled())
            .map(|entry| match entry {
                Ok(path) => prepare_file(&path, config, &claims),
                Err(error) => Prepared::Done(walk_failure(error, &config.input_dir)),
            })
            .par_bridge()
            .map(|prepared| {
                let outcome = match prepared {
                    Prepared::Ready(image) => finish_file(image, config),
                    Prepared::Done(outcome) => outcome,
                };
                report(&outcome);
                progress.inc(1);
                outcome
            })
            .fold(RunSummary::default, |mut summary, outcome| {
                summary.record(&outcome);
                summary
            })
            .reduce(RunSummary::default, RunSummary::merge)
    });

    progress.finish_and_clear();

    summary.cancelled = cancel.is_cancelled();
    summary.elapsed = start_time.elapsed();
    Ok(summary)
}
