use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "webpify",
    about = "Convert a directory of images to WebP",
    long_about = "webpify walks a directory, sniffs the content type of every file and converts \
                  the accepted image types (JPEG, PNG and GIF by default) to lossy WebP. \
                  Files that are already WebP are skipped by default, and originals can be \
                  deleted once their WebP counterpart has been written.",
    version,
    after_help = "EXAMPLES:\n  \
    webpify ./photos -o ./webp -q 85\n  \
    webpify ./photos -o ./webp -m image/png -s image/webp image/gif\n  \
    webpify . --delete -q 50\n  \
    webpify ./photos -o ./webp --no-recursive --dry-run"
)]
pub struct Args {
    #[arg(
        default_value = ".",
        help = "Directory containing the images (default: current directory)"
    )]
    pub path: PathBuf,

    #[arg(
        short = 'o',
        long,
        default_value = ".",
        help = "Output directory for converted images (default: current directory)",
        long_help = "Output directory for converted images. The directory tree below the input \
                     path is mirrored here. Created if it does not exist. Existing .webp files \
                     at the target paths are overwritten."
    )]
    pub output: PathBuf,

    #[arg(
        short = 'q',
        long,
        help = "WebP quality (0-100, default: 80)",
        long_help = "Lossy WebP quality from 0 (smallest) to 100 (best)."
    )]
    pub quality: Option<u8>,

    #[arg(
        short = 'm',
        long = "mime-types",
        num_args = 0..,
        value_name = "MIME_TYPES",
        help = "MIME types to convert (default: image/jpeg image/png image/gif)"
    )]
    pub mime_types: Option<Vec<String>>,

    #[arg(
        short = 's',
        long = "skip-types",
        num_args = 0..,
        value_name = "SKIP_TYPES",
        help = "MIME types to skip even if listed in --mime-types (default: image/webp)",
        long_help = "MIME types to skip even if listed in --mime-types. Passing the flag without \
                     values clears the default, so existing WebP files are re-encoded."
    )]
    pub skip_types: Option<Vec<String>>,

    #[arg(long, help = "Delete original files after successful conversion")]
    pub delete: bool,

    #[arg(long, help = "Only convert files directly inside the input directory")]
    pub no_recursive: bool,

    #[arg(long, help = "Also visit hidden files and directories")]
    pub include_hidden: bool,

    #[arg(
        long,
        help = "Follow symbolic links while walking",
        long_help = "Follow symbolic links while walking. Directories reached twice through \
                     different links are only visited once."
    )]
    pub follow_symlinks: bool,

    #[arg(
        short = 'j',
        long,
        help = "Number of parallel threads (default: auto)",
        long_help = "Number of worker threads converting files. \
                     If not specified, uses number of CPU cores. Use 1 for sequential processing."
    )]
    pub threads: Option<usize>,

    #[arg(long, help = "Report what would be converted without writing or deleting anything")]
    pub dry_run: bool,

    #[arg(
        short = 'v',
        long,
        action = clap::ArgAction::Count,
        help = "Increase log verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    #[arg(long, help = "Suppress log output and the progress bar")]
    pub quiet: bool,
}
