use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, warn};
use webpify::cli::Args;
use webpify::constants::ERROR_PREFIX;
use webpify::logger::init_logging;
use webpify::{convert_directory, install_ctrl_c_handler, CancellationToken, Config, Result};

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_usage_error() => {
            eprintln!("{} {}", ERROR_PREFIX, e);
            eprintln!("Run 'webpify --help' for usage.");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("{} Conversion aborted: {}", ERROR_PREFIX, e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = Config::from_args(args)?;
    debug!("Resolved configuration: {:?}", config);

    println!("🚀 Converting images to WebP...");
    println!("📁 Input: {}", config.input_dir.display());
    println!("📁 Output: {}", config.output_dir.display());
    println!("🎚️  Quality: {}", config.quality);

    let cancel = CancellationToken::new();
    if let Err(e) = install_ctrl_c_handler(cancel.clone()) {
        warn!("Ctrl-C will abort immediately: {}", e);
    }

    let summary = convert_directory(&config, &cancel, !args.quiet)?;
    summary.print();

    Ok(())
}
