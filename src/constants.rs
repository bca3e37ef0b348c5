pub const DEFAULT_QUALITY: u8 = 80;
pub const MIN_QUALITY: u8 = 0;
pub const MAX_QUALITY: u8 = 100;

pub const WEBP_EXTENSION: &str = "webp";
pub const WEBP_MIME_TYPE: &str = "image/webp";

pub const DEFAULT_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif"];
pub const DEFAULT_SKIP_TYPES: &[&str] = &[WEBP_MIME_TYPE];

/// libwebp refuses anything wider or taller than this.
pub const WEBP_MAX_DIMENSION: u32 = 16383;

/// Maximum source file size in bytes (100MB)
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Bytes read from the start of a file for format sniffing.
pub const SNIFF_HEADER_LEN: usize = 64;

pub const PROGRESS_BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] {pos} files {msg}";

pub const SUCCESS_PREFIX: &str = "✅";
pub const WARNING_PREFIX: &str = "⚠️";
pub const ERROR_PREFIX: &str = "❌";
pub const INFO_PREFIX: &str = "📋";
pub const SKIP_PREFIX: &str = "⏭️";
