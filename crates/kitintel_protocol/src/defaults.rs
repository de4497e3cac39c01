//! Canonical default values shared by the CLI and the submission pipeline.

pub const DEFAULT_ENDPOINT: &str = "https://api.phishfeed.com/KIT/v1";
pub const API_KEY_ENV: &str = "KITAPI";
pub const ENDPOINT_ENV: &str = "KIT_ENDPOINT";
pub const API_KEY_HEADER: &str = "x-api-key";
pub const UPLOAD_CONTENT_TYPE: &str = "application/binary";

pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_RELATIVE_DATE: &str = "1y";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Upload attempts per archive before giving up.
pub const DEFAULT_MAX_UPLOAD_ATTEMPTS: u32 = 10;
/// Pause before each duplicate lookup when submitting many archives.
pub const DEFAULT_DEDUP_DELAY_MS: u64 = 1000;

/// SHA-256 of the empty input.
pub const EMPTY_SHA256_HEX: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
