//! Shared limits and defaults for conversion and commit
//!
//! Host limits are hard: every write call the crate issues stays inside them.
//! The remaining values are defaults that `Config` can override.

/// Maximum characters in one `text.content` of a rich-text run
///
/// Counted in Unicode scalar values, matching how the host measures length.
pub const MAX_TEXT_CONTENT_CHARS: usize = 2000;

/// Maximum `children` blocks accepted by one create or append call
pub const MAX_CHILDREN_PER_CALL: usize = 100;

/// Maximum levels of block nesting in a single write
///
/// A top-level block may have children and grandchildren, nothing deeper.
pub const MAX_BLOCK_NESTING: usize = 2;

/// Deepest list nesting converted in place; deeper lists are relocated
pub const DEFAULT_MAX_LIST_DEPTH: usize = 2;

/// Maximum rich-text runs the host accepts in one block field
pub const MAX_RICH_TEXT_RUNS: usize = 100;

/// Maximum rows written into a single table block
///
/// Rows are children of the table, so the per-call children limit applies.
pub const MAX_TABLE_ROWS: usize = 100;

/// Default attempts per write batch before the document fails
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Initial backoff between write attempts
pub const DEFAULT_RETRY_INITIAL_DELAY_MS: u64 = 500;

/// Backoff ceiling between write attempts
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 8_000;

/// Concurrent image uploads per document
pub const DEFAULT_MEDIA_CONCURRENCY: usize = 4;

/// Default REST endpoint of the content host
pub const DEFAULT_API_BASE: &str = "https://api.notion.com";

/// API version header value sent with every host request
pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";

/// Per-request timeout for host calls
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Page size used when listing block children
pub const LIST_CHILDREN_PAGE_SIZE: usize = 100;
