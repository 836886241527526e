pub mod constants;
pub mod string_utils;
pub mod url_utils;

pub use constants::*;
pub use string_utils::{chunk_by_chars, safe_truncate_chars};
pub use url_utils::{LinkTarget, classify_link, is_valid_url};
