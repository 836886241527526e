//! HTML → block conversion and commit engine
//!
//! Converts documentation HTML into a typed block tree ([`blocks`]) that
//! respects a block-based content host's limits, and writes it to the host
//! ([`commit`]) in batches, re-attaching content nested deeper than the host
//! allows once its owner exists.
//!
//! ```rust
//! use sn2n::{ConversionOptions, convert_html_to_blocks};
//!
//! let conversion = convert_html_to_blocks(
//!     "<ul><li>Open <b>Settings</b></li></ul>",
//!     &ConversionOptions::default(),
//! );
//! assert_eq!(conversion.blocks[0].kind(), "bulleted_list_item");
//! ```

pub mod blocks;
pub mod commit;
pub mod config;
pub mod converter;
pub mod host;
pub mod pipeline;
pub mod utils;

pub use blocks::{Annotations, Block, BlockContent, Color, RelocationId, RichText, TextRun};
pub use commit::{CommitError, CommitReport, CommitWarning, Container, commit_with_relocations};
pub use config::{CommitConfig, Config, ConfigError, HostConfig, RetryConfig};
pub use converter::{Conversion, ConversionOptions, ConversionWarning, convert_html_to_blocks};
pub use host::{ContentHost, ExternalImageService, HostError, ImageService, MemoryHost, NotionClient, Parent};
pub use pipeline::{DocumentPipeline, DocumentReport};
