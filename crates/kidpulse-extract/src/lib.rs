//! KidPulse Extract: timestamp resolution, attribution, pattern cascade, dedup.

pub mod attribution;
pub mod cascade;
pub mod dedup;
pub mod extractor;
pub mod pattern;
pub mod segment;
pub mod temporal;

pub use attribution::{Attribution, AttributionFilter};
pub use cascade::{classify, classify_and_extract, FieldError};
pub use dedup::{is_duplicate, DedupIndex};
pub use extractor::{FeedExtractor, FeedInput};
pub use pattern::PatternExtractor;
pub use segment::{is_event_card, segment_feed};
pub use temporal::{render_12h, render_24h, render_full, resolve, resolve_full, try_resolve};
