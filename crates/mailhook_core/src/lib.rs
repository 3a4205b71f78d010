//! Mailhook core: renders an HTML email body into plain-text blocks that fit
//! a per-message character budget.
mod blocks;
mod config;
mod dom;
mod extract;
mod footer;
mod inline;
mod normalize;
mod pass;
mod pipeline;
mod sanitize;
mod split;
mod table;

pub use blocks::{ListRenderer, ParagraphRenderer};
pub use config::{
    Budget, ConfigError, FooterMarker, RenderConfig, DEFAULT_BLOCK_LIMIT, DEFAULT_FOOTER_CLASS,
    DEFAULT_FOOTER_TAG,
};
pub use dom::{Document, Element, Node, Tag};
pub use extract::TextExtractor;
pub use footer::FooterTrimmer;
pub use inline::{EmphasisRenderer, LinkRenderer};
pub use normalize::{segments, Normalizer, Segment};
pub use pass::TreePass;
pub use pipeline::{EmailRenderer, RenderedEmail};
pub use sanitize::TagSanitizer;
pub use split::ChunkSplitter;
pub use table::{collect_rows, render_rows, TableRenderer, FENCE, MAX_COLUMN_WIDTH};
