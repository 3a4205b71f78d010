use engine_logging::{engine_debug, engine_trace};

use crate::blocks::{ListRenderer, ParagraphRenderer};
use crate::config::RenderConfig;
use crate::dom::Document;
use crate::extract::TextExtractor;
use crate::footer::FooterTrimmer;
use crate::inline::{EmphasisRenderer, LinkRenderer};
use crate::normalize::Normalizer;
use crate::pass::TreePass;
use crate::sanitize::TagSanitizer;
use crate::split::ChunkSplitter;
use crate::table::TableRenderer;

/// Output of one render: the full text and the blocks to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    /// Title line plus normalized body, before splitting.
    pub text: String,
    /// Non-blank blocks within the budget, in delivery order.
    pub blocks: Vec<String>,
}

/// Turns an email body into size-bounded plain-text blocks.
///
/// Holds no per-call state; one renderer can serve any number of threads.
pub struct EmailRenderer {
    passes: Vec<Box<dyn TreePass>>,
    extractor: TextExtractor,
    normalizer: Normalizer,
    splitter: ChunkSplitter,
}

impl EmailRenderer {
    pub fn new(config: RenderConfig) -> Self {
        // Order matters: tables must see their cells before links and
        // emphasis flatten them, and lists must run before paragraphs.
        let passes: Vec<Box<dyn TreePass>> = vec![
            Box::new(FooterTrimmer::new(config.footer)),
            Box::new(TagSanitizer),
            Box::new(TableRenderer),
            Box::new(LinkRenderer),
            Box::new(EmphasisRenderer),
            Box::new(ListRenderer),
            Box::new(ParagraphRenderer),
        ];
        Self {
            passes,
            extractor: TextExtractor,
            normalizer: Normalizer,
            splitter: ChunkSplitter::new(config.budget),
        }
    }

    pub fn splitter(&self) -> ChunkSplitter {
        self.splitter
    }

    /// Runs every stage up to normalization and prepends `**title**`.
    pub fn render_text(&self, html: &str, title: Option<&str>) -> String {
        let mut nodes = Document::parse(html).nodes;
        for pass in &self.passes {
            nodes = pass.apply(nodes);
            engine_trace!("pass {} left {} top-level nodes", pass.name(), nodes.len());
        }
        let extracted = self.extractor.extract(&nodes);
        let body = self.normalizer.normalize(&extracted);

        match title.map(str::trim).filter(|t| !t.is_empty()) {
            Some(title) if body.is_empty() => format!("**{title}**"),
            Some(title) => format!("**{title}**\n\n{body}"),
            None => body,
        }
    }

    /// Splits text with this renderer's budget and drops blocks that are
    /// blank after trimming.
    pub fn split_blocks(&self, text: &str) -> Vec<String> {
        self.splitter
            .split(text)
            .into_iter()
            .filter(|block| !block.trim().is_empty())
            .collect()
    }

    pub fn render(&self, html: &str, title: Option<&str>) -> RenderedEmail {
        let text = self.render_text(html, title);
        let blocks = self.split_blocks(&text);
        engine_debug!(
            "rendered {} input bytes into {} chars across {} blocks",
            html.len(),
            text.chars().count(),
            blocks.len()
        );
        RenderedEmail { text, blocks }
    }
}

impl Default for EmailRenderer {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}
