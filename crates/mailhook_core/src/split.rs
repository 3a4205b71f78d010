//! Cascading greedy packer: paragraphs, then lines, then words, then a hard
//! cut of a single oversized word.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::Budget;

static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\n+").expect("valid regex"));
static WORD_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

const PARAGRAPH_SEPARATOR: &str = "\n\n";
const LINE_SEPARATOR: &str = "\n";
const WORD_SEPARATOR: &str = " ";

#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkSplitter {
    budget: Budget,
}

impl ChunkSplitter {
    pub fn new(budget: Budget) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> Budget {
        self.budget
    }

    /// Packs `text` into blocks of at most `budget` characters each.
    ///
    /// Always returns at least one block; empty input yields one empty block.
    /// A word longer than the budget is cut to exactly `budget` characters.
    pub fn split(&self, text: &str) -> Vec<String> {
        let limit = self.budget.get();
        let mut blocks = Vec::new();
        let mut current = Pending::default();

        for paragraph in PARAGRAPH_BREAK.split(text) {
            let len = char_len(paragraph);
            if current.fits(len, PARAGRAPH_SEPARATOR, limit) {
                current.append(paragraph, len, PARAGRAPH_SEPARATOR);
                continue;
            }
            current.flush(&mut blocks);
            current = if len <= limit {
                Pending::start(paragraph, len)
            } else {
                split_lines(paragraph, limit, &mut blocks)
            };
        }

        current.flush(&mut blocks);
        if blocks.is_empty() {
            blocks.push(String::new());
        }
        blocks
    }
}

fn split_lines(paragraph: &str, limit: usize, blocks: &mut Vec<String>) -> Pending {
    let mut pending = Pending::default();
    for line in paragraph.split(LINE_SEPARATOR) {
        let len = char_len(line);
        if pending.fits(len, LINE_SEPARATOR, limit) {
            pending.append(line, len, LINE_SEPARATOR);
            continue;
        }
        pending.flush(blocks);
        pending = if len <= limit {
            Pending::start(line, len)
        } else {
            split_words(line, limit, blocks)
        };
    }
    pending
}

fn split_words(line: &str, limit: usize, blocks: &mut Vec<String>) -> Pending {
    let mut pending = Pending::default();
    for word in WORD_BREAK.split(line) {
        let len = char_len(word);
        if pending.fits(len, WORD_SEPARATOR, limit) {
            pending.append(word, len, WORD_SEPARATOR);
            continue;
        }
        pending.flush(blocks);
        pending = if len <= limit {
            Pending::start(word, len)
        } else {
            let cut: String = word.chars().take(limit).collect();
            Pending::start(&cut, limit)
        };
    }
    pending
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Block under construction with its length in characters.
#[derive(Debug, Default)]
struct Pending {
    text: String,
    chars: usize,
}

impl Pending {
    fn start(piece: &str, chars: usize) -> Self {
        Self {
            text: piece.to_string(),
            chars,
        }
    }

    /// Room for `piece` plus a separator, counted even when the block is empty.
    fn fits(&self, piece_chars: usize, separator: &str, limit: usize) -> bool {
        self.chars + piece_chars + separator.len() <= limit
    }

    fn append(&mut self, piece: &str, piece_chars: usize, separator: &str) {
        if !self.text.is_empty() {
            self.text.push_str(separator);
            self.chars += separator.len();
        }
        self.text.push_str(piece);
        self.chars += piece_chars;
    }

    fn flush(&mut self, blocks: &mut Vec<String>) {
        let pending = std::mem::take(self);
        if !pending.text.is_empty() {
            blocks.push(pending.text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separator_is_reserved_even_for_the_first_piece() {
        let pending = Pending::default();
        assert!(!pending.fits(9, PARAGRAPH_SEPARATOR, 10));
        assert!(pending.fits(8, PARAGRAPH_SEPARATOR, 10));
    }

    #[test]
    fn flush_skips_empty_blocks() {
        let mut blocks = Vec::new();
        Pending::default().flush(&mut blocks);
        assert!(blocks.is_empty());
    }
}
