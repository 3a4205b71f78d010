use mailhook_core::{Budget, ChunkSplitter, ConfigError, EmailRenderer, RenderConfig};
use pretty_assertions::assert_eq;

fn splitter(limit: usize) -> ChunkSplitter {
    ChunkSplitter::new(Budget::new(limit).unwrap())
}

#[test]
fn zero_budget_is_rejected() {
    assert_eq!(Budget::new(0), Err(ConfigError::InvalidBudget(0)));
    assert!(RenderConfig::new(0, Default::default()).is_err());
}

#[test]
fn text_of_exactly_budget_length_is_one_block() {
    let text = "x".repeat(40);
    assert_eq!(splitter(40).split(&text), vec![text]);
}

#[test]
fn oversized_word_is_truncated_to_budget() {
    let blocks = splitter(10).split(&"a".repeat(20));
    assert_eq!(blocks, vec!["a".repeat(10)]);
}

#[test]
fn truncation_counts_characters_not_bytes() {
    let blocks = splitter(10).split(&"é".repeat(12));
    assert_eq!(blocks, vec!["é".repeat(10)]);
}

#[test]
fn empty_input_yields_single_empty_block() {
    assert_eq!(splitter(10).split(""), vec![String::new()]);
}

#[test]
fn paragraphs_are_packed_greedily() {
    let blocks = splitter(8).split("aaa\n\nbbb\n\nccc");
    assert_eq!(blocks, vec!["aaa\n\nbbb".to_string(), "ccc".to_string()]);
}

#[test]
fn long_paragraph_falls_back_to_lines() {
    let blocks = splitter(14).split("l1 one\nl2 two\nl3 three");
    assert_eq!(blocks, vec!["l1 one\nl2 two".to_string(), "l3 three".to_string()]);
}

#[test]
fn long_line_falls_back_to_words() {
    let blocks = splitter(11).split("alpha beta gamma delta");
    assert_eq!(blocks, vec!["alpha beta".to_string(), "gamma delta".to_string()]);
}

#[test]
fn pieces_after_a_line_split_keep_packing() {
    let blocks = splitter(12).split("one two three four\n\nfive");
    assert_eq!(
        blocks,
        vec!["one two".to_string(), "three four".to_string(), "five".to_string()]
    );
}

#[test]
fn every_block_fits_and_nothing_is_lost() {
    let text = (0..60)
        .map(|i| {
            if i % 7 == 0 {
                format!("para{i}\n\nline {i}\nmore words for line {i}")
            } else {
                format!("word{i} filler text")
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    for limit in [12, 25, 40, 100, 1800] {
        let blocks = splitter(limit).split(&text);
        assert!(blocks.iter().all(|b| b.chars().count() <= limit));
        assert!(!blocks.is_empty());

        let input_words: Vec<&str> = text.split_whitespace().collect();
        let output_words: Vec<&str> = blocks.iter().flat_map(|b| b.split_whitespace()).collect();
        assert_eq!(output_words, input_words, "limit {limit}");

        let total: usize = blocks.iter().map(|b| b.chars().count()).sum();
        assert!(total <= text.chars().count());
    }
}

#[test]
fn renderer_drops_blank_blocks() {
    let renderer = EmailRenderer::new(RenderConfig::new(50, Default::default()).unwrap());
    let rendered = renderer.render("<div>   </div>", None);
    assert_eq!(rendered.text, "");
    assert!(rendered.blocks.is_empty());
}

#[test]
fn rendered_blocks_respect_the_budget() {
    let items: String = (0..40)
        .map(|i| format!("<li>item number {i} with some text</li>"))
        .collect();
    let html = format!("<p>Intro</p><ul>{items}</ul><p>Outro</p>");
    let renderer = EmailRenderer::new(RenderConfig::new(200, Default::default()).unwrap());
    let rendered = renderer.render(&html, Some("Subject"));

    assert!(rendered.blocks.len() > 1);
    assert!(rendered.blocks.iter().all(|b| b.chars().count() <= 200));
    assert!(rendered.blocks[0].starts_with("**Subject**\n\nIntro"));
    assert!(rendered.blocks.last().unwrap().ends_with("Outro"));
}
