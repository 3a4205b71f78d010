//! Whitespace cleanup that leaves fenced spans byte-for-byte intact.

use once_cell::sync::Lazy;
use regex::Regex;

static FENCED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```.*?```").expect("valid regex"));
static BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n\s*\n").expect("valid regex"));
static SPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Prose(&'a str),
    Fenced(&'a str),
}

/// Split text into alternating prose and fenced segments, in order.
/// Concatenating the segments gives back the input.
pub fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut last = 0;
    for found in FENCED.find_iter(text) {
        out.push(Segment::Prose(&text[last..found.start()]));
        out.push(Segment::Fenced(found.as_str()));
        last = found.end();
    }
    out.push(Segment::Prose(&text[last..]));
    out
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Normalizer;

impl Normalizer {
    pub fn normalize(&self, text: &str) -> String {
        let joined: String = segments(text)
            .into_iter()
            .map(|segment| match segment {
                Segment::Fenced(span) => format!("\n\n{span}\n\n"),
                Segment::Prose(prose) => clean_prose(prose),
            })
            .collect();
        joined.trim().to_string()
    }
}

fn clean_prose(prose: &str) -> String {
    let collapsed = BLANK_RUN.replace_all(prose, "\n\n");
    SPACE_RUN.replace_all(collapsed.trim(), " ").into_owned()
}
