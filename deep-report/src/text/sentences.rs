//! Sentence splitting on terminal punctuation.
//!
//! A boundary is `.`, `?` or `!` followed by whitespace. Abbreviations and
//! decimal numbers followed by a space can produce false boundaries.

use once_cell::sync::Lazy;
use regex::Regex;

static BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.?!]\s+").expect("sentence boundary regex is valid"));

/// Split text into sentences, keeping the terminal punctuation on each sentence.
pub fn split_into_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for boundary in BOUNDARY.find_iter(text) {
        // The punctuation mark is a single ASCII byte
        let end = boundary.start() + 1;
        push_trimmed(&mut sentences, &text[start..end]);
        start = boundary.end();
    }
    push_trimmed(&mut sentences, &text[start..]);

    sentences
}

fn push_trimmed<'a>(sentences: &mut Vec<&'a str>, sentence: &'a str) {
    let sentence = sentence.trim();
    if !sentence.is_empty() {
        sentences.push(sentence);
    }
}
