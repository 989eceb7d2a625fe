//! # Greedy Word Wrap
//!
//! Breaks text into lines that fit a pixel budget under a given measuring
//! function. Each source line is wrapped independently, so line breaks in the
//! input survive as hard breaks.
//!
//! ## Algorithm
//!
//! For every word of a source line, append it to the current line (single
//! space separator) and measure the candidate:
//!
//! - fits: the candidate becomes the current line
//! - too wide: emit the current line, even if it is empty, and start a new
//!   line with the word alone
//!
//! The last current line is emitted even if empty, so blank source lines keep
//! their vertical space. Words are never split: a word wider than the budget
//! gets a line of its own and overflows it.

/// Lines of text in display order, top to bottom.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrappedDocument {
    pub lines: Vec<String>,
}

impl WrappedDocument {
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }
}

/// Wrap a multi-line document.
///
/// An empty document yields one empty line.
pub fn wrap_text<F>(text: &str, budget: f32, measure: F) -> WrappedDocument
where
    F: Fn(&str) -> f32,
{
    let mut lines = Vec::new();
    for source_line in text.lines() {
        wrap_line_into(source_line, budget, &measure, &mut lines);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    WrappedDocument { lines }
}

fn wrap_line_into<F>(line: &str, budget: f32, measure: &F, out: &mut Vec<String>)
where
    F: Fn(&str) -> f32,
{
    let mut current = String::new();

    for word in line.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };

        if measure(&candidate) <= budget {
            current = candidate;
        } else {
            out.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }

    out.push(current);
}
