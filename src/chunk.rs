//! Sentence chunking.
//!
//! A document is split after every `.`, `!` or `?` that is followed by
//! whitespace. Offsets are byte offsets into the original string, so
//! `&text[chunk.start..chunk.end] == chunk.text` always holds.

use serde::{Deserialize, Serialize};

use crate::config::ChunkConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: usize,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Split `text` into trimmed, non-empty sentences.
pub fn sentence_split(text: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;
    let mut iter = text.char_indices().peekable();

    while let Some((i, c)) = iter.next() {
        if c.is_whitespace() && prev.is_some_and(is_terminal) {
            push_chunk(text, start, i, &mut chunks);
            // swallow the whole whitespace run
            let mut next = i + c.len_utf8();
            while let Some(&(j, w)) = iter.peek() {
                if !w.is_whitespace() {
                    break;
                }
                next = j + w.len_utf8();
                iter.next();
            }
            start = next;
            prev = None;
            continue;
        }
        prev = Some(c);
    }
    push_chunk(text, start, text.len(), &mut chunks);
    chunks
}

fn push_chunk(text: &str, start: usize, end: usize, out: &mut Vec<Chunk>) {
    let raw = &text[start..end];
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return;
    }
    let lead = raw.len() - raw.trim_start().len();
    let start = start + lead;
    out.push(Chunk { id: out.len(), start, end: start + trimmed.len(), text: trimmed.to_string() });
}

/// Pack consecutive sentences into windows of at most `target_chars` bytes.
///
/// A sentence longer than the target is its own window. Each new window
/// re-opens with trailing sentences of the previous one that fit inside
/// `overlap` bytes, but always advances by at least one sentence.
/// `target_chars == 0` returns the sentences unchanged.
pub fn chunk_document(text: &str, config: &ChunkConfig) -> Vec<Chunk> {
    let sentences = sentence_split(text);
    if config.target_chars == 0 || sentences.is_empty() {
        return sentences;
    }

    let mut out = Vec::new();
    let mut first = 0;
    while first < sentences.len() {
        let start = sentences[first].start;
        let mut last = first;
        while last + 1 < sentences.len() && sentences[last + 1].end - start <= config.target_chars {
            last += 1;
        }
        let end = sentences[last].end;
        out.push(Chunk { id: out.len(), start, end, text: text[start..end].to_string() });
        if last + 1 == sentences.len() {
            break;
        }

        let mut next = last + 1;
        while next - 1 > first && end - sentences[next - 1].start <= config.overlap {
            next -= 1;
        }
        first = next;
    }
    out
}

/// Chunk every document and flatten, renumbering chunk ids globally.
pub fn split_corpus<S: AsRef<str>>(docs: &[S], config: &ChunkConfig) -> Vec<Chunk> {
    let mut out = Vec::new();
    for doc in docs {
        for mut chunk in chunk_document(doc.as_ref(), config) {
            chunk.id = out.len();
            out.push(chunk);
        }
    }
    out
}
