use std::collections::HashSet;

use trawl_index::Database;
use trawl_types::{Match, SearchHit, SortOrder};

use crate::Result;

/// How matches are expanded into presentable results.
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    /// Maximum snippet length in characters.
    pub snippet_len: usize,
    /// Number of neighboring events to attach on each side of a match.
    pub context_lines: usize,
    /// Replace the snippet with the complete event content.
    pub full_content: bool,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            snippet_len: 180,
            context_lines: 0,
            full_content: false,
        }
    }
}

/// Expands raw matches with snippets and surrounding context.
pub struct ResultAssembler<'a> {
    db: &'a Database,
}

impl<'a> ResultAssembler<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn assemble(
        &self,
        query: &str,
        matches: Vec<Match>,
        sort: SortOrder,
        options: &AssembleOptions,
    ) -> Result<Vec<SearchHit>> {
        let mut hits = Vec::with_capacity(matches.len());

        for m in matches {
            let snippet = if options.full_content {
                m.content.clone()
            } else {
                make_snippet(&m.content, query, options.snippet_len)
            };

            let context = if options.context_lines > 0 {
                let n = options.context_lines as i64;
                self.db
                    .events_range(&m.session_id, (m.seq - n).max(0), m.seq + n)?
            } else {
                Vec::new()
            };

            hits.push(SearchHit {
                session_id: m.session_id,
                seq: m.seq,
                ts: m.ts,
                role: m.role,
                score: m.score,
                snippet,
                context,
                sort,
            });
        }

        Ok(hits)
    }
}

/// The full query matches first; individual tokens of at least two
/// characters keep multi-word queries useful when the exact phrase does not
/// occur. Order is preserved, deduplicated case-insensitively.
fn normalize_needles(query: &str) -> Vec<String> {
    let q = query.trim();
    if q.is_empty() {
        return Vec::new();
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut needles = Vec::new();
    for candidate in
        std::iter::once(q).chain(q.split_whitespace().filter(|p| p.chars().count() >= 2))
    {
        if seen.insert(candidate.to_lowercase()) {
            needles.push(candidate.to_string());
        }
    }
    needles
}

/// Find the earliest case-insensitive occurrence of the query (or one of its
/// tokens) in `text`. Returns a byte range into `text`, always starting on a
/// character boundary.
pub fn find_match_span(text: &str, query: &str) -> Option<(usize, usize)> {
    let needles = normalize_needles(query);
    if needles.is_empty() {
        return None;
    }

    // Lowercased copy with a byte-offset map back into the original, since
    // lowercasing can change character widths.
    let mut lower = String::with_capacity(text.len());
    let mut offsets: Vec<usize> = Vec::with_capacity(text.len());
    for (i, c) in text.char_indices() {
        for lc in c.to_lowercase() {
            for _ in 0..lc.len_utf8() {
                offsets.push(i);
            }
            lower.push(lc);
        }
    }

    let mut best: Option<(usize, usize)> = None;
    for needle in &needles {
        let needle_lower = needle.to_lowercase();
        if let Some(pos) = lower.find(&needle_lower) {
            let start = offsets[pos];
            let end = offsets
                .get(pos + needle_lower.len())
                .copied()
                .unwrap_or(text.len());
            if best.is_none_or(|(b, _)| start < b) {
                best = Some((start, end - start));
            }
        }
    }
    best
}

/// Bounded window around the first match occurrence, in whitespace-normalized
/// text, trimmed at character boundaries with elision markers.
pub fn make_snippet(text: &str, query: &str, max_len: usize) -> String {
    let t = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let total_chars = t.chars().count();
    if total_chars <= max_len {
        return t;
    }

    let Some((match_byte, _)) = find_match_span(&t, query) else {
        return format!("{}…", char_slice(&t, 0, max_len.saturating_sub(1)));
    };

    let match_char = t[..match_byte].chars().count();
    let start = match_char.saturating_sub(max_len / 3);
    let end = (start + max_len).min(total_chars);

    let mut snippet = char_slice(&t, start, end);
    if start > 0 {
        snippet = format!("…{}", snippet);
    }
    if end < total_chars {
        snippet.push('…');
    }
    snippet
}

fn char_slice(s: &str, start_char: usize, end_char: usize) -> String {
    s.chars()
        .skip(start_char)
        .take(end_char.saturating_sub(start_char))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_match_span_basic() {
        let span = find_match_span("hello duckpond duckpond", "duckpond").unwrap();
        assert_eq!(span, (6, 8));
    }

    #[test]
    fn test_find_match_span_case_insensitive() {
        let span = find_match_span("DuckPond here", "duckpond").unwrap();
        assert_eq!(span, (0, 8));
    }

    #[test]
    fn test_find_match_span_prefers_earliest_token() {
        // Full phrase absent; the earliest matching token wins.
        let span = find_match_span("beta alpha", "alpha gamma").unwrap();
        assert_eq!(span, (5, 5));
    }

    #[test]
    fn test_find_match_span_none_for_miss() {
        assert!(find_match_span("nothing here", "absent").is_none());
        assert!(find_match_span("nothing here", "   ").is_none());
    }

    #[test]
    fn test_snippet_returns_short_text_unchanged() {
        assert_eq!(make_snippet("short text", "text", 180), "short text");
    }

    #[test]
    fn test_snippet_normalizes_whitespace() {
        assert_eq!(make_snippet("a\n  b\tc", "b", 180), "a b c");
    }

    #[test]
    fn test_snippet_centers_on_match() {
        let filler = "x ".repeat(200);
        let text = format!("{}needle{}", filler, " y".repeat(200));
        let snippet = make_snippet(&text, "needle", 60);
        assert!(snippet.contains("needle"));
        assert!(snippet.starts_with('…'));
        assert!(snippet.ends_with('…'));
        assert!(snippet.chars().count() <= 62);
    }

    #[test]
    fn test_snippet_handles_multibyte_content() {
        let text = format!("{} needle {}", "é".repeat(300), "ü".repeat(300));
        let snippet = make_snippet(&text, "needle", 40);
        assert!(snippet.contains("needle"));
    }

    #[test]
    fn test_snippet_without_match_truncates_head() {
        let text = "word ".repeat(100);
        let snippet = make_snippet(&text, "absent", 20);
        assert!(snippet.ends_with('…'));
        assert!(snippet.chars().count() <= 20);
    }
}
