//! Macro-expansion span resolution.
//!
//! rustc reports spans inside macro bodies against pseudo-files such as
//! `<std macros>`, with an `expansion` link back to the invocation. We only
//! care about the invocation site in the user's code.

use savecheck_types::Span;

/// A span that names a real file, and how many expansion links were
/// followed to reach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSpan<'a> {
    pub span: &'a Span,
    pub hops: usize,
}

/// Follow `span`'s expansion chain to the first span in a real file.
///
/// Spans already in a real file resolve to themselves with zero hops.
/// Returns `None` when the chain ends inside macro pseudo-files.
#[must_use]
pub fn resolve_span(span: &Span) -> Option<ResolvedSpan<'_>> {
    let mut current = span;
    let mut hops = 0;

    while current.is_macro_expansion() {
        match current.expanded_from() {
            Some(next) => {
                current = next;
                hops += 1;
            }
            None => {
                tracing::debug!(
                    file = %current.file_name,
                    hops,
                    "Macro expansion chain has no real-file origin"
                );
                return None;
            }
        }
    }

    Some(ResolvedSpan {
        span: current,
        hops,
    })
}
