//! Recursive key search over arbitrary JSON.
//!
//! Used to discover follow-up URLs whose position in the document is not
//! fixed (replay links can sit under plays, goals, highlights, ...).

use serde_json::Value;

/// Pending work for the depth-first walk.
enum Step<'a> {
    /// Descend into this value looking for the target key.
    Visit(&'a Value),
    /// A value stored directly under the target key.
    Hit(&'a Value),
}

/// Collects every value stored under `target_key`, anywhere in `value`.
///
/// Mapping entries are visited in document order and sequence elements in
/// index order, so results come back in depth-first encounter order.
/// A value found under `target_key` is collected as-is and not searched
/// further; its siblings still are. Scalars contribute nothing.
///
/// The walk keeps its own stack, so nesting depth is bounded only by memory.
pub fn extract<'a>(value: &'a Value, target_key: &str) -> Vec<&'a Value> {
    let mut found = Vec::new();
    let mut stack = vec![Step::Visit(value)];

    while let Some(step) = stack.pop() {
        match step {
            Step::Hit(v) => found.push(v),
            Step::Visit(Value::Object(map)) => {
                // Reversed so the first entry is popped first.
                for (key, v) in map.iter().rev() {
                    if key == target_key {
                        stack.push(Step::Hit(v));
                    } else {
                        stack.push(Step::Visit(v));
                    }
                }
            }
            Step::Visit(Value::Array(items)) => {
                stack.extend(items.iter().rev().map(Step::Visit));
            }
            Step::Visit(_) => {}
        }
    }

    found
}

/// Like [`extract`], but keeps only string matches.
///
/// Non-string hits are reported through `on_skipped` so the caller can log them.
pub fn extract_strings<'a, F>(value: &'a Value, target_key: &str, mut on_skipped: F) -> Vec<&'a str>
where
    F: FnMut(&'a Value),
{
    extract(value, target_key)
        .into_iter()
        .filter_map(|v| match v.as_str() {
            Some(s) => Some(s),
            None => {
                on_skipped(v);
                None
            }
        })
        .collect()
}
