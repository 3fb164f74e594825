//! # Markup Chunking
//!
//! Splits reduced markup into pieces that fit one LLM request. Splits land
//! just after a closing tag that ends a record-like block (a list item, a
//! table row, a div) so a person's name and title stay together.

use tracing::{debug, instrument};

/// Closing tags that end a self-contained block
pub const SAFE_BOUNDARIES: [&str; 8] = [
    "</li>",
    "</tr>",
    "</div>",
    "</p>",
    "</section>",
    "</article>",
    "</table>",
    "</ul>",
];

/// Largest char boundary at or below `index`
fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// End offsets of every safe boundary in `text`, ascending
fn boundary_ends(text: &str) -> Vec<usize> {
    let mut ends: Vec<usize> = SAFE_BOUNDARIES
        .iter()
        .flat_map(|tag| text.match_indices(tag).map(move |(i, _)| i + tag.len()))
        .collect();
    ends.sort_unstable();
    ends
}

/// Find where to end the next chunk of `text`.
///
/// Prefers the last safe boundary within `target` characters, as long as it
/// is past 30% of the target. Otherwise takes the first boundary beyond the
/// target that stays within `ceiling`. Failing both, forces a split at the
/// target.
fn find_split_point(text: &str, target: usize, ceiling: usize) -> usize {
    let ends = boundary_ends(text);

    if let Some(&end) = ends
        .iter()
        .rev()
        .find(|&&end| end <= target && end > target * 3 / 10)
    {
        return end;
    }

    if let Some(&end) = ends.iter().find(|&&end| end > target && end <= ceiling) {
        return end;
    }

    floor_char_boundary(text, target).max(text.chars().next().map_or(0, char::len_utf8))
}

/// Split `html` into chunks of at most `ceiling` characters, aiming for `target`
#[instrument(skip(html), fields(len = html.len()))]
pub fn chunk_html(html: &str, target: usize, ceiling: usize) -> Vec<String> {
    let target = target.max(1);
    let ceiling = ceiling.max(target);
    let mut chunks = Vec::new();
    let mut rest = html.trim();

    while !rest.is_empty() {
        if rest.len() <= target {
            chunks.push(rest.to_string());
            break;
        }
        let split = find_split_point(rest, target, ceiling);
        let (chunk, tail) = rest.split_at(split);
        let chunk = chunk.trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }
        rest = tail.trim_start();
    }

    debug!("split markup into {} chunks", chunks.len());
    chunks
}
