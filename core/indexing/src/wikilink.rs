//! Wikilink parsing and target normalization.
//!
//! `[[note|label]]`, `[[note#heading]]` and `[[note^block]]` all point at
//! `note`; the normalized target is what every comparison uses.

use regex::Regex;
use std::sync::LazyLock;
use vault_schemas::strip_note_extension;

/// A `[[...]]` span; group 1 is the interior
pub static WIKILINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\]]+)\]\]").unwrap());

const ALIAS_SEP: char = '|';
const HEADING_SEP: char = '#';
const BLOCK_SEP: char = '^';

/// Reduce a raw wikilink interior to its bare target.
///
/// Order is fixed: alias, heading, block, then extension.
pub fn normalize_target(raw: &str) -> String {
    let without_alias = before(raw, ALIAS_SEP).trim();
    let without_heading = before(without_alias, HEADING_SEP).trim();
    let mut target = before(without_heading, BLOCK_SEP).trim();

    loop {
        let stripped = strip_note_extension(target).trim();
        if stripped.len() == target.len() {
            break;
        }
        target = stripped;
    }

    target.to_string()
}

fn before(s: &str, sep: char) -> &str {
    s.split(sep).next().unwrap_or("")
}

/// Split a raw interior into the base target span and the untouched suffix
/// (alias, heading or block part, starting at its separator).
pub fn split_wikilink(raw: &str) -> (&str, &str) {
    let end = raw
        .find([ALIAS_SEP, HEADING_SEP, BLOCK_SEP])
        .unwrap_or(raw.len());
    raw.split_at(end)
}

/// True for targets that carry a folder path
pub fn is_path_qualified(target: &str) -> bool {
    target.contains('/') || target.contains('\\')
}

/// Normalized targets of every wikilink in `text`, first to last.
///
/// Same-note heading links (`[[#Heading]]`) and empty targets are skipped.
pub fn parse_wikilinks(text: &str) -> impl Iterator<Item = String> + '_ {
    WIKILINK_RE.captures_iter(text).filter_map(|cap| {
        let normalized = normalize_target(&cap[1]);
        if normalized.is_empty() || normalized.starts_with(HEADING_SEP) {
            None
        } else {
            Some(normalized)
        }
    })
}
