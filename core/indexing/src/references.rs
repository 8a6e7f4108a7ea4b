//! Link graph reference counting, used to find stubs worth promoting.

use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::debug;
use vault_schemas::{Note, VaultConfig};

use crate::wikilink::{is_path_qualified, parse_wikilinks};

/// Count wikilink occurrences pointing at each of `targets`.
///
/// Only note bodies are scanned. Path-qualified links never count toward a
/// bare basename. Every occurrence counts, so one note linking a target three
/// times contributes three. Keys appear in the order first referenced.
pub fn count_references(notes: &[Note], targets: &HashSet<String>) -> IndexMap<String, usize> {
    let mut refs: IndexMap<String, usize> = IndexMap::new();

    for note in notes {
        for target in parse_wikilinks(&note.body) {
            if is_path_qualified(&target) || !targets.contains(&target) {
                continue;
            }
            *refs.entry(target).or_insert(0) += 1;
        }
    }

    debug!("Counted references to {} of {} targets", refs.len(), targets.len());
    refs
}

/// Notes stored under one of the configured stub folders
pub fn stub_notes<'a>(notes: &'a [Note], config: &VaultConfig) -> Vec<&'a Note> {
    notes
        .iter()
        .filter(|note| config.folders.stubs.iter().any(|folder| note.is_under(folder)))
        .collect()
}
