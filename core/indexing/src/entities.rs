//! Entity index: people and concept notes, and the aliases they go by.

use std::cmp::Reverse;
use std::collections::HashMap;
use tracing::debug;
use vault_schemas::{Entity, FrontmatterTypes, FrontmatterValue, Note};

/// Aliases shorter than this (in characters) never trigger a link
pub const MIN_ALIAS_LEN: usize = 3;

/// Common words never linked even when a note declares them as aliases
pub const ALIAS_STOPLIST: &[&str] = &["the", "and", "for", "with", "you", "them", "this"];

/// Collect entities from typed notes, longest alias first.
///
/// Ties keep scan order so the result is stable across runs.
pub fn load_entities(notes: &[Note], types: &FrontmatterTypes) -> Vec<Entity> {
    let mut entities: Vec<Entity> = notes
        .iter()
        .filter_map(|note| {
            let kind = types.entity_kind(note.note_type()?)?;
            Some(Entity {
                kind,
                target: note.basename.clone(),
                aliases: note_aliases(note),
            })
        })
        .collect();

    entities.sort_by_key(|e| Reverse(e.longest_alias_len()));

    debug!("Loaded {} entities", entities.len());
    entities
}

/// Trimmed, de-duplicated aliases; the basename when none are declared
fn note_aliases(note: &Note) -> Vec<String> {
    let declared = note
        .frontmatter
        .get("aliases")
        .map(FrontmatterValue::to_string_list)
        .unwrap_or_default();

    let mut aliases: Vec<String> = Vec::new();
    for alias in declared {
        let alias = alias.trim();
        if !alias.is_empty() && !aliases.iter().any(|a| a == alias) {
            aliases.push(alias.to_string());
        }
    }

    if aliases.is_empty() {
        aliases.push(note.basename.clone());
    }
    aliases
}

/// Lower-cased alias to entity. The first entity to register an alias keeps it.
#[derive(Debug, Default)]
pub struct AliasIndex<'a> {
    by_alias: HashMap<String, &'a Entity>,
}

impl<'a> AliasIndex<'a> {
    pub fn get(&self, alias: &str) -> Option<&'a Entity> {
        self.by_alias.get(&alias.to_lowercase()).copied()
    }

    /// True when `entity` owns `alias` in this index
    pub fn claims(&self, alias: &str, entity: &Entity) -> bool {
        self.get(alias).map(|owner| owner == entity).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.by_alias.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_alias.is_empty()
    }
}

pub fn build_alias_map(entities: &[Entity]) -> AliasIndex<'_> {
    let mut by_alias = HashMap::new();
    for entity in entities {
        for alias in &entity.aliases {
            by_alias.entry(alias.to_lowercase()).or_insert(entity);
        }
    }
    AliasIndex { by_alias }
}

/// An alias eligible to become a link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCandidate<'a> {
    pub entity: &'a Entity,
    pub alias: &'a str,
}

/// Aliases that may trigger a link, in matching order.
///
/// Drops short aliases, stoplisted words and aliases another entity
/// registered first.
pub fn link_candidates<'a>(entities: &'a [Entity], index: &AliasIndex<'a>) -> Vec<LinkCandidate<'a>> {
    entities
        .iter()
        .flat_map(|entity| entity.aliases.iter().map(move |alias| (entity, alias.as_str())))
        .filter(|(entity, alias)| {
            alias.chars().count() >= MIN_ALIAS_LEN
                && !ALIAS_STOPLIST.contains(&alias.to_lowercase().as_str())
                && index.claims(alias, entity)
        })
        .map(|(entity, alias)| LinkCandidate { entity, alias })
        .collect()
}
