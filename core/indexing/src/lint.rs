//! Vault health checks: broken links and incomplete front-matter.

use std::collections::HashSet;
use tracing::debug;
use vault_schemas::{LintIssue, Note, VaultConfig};

use crate::spans::strip_code;
use crate::vault::is_doc_basename;
use crate::wikilink::{is_path_qualified, parse_wikilinks};

/// Fields every person and concept note must carry
pub const REQUIRED_ENTITY_FIELDS: &[&str] = &["created", "type"];

/// Check every note, in scan order
pub fn lint_notes(notes: &[Note], config: &VaultConfig) -> Vec<LintIssue> {
    let stems: HashSet<&str> = notes.iter().map(|n| n.stem.as_str()).collect();
    let basenames: HashSet<&str> = notes.iter().map(|n| n.basename.as_str()).collect();
    let entity_types = [
        config.frontmatter.people_type.as_str(),
        config.frontmatter.concept_type.as_str(),
    ];

    let mut issues = Vec::new();

    for note in notes {
        if note.frontmatter.is_empty() && !is_doc_basename(&note.basename) {
            issues.push(LintIssue::MissingFrontmatter {
                file: note.rel_path.clone(),
            });
        }

        if let Some(note_type) = note.note_type().filter(|t| entity_types.contains(t)) {
            for field in REQUIRED_ENTITY_FIELDS {
                if !note.has_field(field) {
                    issues.push(LintIssue::MissingField {
                        file: note.rel_path.clone(),
                        field: field.to_string(),
                        note_type: note_type.to_string(),
                    });
                }
            }
        }

        let body = strip_code(&format!("{}\n", note.body));
        for link in parse_wikilinks(&body) {
            let normalized = link.replace('\\', "/");
            let resolved = if is_path_qualified(&normalized) {
                stems.contains(normalized.as_str())
            } else {
                basenames.contains(normalized.as_str())
            };
            if !resolved {
                issues.push(LintIssue::BrokenLink {
                    file: note.rel_path.clone(),
                    link,
                });
            }
        }
    }

    debug!("Lint found {} issues in {} notes", issues.len(), notes.len());
    issues
}
