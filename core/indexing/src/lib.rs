pub mod config;
pub mod entities;
pub mod error;
pub mod frontmatter;
pub mod lint;
pub mod references;
pub mod spans;
pub mod vault;
pub mod wikilink;

pub use config::load_config;
pub use entities::{build_alias_map, link_candidates, load_entities, AliasIndex, LinkCandidate};
pub use error::{Result, VaultError};
pub use frontmatter::{parse_note_text, ParsedText};
pub use lint::lint_notes;
pub use references::{count_references, stub_notes};
pub use spans::{segments, strip_code, Segment, SegmentKind};
pub use vault::{
    is_doc_basename, is_ignored_path, list_markdown_files, list_matching, read_note,
    relative_path, scan_notes,
};
pub use wikilink::{is_path_qualified, normalize_target, parse_wikilinks, split_wikilink, WIKILINK_RE};
