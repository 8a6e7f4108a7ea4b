use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// File extension every note carries
pub const NOTE_EXTENSION: &str = ".md";

/// Strip a trailing `.md` (any case) from a path or target string
pub fn strip_note_extension(s: &str) -> &str {
    if has_note_extension(s) {
        &s[..s.len() - NOTE_EXTENSION.len()]
    } else {
        s
    }
}

/// True when the string ends with `.md`, ignoring case
pub fn has_note_extension(s: &str) -> bool {
    s.len() >= NOTE_EXTENSION.len()
        && s.is_char_boundary(s.len() - NOTE_EXTENSION.len())
        && s[s.len() - NOTE_EXTENSION.len()..].eq_ignore_ascii_case(NOTE_EXTENSION)
}

// ============================================================================
// Front-matter Schema
// ============================================================================

/// A single front-matter value. YAML is loosely typed, so only the shapes the
/// tools actually read get their own variant; everything else is kept as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrontmatterValue {
    String(String),
    StringList(Vec<String>),
    Other(serde_json::Value),
}

impl FrontmatterValue {
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => FrontmatterValue::String(s),
            serde_json::Value::Array(items)
                if !items.is_empty() && items.iter().all(|v| v.is_string()) =>
            {
                FrontmatterValue::StringList(
                    items
                        .into_iter()
                        .filter_map(|v| match v {
                            serde_json::Value::String(s) => Some(s),
                            _ => None,
                        })
                        .collect(),
                )
            }
            other => FrontmatterValue::Other(other),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FrontmatterValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Coerce to a list of strings: a scalar string becomes a one-element
    /// list, a mixed list keeps its string members, anything else is empty.
    pub fn to_string_list(&self) -> Vec<String> {
        match self {
            FrontmatterValue::String(s) => vec![s.clone()],
            FrontmatterValue::StringList(items) => items.clone(),
            FrontmatterValue::Other(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            FrontmatterValue::Other(_) => Vec::new(),
        }
    }

    /// An explicit `key:` with no value (YAML null)
    pub fn is_missing(&self) -> bool {
        matches!(self, FrontmatterValue::Other(serde_json::Value::Null))
    }
}

/// Ordered front-matter mapping, keys in file order
pub type Frontmatter = IndexMap<String, FrontmatterValue>;

// ============================================================================
// Note Schema
// ============================================================================

#[derive(Debug, Clone)]
pub struct Note {
    pub abs_path: PathBuf,
    /// Vault-relative path, always `/` separated
    pub rel_path: String,
    /// `rel_path` without the `.md` extension
    pub stem: String,
    /// File name without the `.md` extension
    pub basename: String,
    pub frontmatter: Frontmatter,
    /// Raw front-matter block including both delimiter lines, empty if none
    pub header: String,
    pub body: String,
}

impl Note {
    /// Build a note, deriving `stem` and `basename` from `rel_path`
    pub fn new(
        abs_path: PathBuf,
        rel_path: &str,
        frontmatter: Frontmatter,
        header: String,
        body: String,
    ) -> Self {
        let rel_path = rel_path.replace('\\', "/");
        let stem = strip_note_extension(&rel_path).to_string();
        let basename = stem.rsplit('/').next().unwrap_or(&stem).to_string();

        Self {
            abs_path,
            rel_path,
            stem,
            basename,
            frontmatter,
            header,
            body,
        }
    }

    /// The `type` front-matter field when it is a string
    pub fn note_type(&self) -> Option<&str> {
        self.frontmatter.get("type").and_then(FrontmatterValue::as_str)
    }

    /// True when the field exists and is not null
    pub fn has_field(&self, key: &str) -> bool {
        self.frontmatter
            .get(key)
            .map(|v| !v.is_missing())
            .unwrap_or(false)
    }

    /// The file contents this note was parsed from
    pub fn raw_text(&self) -> String {
        format!("{}{}", self.header, self.body)
    }

    /// True when the note lives somewhere below `folder` (vault-relative)
    pub fn is_under(&self, folder: &str) -> bool {
        let folder = folder.replace('\\', "/");
        let folder = folder.trim_end_matches('/');
        if folder.is_empty() || folder == "." {
            return true;
        }
        self.rel_path
            .strip_prefix(folder)
            .map(|rest| rest.starts_with('/'))
            .unwrap_or(false)
    }
}

// ============================================================================
// Entity Schema
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    #[serde(rename = "person")]
    Person,
    #[serde(rename = "concept")]
    Concept,
}

/// A linkable person or concept note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub kind: EntityKind,
    /// Wikilink target (the note basename)
    pub target: String,
    pub aliases: Vec<String>,
}

impl Entity {
    /// Length in characters of the longest alias
    pub fn longest_alias_len(&self) -> usize {
        self.aliases
            .iter()
            .map(|a| a.chars().count())
            .max()
            .unwrap_or(0)
    }
}

// ============================================================================
// Promotion Plan Schema
// ============================================================================

/// Stub promotion plan, written to disk for review and applied later
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionPlan {
    #[serde(default)]
    pub vault_root: String,
    #[serde(default)]
    pub generated_at: String, // RFC3339
    pub moves: Vec<PromotionMove>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionMove {
    /// Stub basename
    #[serde(default)]
    pub from: String,
    /// Destination relative to the vault root, including `.md`
    #[serde(default)]
    pub to_rel_path: String,
}

// ============================================================================
// Lint Schema
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LintIssue {
    BrokenLink {
        file: String,
        link: String,
    },
    MissingFrontmatter {
        file: String,
    },
    MissingField {
        file: String,
        field: String,
        #[serde(rename = "noteType")]
        note_type: String,
    },
}

impl LintIssue {
    pub fn kind(&self) -> &'static str {
        match self {
            LintIssue::BrokenLink { .. } => "broken_link",
            LintIssue::MissingFrontmatter { .. } => "missing_frontmatter",
            LintIssue::MissingField { .. } => "missing_field",
        }
    }
}

impl fmt::Display for LintIssue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LintIssue::BrokenLink { file, link } => {
                write!(f, "broken_link  {} -> [[{}]]", file, link)
            }
            LintIssue::MissingFrontmatter { file } => write!(f, "missing_frontmatter  {}", file),
            LintIssue::MissingField {
                file,
                field,
                note_type,
            } => write!(f, "missing_field  {} missing {} ({})", file, field, note_type),
        }
    }
}

// ============================================================================
// Configuration Schema
// ============================================================================

/// Default values
pub mod defaults {
    pub const CONFIG_FILE: &str = "vault.config.json";
    pub const PEOPLE_DIR: &str = "03-people";
    pub const CONCEPTS_DIR: &str = "02-concepts";
    pub const MEETINGS_DIR: &str = "06-meetings";
    pub const STUBS_DIR: &str = "99-stubs";
    pub const PEOPLE_TYPE: &str = "person";
    pub const CONCEPT_TYPE: &str = "concept";
    pub const MEETING_TYPE: &str = "meeting-notes";
}

/// Per-invocation vault configuration. Every field falls back to its default
/// when absent from `vault.config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VaultConfig {
    pub vault_root: PathBuf,
    pub folders: FolderRoles,
    pub frontmatter: FrontmatterTypes,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            vault_root: PathBuf::from("."),
            folders: FolderRoles::default(),
            frontmatter: FrontmatterTypes::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolderRoles {
    pub people: Vec<String>,
    pub concepts: Vec<String>,
    pub meetings: Vec<String>,
    pub stubs: Vec<String>,
}

impl Default for FolderRoles {
    fn default() -> Self {
        Self {
            people: vec![defaults::PEOPLE_DIR.to_string()],
            concepts: vec![defaults::CONCEPTS_DIR.to_string()],
            meetings: vec![defaults::MEETINGS_DIR.to_string()],
            stubs: vec![defaults::STUBS_DIR.to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FrontmatterTypes {
    pub people_type: String,
    pub concept_type: String,
    pub meeting_type: String,
}

impl Default for FrontmatterTypes {
    fn default() -> Self {
        Self {
            people_type: defaults::PEOPLE_TYPE.to_string(),
            concept_type: defaults::CONCEPT_TYPE.to_string(),
            meeting_type: defaults::MEETING_TYPE.to_string(),
        }
    }
}

impl FrontmatterTypes {
    /// Map a note `type` string to the entity kind it declares
    pub fn entity_kind(&self, note_type: &str) -> Option<EntityKind> {
        if note_type == self.people_type {
            Some(EntityKind::Person)
        } else if note_type == self.concept_type {
            Some(EntityKind::Concept)
        } else {
            None
        }
    }
}
