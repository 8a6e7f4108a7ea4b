//! Split note text into its YAML front-matter block and body.
//!
//! A front-matter block is recognized only when the very first line is `---`
//! and a later line closes it with `---` (or `...`). Anything that fails to
//! parse as a YAML mapping is treated as plain body text.

use tracing::warn;
use vault_schemas::{Frontmatter, FrontmatterValue};

/// Note text split into its parts. `header + body` is always the input text.
#[derive(Debug, Clone, Default)]
pub struct ParsedText {
    /// Raw front-matter block including both delimiter lines
    pub header: String,
    pub frontmatter: Frontmatter,
    pub body: String,
}

impl ParsedText {
    fn plain(content: &str) -> Self {
        Self {
            header: String::new(),
            frontmatter: Frontmatter::new(),
            body: content.to_string(),
        }
    }
}

/// Parse note text. Never fails: malformed front-matter degrades to an empty
/// map with the whole text as body.
pub fn parse_note_text(content: &str) -> ParsedText {
    let Some((yaml_range, header_end)) = locate_block(content) else {
        return ParsedText::plain(content);
    };

    let yaml = &content[yaml_range];
    let frontmatter = if yaml.trim().is_empty() {
        Frontmatter::new()
    } else {
        match serde_yaml::from_str::<serde_yaml::Value>(yaml) {
            Ok(serde_yaml::Value::Null) => Frontmatter::new(),
            Ok(serde_yaml::Value::Mapping(mapping)) => mapping_to_frontmatter(mapping),
            Ok(_) => {
                warn!("Front-matter is not a mapping, treating note as plain text");
                return ParsedText::plain(content);
            }
            Err(e) => {
                warn!("Failed to parse front-matter: {}", e);
                return ParsedText::plain(content);
            }
        }
    };

    ParsedText {
        header: content[..header_end].to_string(),
        frontmatter,
        body: content[header_end..].to_string(),
    }
}

/// Find the YAML byte range and the offset where the body starts
fn locate_block(content: &str) -> Option<(std::ops::Range<usize>, usize)> {
    let mut lines = LineSpans::new(content);

    let (_, first_end, first) = lines.next()?;
    if first.trim_end() != "---" {
        return None;
    }

    for (start, end, line) in lines {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            return Some((first_end..start, end));
        }
    }

    None
}

fn mapping_to_frontmatter(mapping: serde_yaml::Mapping) -> Frontmatter {
    let mut frontmatter = Frontmatter::new();

    for (key, value) in mapping {
        let key = match key {
            serde_yaml::Value::String(s) => s,
            serde_yaml::Value::Number(n) => n.to_string(),
            serde_yaml::Value::Bool(b) => b.to_string(),
            other => {
                warn!("Skipping front-matter key with unsupported type: {:?}", other);
                continue;
            }
        };
        let json = serde_json::to_value(&value).unwrap_or(serde_json::Value::Null);
        frontmatter.insert(key, FrontmatterValue::from_json(json));
    }

    frontmatter
}

/// Iterator over `(start, end_including_newline, line_without_newline)`
pub(crate) struct LineSpans<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> LineSpans<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }
}

impl<'a> Iterator for LineSpans<'a> {
    type Item = (usize, usize, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.text.len() {
            return None;
        }
        let start = self.pos;
        let rest = &self.text[start..];
        let (line, end) = match rest.find('\n') {
            Some(i) => (&rest[..i], start + i + 1),
            None => (rest, self.text.len()),
        };
        self.pos = end;
        Some((start, end, line.strip_suffix('\r').unwrap_or(line)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_note_with_frontmatter() {
        let content = "---\ncreated: 2026-01-01\ntype: person\naliases: [Alice Example, Alice]\n---\n\n# Alice\n";
        let parsed = parse_note_text(content);

        assert_eq!(parsed.header, "---\ncreated: 2026-01-01\ntype: person\naliases: [Alice Example, Alice]\n---\n");
        assert_eq!(parsed.body, "\n# Alice\n");
        assert_eq!(
            parsed.frontmatter.get("type").and_then(FrontmatterValue::as_str),
            Some("person")
        );
        assert_eq!(
            parsed.frontmatter["aliases"].to_string_list(),
            vec!["Alice Example", "Alice"]
        );
        let keys: Vec<&String> = parsed.frontmatter.keys().collect();
        assert_eq!(keys, vec!["created", "type", "aliases"]);
    }

    #[test]
    fn test_parse_note_no_frontmatter() {
        let content = "# Just a heading\n\n---\nnot: frontmatter\n---\n";
        let parsed = parse_note_text(content);
        assert!(parsed.frontmatter.is_empty());
        assert!(parsed.header.is_empty());
        assert_eq!(parsed.body, content);
    }

    #[test]
    fn test_malformed_frontmatter_degrades_to_plain_text() {
        let content = "---\ntitle: [unclosed\n---\nBody\n";
        let parsed = parse_note_text(content);
        assert!(parsed.frontmatter.is_empty());
        assert_eq!(parsed.body, content);
    }

    #[test]
    fn test_unterminated_block_is_body() {
        let content = "---\ntitle: x\nno closing line";
        let parsed = parse_note_text(content);
        assert!(parsed.frontmatter.is_empty());
        assert_eq!(parsed.body, content);
    }

    #[test]
    fn test_scalar_document_is_not_frontmatter() {
        let content = "---\njust a string\n---\nBody";
        let parsed = parse_note_text(content);
        assert!(parsed.header.is_empty());
        assert_eq!(parsed.body, content);
    }

    #[test]
    fn test_empty_block_and_crlf() {
        let parsed = parse_note_text("---\r\n---\r\nBody");
        assert_eq!(parsed.header, "---\r\n---\r\n");
        assert!(parsed.frontmatter.is_empty());
        assert_eq!(parsed.body, "Body");
    }

    #[test]
    fn test_header_plus_body_reproduces_input() {
        let content = "---\ntype: concept\n...\nText [[link]]";
        let parsed = parse_note_text(content);
        assert_eq!(format!("{}{}", parsed.header, parsed.body), content);
        assert_eq!(parsed.body, "Text [[link]]");
    }
}
