//! Protected-span rewriting.
//!
//! Rules only ever see text outside code fences. With link masking on, every
//! existing `[[...]]` span is swapped for an opaque placeholder first, so a
//! rule can never match inside a link. Replacement output is masked the same
//! way as soon as it is produced, which keeps later rules off it.

use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::trace;
use vault_indexing::{segments, WIKILINK_RE};

/// Placeholder delimiters and digits, all in the Unicode private-use area
const TOKEN_START: char = '\u{E000}';
const TOKEN_END: char = '\u{E001}';
const TOKEN_DIGIT_BASE: u32 = 0xE010;

/// Any character the placeholder encoding uses
static RESERVED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x{E000}-\x{E01F}]").unwrap());

type Replacer = Box<dyn Fn(&Captures<'_>) -> Option<String>>;

/// One pattern and what to put in place of each match.
///
/// The replacer returns `None` to leave a match untouched.
pub struct Rule {
    pattern: Regex,
    replace: Replacer,
    whole_word: bool,
}

impl Rule {
    pub fn new(pattern: Regex, replace: impl Fn(&Captures<'_>) -> Option<String> + 'static) -> Self {
        Self {
            pattern,
            replace: Box::new(replace),
            whole_word: false,
        }
    }

    /// Expand `$1`-style references from `template` for every match
    pub fn template(pattern: Regex, template: &str) -> Self {
        let template = template.to_string();
        Self::new(pattern, move |caps| {
            let mut out = String::new();
            caps.expand(&template, &mut out);
            Some(out)
        })
    }

    /// Only accept matches not touching a letter, digit or underscore
    pub fn whole_word(mut self) -> Self {
        self.whole_word = true;
        self
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("pattern", &self.pattern.as_str())
            .field("whole_word", &self.whole_word)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Hide existing wikilinks from every rule
    pub mask_links: bool,
}

impl RewriteOptions {
    pub const PROTECT_LINKS: RewriteOptions = RewriteOptions { mask_links: true };
}

/// Rewritten text and the number of replacements made
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub text: String,
    pub count: usize,
}

impl Rewrite {
    pub fn changed(&self) -> bool {
        self.count > 0
    }
}

/// Apply `rules` in order, one left-to-right sweep each, skipping fenced code.
pub fn rewrite(text: &str, rules: &[Rule], options: RewriteOptions) -> Rewrite {
    let mut out = String::with_capacity(text.len());
    let mut count = 0;

    for segment in segments(text) {
        if segment.is_fenced() || rules.is_empty() {
            out.push_str(segment.text);
            continue;
        }

        let mut masker = Masker::default();
        let mut current = masker.mask_all(&RESERVED_RE, segment.text);
        if options.mask_links {
            current = masker.mask_all(&WIKILINK_RE, &current);
        }

        for rule in rules {
            let (next, applied) = sweep(rule, &current, &mut masker);
            current = next;
            count += applied;
        }

        out.push_str(&masker.unmask(&current));
    }

    trace!("Rewrite applied {} replacements", count);
    Rewrite { text: out, count }
}

fn sweep(rule: &Rule, text: &str, masker: &mut Masker) -> (String, usize) {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut pos = 0;
    let mut applied = 0;

    while pos <= text.len() {
        let Some(caps) = rule.pattern.captures_at(text, pos) else {
            break;
        };
        let Some(m) = caps.get(0) else {
            break;
        };

        if m.is_empty() || (rule.whole_word && !is_word_bounded(text, m.start(), m.end())) {
            pos = next_char(text, m.start());
            continue;
        }

        pos = m.end();
        match (rule.replace)(&caps) {
            Some(replacement) if replacement != m.as_str() => {
                out.push_str(&text[last..m.start()]);
                out.push_str(&masker.protect(replacement));
                last = m.end();
                applied += 1;
            }
            _ => {}
        }
    }

    out.push_str(&text[last..]);
    (out, applied)
}

fn next_char(text: &str, at: usize) -> usize {
    at + text[at..].chars().next().map_or(1, char::len_utf8)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_word_bounded(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
}

/// Token to original text. Tokens are never reused within one rewrite.
#[derive(Debug, Default)]
struct Masker {
    spans: Vec<String>,
}

impl Masker {
    fn protect(&mut self, span: String) -> String {
        let token = encode_token(self.spans.len());
        self.spans.push(span);
        token
    }

    fn mask_all(&mut self, pattern: &Regex, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for m in pattern.find_iter(text) {
            out.push_str(&text[last..m.start()]);
            let token = self.protect(m.as_str().to_string());
            out.push_str(&token);
            last = m.end();
        }
        out.push_str(&text[last..]);
        out
    }

    /// Restore every token, including tokens nested inside restored spans
    fn unmask(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find(TOKEN_START) {
            out.push_str(&rest[..start]);
            let after = &rest[start + TOKEN_START.len_utf8()..];
            match decode_token(after).and_then(|(index, len)| Some((self.spans.get(index)?, len))) {
                Some((span, len)) => {
                    out.push_str(&self.unmask(span));
                    rest = &after[len..];
                }
                None => {
                    out.push(TOKEN_START);
                    rest = after;
                }
            }
        }

        out.push_str(rest);
        out
    }
}

fn encode_token(index: usize) -> String {
    let mut token = String::new();
    token.push(TOKEN_START);
    for digit in format!("{:x}", index).chars() {
        let value = digit.to_digit(16).unwrap_or(0);
        token.push(char::from_u32(TOKEN_DIGIT_BASE + value).unwrap_or(TOKEN_END));
    }
    token.push(TOKEN_END);
    token
}

/// Parse the digits and end marker following a token start.
/// Returns the index and the byte length consumed.
fn decode_token(s: &str) -> Option<(usize, usize)> {
    let mut index = 0usize;
    let mut digits = 0;
    for (offset, c) in s.char_indices() {
        if c == TOKEN_END {
            return (digits > 0).then_some((index, offset + c.len_utf8()));
        }
        let value = (c as u32).checked_sub(TOKEN_DIGIT_BASE).filter(|v| *v < 16)?;
        index = index.checked_mul(16)?.checked_add(value as usize)?;
        digits += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(word: &str, replacement: &'static str) -> Rule {
        Rule::new(Regex::new(&regex::escape(word)).unwrap(), move |_| {
            Some(replacement.to_string())
        })
    }

    #[test]
    fn test_fenced_code_is_untouched() {
        let text = "cat\n```\ncat\n```\ncat";
        let result = rewrite(text, &[literal("cat", "dog")], RewriteOptions::default());
        assert_eq!(result.text, "dog\n```\ncat\n```\ndog");
        assert_eq!(result.count, 2);
    }

    #[test]
    fn test_unclosed_fence_protects_rest() {
        let text = "cat\n```\ncat";
        let result = rewrite(text, &[literal("cat", "dog")], RewriteOptions::default());
        assert_eq!(result.text, "dog\n```\ncat");
    }

    #[test]
    fn test_existing_links_are_masked() {
        let text = "Alice and [[alice|Alice]] and [[Alice]]";
        let rules = [literal("Alice", "[[alice|Alice]]")];

        let masked = rewrite(text, &rules, RewriteOptions::PROTECT_LINKS);
        assert_eq!(masked.text, "[[alice|Alice]] and [[alice|Alice]] and [[Alice]]");
        assert_eq!(masked.count, 1);

        let unmasked = rewrite(text, &rules, RewriteOptions::default());
        assert_eq!(unmasked.count, 3);
    }

    #[test]
    fn test_later_rules_do_not_see_inserted_text() {
        let rules = [literal("a", "b"), literal("b", "c")];
        let result = rewrite("a b", &rules, RewriteOptions::default());
        assert_eq!(result.text, "b c");
        assert_eq!(result.count, 2);
    }

    #[test]
    fn test_whole_word_guard_resumes_at_next_char() {
        let rules = [literal("Ann", "[[ann|Ann]]").whole_word()];
        let result = rewrite("Anna Ann _Ann Ann2 éAnn (Ann)", &rules, RewriteOptions::default());
        assert_eq!(result.text, "Anna [[ann|Ann]] _Ann Ann2 éAnn ([[ann|Ann]])");
        assert_eq!(result.count, 2);
    }

    #[test]
    fn test_empty_matches_are_skipped() {
        let rules = [Rule::new(Regex::new("x*").unwrap(), |_| Some("y".into()))];
        let result = rewrite("abxxc", &rules, RewriteOptions::default());
        assert_eq!(result.text, "abyc");
        assert_eq!(result.count, 1);
    }

    #[test]
    fn test_declined_and_identical_replacements_do_not_count() {
        let rules = [
            Rule::new(Regex::new("keep").unwrap(), |_| None),
            Rule::new(Regex::new("same").unwrap(), |caps| Some(caps[0].to_string())),
        ];
        let result = rewrite("keep same", &rules, RewriteOptions::default());
        assert_eq!(result.text, "keep same");
        assert!(!result.changed());
    }

    #[test]
    fn test_template_rule() {
        let rules = [Rule::template(Regex::new(r"(\w+)@").unwrap(), "<$1>")];
        let result = rewrite("to bob@ now", &rules, RewriteOptions::default());
        assert_eq!(result.text, "to <bob> now");
    }

    #[test]
    fn test_private_use_text_round_trips() {
        let text = "odd \u{E000}\u{E010}\u{E001} chars [[x]] x";
        let rules = [literal("x", "y").whole_word()];
        let result = rewrite(text, &rules, RewriteOptions::PROTECT_LINKS);
        assert_eq!(result.text, "odd \u{E000}\u{E010}\u{E001} chars [[x]] y");
    }

    #[test]
    fn test_token_encoding() {
        for index in [0usize, 9, 15, 16, 255, 4096] {
            let token = encode_token(index);
            let body = &token[TOKEN_START.len_utf8()..];
            assert_eq!(decode_token(body), Some((index, body.len())));
        }
        assert_eq!(decode_token("abc"), None);
    }

    #[test]
    fn test_deterministic() {
        let text = "Alice met Bob\n```\nAlice\n```\n[[Bob]] and Alice";
        let rules = || vec![literal("Alice", "[[alice|Alice]]").whole_word(), literal("Bob", "[[bob|Bob]]").whole_word()];
        let first = rewrite(text, &rules(), RewriteOptions::PROTECT_LINKS);
        let second = rewrite(text, &rules(), RewriteOptions::PROTECT_LINKS);
        assert_eq!(first, second);
        assert_eq!(first.count, 3);
    }
}
