use std::sync::OnceLock;

use regex::{NoExpand, Regex};

fn subject_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Subject: \[PATCH.*?\]").expect("static regex"))
}

/// Whether `tag` can sit inside the subject brackets. Brackets would end
/// the prefix early and break re-decoration.
pub fn is_valid_tag(tag: &str) -> bool {
    !tag.contains(['[', ']', '\n'])
}

/// Inputs to the `[PATCH ...]` subject prefix of one artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoration<'a> {
    pub version: u32,
    pub tag: Option<&'a str>,
    pub order: u32,
    /// Number of artifacts sent together; 1 for a standalone patch.
    pub count: usize,
}

impl Decoration<'_> {
    /// The bracketed prefix, or `None` when nothing would change a plain
    /// `[PATCH]` subject.
    pub fn prefix(&self) -> Option<String> {
        let mut subject = String::from("PATCH");
        if self.version != 1 {
            subject.push_str(&format!(" v{}", self.version));
        }
        if let Some(tag) = self.tag.map(str::trim).filter(|t| !t.is_empty()) {
            subject.push(' ');
            subject.push_str(tag);
        }
        if self.count > 1 {
            subject.push_str(&format!(" {}/{}", self.order, self.count));
        }
        if subject == "PATCH" {
            return None;
        }
        Some(format!("[{subject}]"))
    }
}

/// Rewrite the first `Subject: [PATCH...]` header of a formatted patch.
///
/// Returns `None` when the decoration is empty; the artifact is then left
/// untouched. Rewriting an already decorated subject with the same inputs
/// yields the same text.
pub fn decorate_subject(text: &str, decoration: &Decoration<'_>) -> Option<String> {
    let prefix = decoration.prefix()?;
    let replacement = format!("Subject: {prefix}");
    Some(subject_re().replace(text, NoExpand(&replacement)).into_owned())
}

/// Reset a decorated subject to a plain `[PATCH]`, dropping any version,
/// tag or series counter left by an earlier decoration.
pub fn plain_subject(text: &str) -> String {
    subject_re()
        .replace(text, NoExpand("Subject: [PATCH]"))
        .into_owned()
}
