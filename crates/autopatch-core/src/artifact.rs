//! Naming and text rules for formatted-patch artifacts.

use std::sync::OnceLock;

use regex::{NoExpand, Regex};

use crate::CoreError;

const PATCH_SUFFIX: &str = ".patch";

fn stem(patch: &str) -> Result<&str, CoreError> {
    patch
        .strip_suffix(PATCH_SUFFIX)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CoreError::InvalidArtifactName(patch.to_string()))
}

/// `0001-fix.patch` -> `0001-fix_cover.patch`
pub fn cover_name(patch: &str) -> Result<String, CoreError> {
    Ok(format!("{}_cover{PATCH_SUFFIX}", stem(patch)?))
}

/// `0001-fix.patch` -> `0001-fix_<suffix>.patch`
pub fn clone_name(patch: &str, suffix: &str) -> Result<String, CoreError> {
    Ok(format!("{}_{suffix}{PATCH_SUFFIX}", stem(patch)?))
}

fn blurb_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*\*[\s\S]*\*\*\*").expect("static regex"))
}

/// Replace the `*** SUBJECT HERE *** ... *** BLURB HERE ***` span of a
/// generated cover letter with the edited cover text.
///
/// The span starts inside the subject header, so the first line of `cover`
/// becomes the cover letter subject. Returns `None` if the template markers
/// are missing.
pub fn substitute_cover_body(template: &str, cover: &str) -> Option<String> {
    if !blurb_re().is_match(template) {
        return None;
    }
    Some(blurb_re().replace(template, NoExpand(cover.trim_end())).into_owned())
}

/// Recover the commit message carried by a `git format-patch` artifact:
/// the subject without its `[PATCH ...]` prefix, then the body up to the
/// `---` separator.
pub fn commit_message(text: &str) -> Option<String> {
    let mut lines = text.lines();
    let mut subject = lines
        .by_ref()
        .find_map(|l| l.strip_prefix("Subject: "))?
        .to_string();

    // Folded header continuation lines start with whitespace.
    let mut rest = Vec::new();
    for line in lines.by_ref() {
        if line.starts_with(' ') || line.starts_with('\t') {
            subject.push(' ');
            subject.push_str(line.trim());
            continue;
        }
        rest.push(line);
        break;
    }

    let subject = strip_patch_prefix(&subject).trim().to_string();
    if subject.is_empty() {
        return None;
    }

    // Skip any remaining header lines up to the blank separator.
    let mut in_headers = rest.first().is_some_and(|l| !l.is_empty());
    let mut body = Vec::new();
    for line in rest.into_iter().chain(lines) {
        if in_headers {
            if line.is_empty() {
                in_headers = false;
            }
            continue;
        }
        if line == "---" {
            break;
        }
        body.push(line);
    }

    while body.first().is_some_and(|l| l.trim().is_empty()) {
        body.remove(0);
    }
    while body.last().is_some_and(|l| l.trim().is_empty()) {
        body.pop();
    }

    let mut message = subject;
    if !body.is_empty() {
        message.push_str("\n\n");
        message.push_str(&body.join("\n"));
    }
    message.push('\n');
    Some(message)
}

fn strip_patch_prefix(subject: &str) -> &str {
    let trimmed = subject.trim_start();
    if trimmed.starts_with("[PATCH") {
        if let Some(end) = trimmed.find(']') {
            return &trimmed[end + 1..];
        }
    }
    trimmed
}
