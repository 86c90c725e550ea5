/// Render a command failure for the terminal: the top-level message, then
/// one `caused by:` line per underlying error.
pub fn format_error(err: &anyhow::Error) -> String {
    let mut msg = format!("error: {err}");
    for cause in err.chain().skip(1) {
        msg.push_str(&format!("\n  caused by: {cause}"));
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn prints_cause_chain() {
        let err = std::fs::read("/nonexistent/autopatch/workspace.toml")
            .context("reading workspace")
            .unwrap_err();
        let text = format_error(&err);
        assert!(text.starts_with("error: reading workspace"));
        assert!(text.contains("\n  caused by: "));
    }
}
