/// One recipient suggested by `get_maintainer.pl`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Maintainer {
    pub email: String,
    /// Person name, or the role text for bare list addresses.
    pub name: String,
}

/// Parse `get_maintainer.pl` output.
///
/// Accepts `Name <mail> (role)`, `"Name" <mail> (role)` and `mail (role)`
/// lines; anything without an `@` is skipped, as are repeated addresses.
pub fn parse_maintainers(output: &str) -> Vec<Maintainer> {
    let mut found: Vec<Maintainer> = Vec::new();
    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let (who, role) = match line.rfind(" (") {
            Some(pos) if line.ends_with(')') => (&line[..pos], &line[pos + 2..line.len() - 1]),
            _ => (line, ""),
        };

        let (email, name) = match (who.find('<'), who.rfind('>')) {
            (Some(open), Some(close)) if open < close => {
                let name = who[..open].trim().trim_matches('"').trim();
                (who[open + 1..close].trim(), name)
            }
            _ => (who.trim(), role),
        };

        if !email.contains('@') || found.iter().any(|m| m.email == email) {
            continue;
        }
        found.push(Maintainer {
            email: email.to_string(),
            name: if name.is_empty() { role } else { name }.to_string(),
        });
    }
    found
}
