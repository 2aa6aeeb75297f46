use nudge_git_provider::models::PrLocator;

/// Extracts every GitHub pull-request reference from an inbound chat
/// message, in order of first appearance. Duplicate references to the same
/// PR are collapsed to the first occurrence.
pub fn extract_pr_links(message: &str) -> Vec<PrLocator> {
    const HOST: &str = "github.com/";

    let mut found = Vec::new();
    let mut rest = message;
    while let Some(idx) = rest.find(HOST) {
        let after = &rest[idx + HOST.len()..];
        if let Some(locator) = parse_path(after) {
            if !found.contains(&locator) {
                found.push(locator);
            }
        }
        rest = after;
    }

    found
}

fn parse_path(s: &str) -> Option<PrLocator> {
    // Chat clients wrap links as <url|label> and surround them with
    // punctuation; cut the path at the first such delimiter.
    let end = s
        .find(|c: char| c.is_whitespace() || matches!(c, '|' | '<' | '>'))
        .unwrap_or(s.len());
    let mut segments = s[..end].split('/');

    let owner = segments.next().filter(|s| !s.is_empty())?;
    let repo = segments.next().filter(|s| !s.is_empty())?;
    if segments.next()? != "pull" {
        return None;
    }
    let digits: String = segments
        .next()?
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    let number = digits.parse().ok()?;

    Some(PrLocator {
        owner: owner.into(),
        repo: repo.into(),
        number,
    })
}
