use std::fmt::Write;

use nudge_git_provider::models::PrSnapshot;

use crate::analyze::AnalysisResult;

/// Message for a single analyzed PR.
pub fn render_single(pr: &PrSnapshot, analysis: &AnalysisResult) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "*<{}|{}>* by {}", pr.url, pr.title, pr.author);
    let _ = writeln!(out, "+{} / -{} lines", pr.lines_added, pr.lines_removed);
    let _ = writeln!(out, "{}", analysis.summary);

    if !analysis.signals.is_empty() {
        let _ = writeln!(out, "\n*Signals detected:*");
        for s in &analysis.signals {
            let _ = writeln!(out, "• {} _({})_", s.message, s.action);
        }
    }

    let _ = writeln!(
        out,
        "\n*Suggested reviewers:* {}",
        analysis.suggested_reviewers.join(", ")
    );
    let _ = write!(
        out,
        "_Review requested; I'll nudge again in 2 days if this is still open._"
    );

    out
}

/// Consolidated digest for two or more PRs found in one message, in link
/// appearance order.
pub fn render_digest(items: &[(PrSnapshot, AnalysisResult)]) -> String {
    let mut out = String::new();

    let _ = writeln!(out, ":mag: *{} PRs detected* — here's the rundown:", items.len());

    for (i, (pr, analysis)) in items.iter().enumerate() {
        let _ = writeln!(out, "---");
        let _ = writeln!(out, "*{}. <{}|{}>*", i + 1, pr.url, pr.title);
        let _ = writeln!(
            out,
            "by {} · +{} / -{} lines",
            pr.author, pr.lines_added, pr.lines_removed
        );
        let _ = writeln!(out, "{}", analysis.summary);

        if !analysis.signals.is_empty() {
            let names: Vec<&str> = analysis.signals.iter().map(|s| s.name.as_str()).collect();
            let _ = writeln!(out, "Signals: {}", names.join(", "));
        }

        let reviewers: Vec<&str> = analysis
            .suggested_reviewers
            .iter()
            .take(3)
            .map(|r| r.as_str())
            .collect();
        let _ = writeln!(out, "Reviewers: {}", reviewers.join(", "));
    }

    let _ = writeln!(out, "---");
    let _ = write!(
        out,
        "_Review requested for all {}; I'll nudge again in 2 days for any still open._",
        items.len()
    );

    out
}

/// Follow-up posted by the scheduler when a PR is still open after its due
/// delay.
pub fn render_nudge(pr: &PrSnapshot) -> String {
    format!(
        ":wave: @{}, *<{}|{}>* is still open after 2 days — might be worth a ping to reviewers.",
        pr.author, pr.url, pr.title
    )
}
