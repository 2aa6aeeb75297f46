use chrono::{DateTime, Utc};
use nudge_git_provider::models::PrSnapshot;
use serde::Serialize;

/// A named health indicator about a PR, with a human message and a
/// recommended action.
#[derive(Debug, Clone, Serialize)]
pub struct Signal {
    pub name: String,
    pub detected: bool,
    pub message: String,
    pub action: String,
}

impl Signal {
    fn detected(name: &str, message: &str, action: &str) -> Self {
        Self {
            name: name.into(),
            detected: true,
            message: message.into(),
            action: action.into(),
        }
    }
}

/// Thresholds and keyword lists for the detection rules. Changing these
/// never changes rule order or semantics.
#[derive(Debug, Clone)]
pub struct SignalConfig {
    /// Total diff size above which a PR counts as large.
    pub large_pr_lines: u64,
    /// Added lines below which missing tests are not flagged; small diffs
    /// (docs, config) shouldn't demand tests.
    pub tests_min_added_lines: u64,
    /// Added lines above which missing docs are flagged.
    pub docs_min_added_lines: u64,
    /// Label that flags missing docs regardless of diff size.
    pub docs_label: String,
    /// Open-for-longer-than-this means stuck.
    pub stuck_after: chrono::Duration,
    pub test_keywords: Vec<String>,
    pub doc_keywords: Vec<String>,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            large_pr_lines: 500,
            tests_min_added_lines: 20,
            docs_min_added_lines: 100,
            docs_label: "feature".into(),
            stuck_after: chrono::Duration::days(2),
            test_keywords: vec!["test".into()],
            doc_keywords: vec![
                "doc".into(),
                "docs".into(),
                "documentation".into(),
                "readme.md".into(),
            ],
        }
    }
}

/// Evaluates every rule against the snapshot, in fixed order: Large PR,
/// No Tests, Docs Missing, Stuck PR. Rules are independent; only detected
/// signals are returned.
pub fn detect_signals(pr: &PrSnapshot, config: &SignalConfig, now: DateTime<Utc>) -> Vec<Signal> {
    let mut signals = Vec::new();

    if pr.lines_added + pr.lines_removed > config.large_pr_lines {
        signals.push(Signal::detected(
            "Large PR",
            "Heads up! This PR is a bit chunky 🍔",
            "Consider splitting it into smaller PRs.",
        ));
    }

    let has_test_files = pr.changed_filenames.iter().any(|f| {
        let f = f.to_lowercase();
        config.test_keywords.iter().any(|k| f.contains(k))
    });
    if !has_test_files && pr.lines_added > config.tests_min_added_lines {
        signals.push(Signal::detected(
            "No Tests",
            "No tests detected! 🧪",
            "Let's add one for safety.",
        ));
    }

    let has_doc_changes = pr.changed_filenames.iter().any(|f| {
        let f = f.to_lowercase();
        config.doc_keywords.iter().any(|k| f.contains(k))
    });
    let labelled_feature = pr
        .labels
        .iter()
        .any(|l| l.eq_ignore_ascii_case(&config.docs_label));
    if !has_doc_changes && (pr.lines_added > config.docs_min_added_lines || labelled_feature) {
        signals.push(Signal::detected(
            "Docs Missing",
            "Docs missing? 📚",
            "Consider updating documentation for these changes.",
        ));
    }

    if now - pr.created_at > config.stuck_after {
        signals.push(Signal::detected(
            "Stuck PR",
            "This PR has been open for more than 2 days. ⏳",
            "Suggest nudging reviewers.",
        ));
    }

    signals
}

#[cfg(test)]
pub(crate) mod test {
    use chrono::Duration;
    use nudge_git_provider::models::ReviewStatus;

    use super::*;

    pub fn snapshot() -> PrSnapshot {
        PrSnapshot {
            title: "Add widget cache".into(),
            description: Some("caches widgets".into()),
            author: "alice".into(),
            created_at: Utc::now(),
            files_changed: 3,
            lines_added: 50,
            lines_removed: 10,
            labels: vec![],
            review_status: ReviewStatus::Open,
            repo_name: "org/repo".into(),
            pr_number: 12,
            url: "https://github.com/org/repo/pull/12".into(),
            changed_filenames: vec!["src/cache.rs".into(), "tests/cache_test.rs".into()],
        }
    }

    fn names(signals: &[Signal]) -> Vec<&str> {
        signals.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_large_pr_threshold() {
        let config = SignalConfig::default();
        let mut pr = snapshot();

        pr.lines_added = 400;
        pr.lines_removed = 100;
        let signals = detect_signals(&pr, &config, Utc::now());
        assert!(!names(&signals).contains(&"Large PR"));

        pr.lines_removed = 101;
        let signals = detect_signals(&pr, &config, Utc::now());
        assert!(names(&signals).contains(&"Large PR"));
    }

    #[test]
    fn test_no_tests_requires_significant_added_lines() {
        let config = SignalConfig::default();
        let mut pr = snapshot();
        pr.changed_filenames = vec!["src/lib.rs".into()];

        pr.lines_added = 20;
        let signals = detect_signals(&pr, &config, Utc::now());
        assert!(!names(&signals).contains(&"No Tests"));

        pr.lines_added = 21;
        let signals = detect_signals(&pr, &config, Utc::now());
        assert!(names(&signals).contains(&"No Tests"));
    }

    #[test]
    fn test_no_tests_suppressed_by_any_test_path() {
        let config = SignalConfig::default();
        let mut pr = snapshot();
        pr.lines_added = 21;
        pr.changed_filenames = vec!["src/lib.rs".into(), "app/Test.py".into()];

        let signals = detect_signals(&pr, &config, Utc::now());
        assert!(!names(&signals).contains(&"No Tests"));
    }

    #[test]
    fn test_docs_missing_fires_on_feature_label() {
        let config = SignalConfig::default();
        let mut pr = snapshot();
        pr.lines_added = 30;
        pr.changed_filenames = vec!["src/lib.rs".into(), "tests/it.rs".into()];
        pr.labels = vec!["Feature".into()];

        let signals = detect_signals(&pr, &config, Utc::now());
        assert!(names(&signals).contains(&"Docs Missing"));

        pr.changed_filenames.push("README.md".into());
        let signals = detect_signals(&pr, &config, Utc::now());
        assert!(!names(&signals).contains(&"Docs Missing"));
    }

    #[test]
    fn test_stuck_pr_after_two_days() {
        let config = SignalConfig::default();
        let now = Utc::now();
        let mut pr = snapshot();

        pr.created_at = now - Duration::days(1);
        let signals = detect_signals(&pr, &config, now);
        assert!(!names(&signals).contains(&"Stuck PR"));

        pr.created_at = now - Duration::days(3);
        let signals = detect_signals(&pr, &config, now);
        assert!(names(&signals).contains(&"Stuck PR"));
    }

    #[test]
    fn test_signals_come_back_in_rule_order() {
        let config = SignalConfig::default();
        let now = Utc::now();
        let mut pr = snapshot();
        pr.lines_added = 600;
        pr.lines_removed = 100;
        pr.changed_filenames = vec!["src/lib.rs".into()];
        pr.created_at = now - Duration::days(3);

        let signals = detect_signals(&pr, &config, now);
        assert_eq!(
            names(&signals),
            vec!["Large PR", "No Tests", "Docs Missing", "Stuck PR"]
        );
        assert!(signals.iter().all(|s| s.detected));
    }
}
