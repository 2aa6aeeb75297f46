/// Process configuration, resolved once at startup and handed to component
/// constructors. Every field comes from the environment (`.env` is loaded
/// before this runs).
#[derive(Clone, Debug)]
pub struct Settings {
    pub github_token: Option<String>,
    pub slack_bot_token: Option<String>,
    pub slack_webhook_url: Option<String>,
    pub default_channel: String,
    pub database_path: String,
    /// Delay before a posted PR gets its follow-up recheck.
    pub reminder_delay: chrono::Duration,
    /// How often the scheduler scans for due reminders.
    pub scheduler_period: std::time::Duration,
}

impl Settings {
    pub fn from_env() -> Self {
        let reminder_delay_hours = env_parse("NUDGE_REMINDER_DELAY_HOURS", 48);
        let scheduler_period_secs = env_parse("NUDGE_SCHEDULER_PERIOD_SECS", 3600);

        Self {
            github_token: std::env::var("GITHUB_API_TOKEN").ok(),
            slack_bot_token: std::env::var("SLACK_BOT_TOKEN").ok(),
            slack_webhook_url: std::env::var("SLACK_WEBHOOK_URL").ok(),
            default_channel: std::env::var("NUDGE_CHANNEL")
                .unwrap_or_else(|_| "#code-reviews".into()),
            database_path: std::env::var("NUDGE_DATABASE_PATH")
                .unwrap_or_else(|_| "./nudge.db".into()),
            reminder_delay: chrono::Duration::hours(reminder_delay_hours),
            scheduler_period: std::time::Duration::from_secs(scheduler_period_secs),
        }
    }

    pub fn slack_configured(&self) -> bool {
        self.slack_bot_token.is_some() || self.slack_webhook_url.is_some()
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
