use clap::{Parser, Subcommand};
use nudge_git_provider::{github::GithubOptions, GitProvider};
use nudge_notify::{slack::SlackOptions, ChatNotifier};
use nudge_store::ReminderStore;
use tokio_util::sync::CancellationToken;

use crate::{
    analyze::{AnalysisService, Analyzer},
    config::Settings,
    notifier::PrNotifier,
    render,
    scheduler::ReminderScheduler,
};

#[derive(Parser)]
#[command(name = "git-nudge", about = "PR health signals and chat nudges")]
pub struct Command {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one pull request and print the result
    Analyze {
        owner: String,
        repo: String,
        pr_number: u64,
    },
    /// Process an inbound chat message containing PR links
    Notify {
        /// Channel to post to; defaults to NUDGE_CHANNEL
        #[arg(long)]
        channel: Option<String>,
        /// Thread timestamp to reply into
        #[arg(long)]
        thread: Option<String>,
        message: Vec<String>,
    },
    /// Run the reminder scheduler until interrupted
    Watch,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Command::parse();
    let settings = Settings::from_env();

    let provider = GitProvider::github(GithubOptions {
        token: settings.github_token.clone(),
        ..Default::default()
    })?;
    let analyzer = Analyzer::default();

    match cli.command {
        Commands::Analyze {
            owner,
            repo,
            pr_number,
        } => {
            let service = AnalysisService::new(provider, analyzer);
            let (pr, analysis) = service.analyze(&owner, &repo, pr_number).await?;

            println!("{}", serde_json::to_string_pretty(&analysis)?);

            if settings.slack_configured() {
                let chat = ChatNotifier::slack(slack_options(&settings))?;
                let content = render::render_single(&pr, &analysis);
                if let Err(e) = chat.post(&settings.default_channel, None, &content).await {
                    tracing::warn!("failed to post analysis to slack: {}", e);
                }
            }
        }
        Commands::Notify {
            channel,
            thread,
            message,
        } => {
            let chat = ChatNotifier::slack(slack_options(&settings))?;
            let store = ReminderStore::open(&settings.database_path).await?;
            let notifier = PrNotifier::new(
                provider,
                chat,
                store,
                analyzer,
                settings.reminder_delay,
            );

            let channel = channel.unwrap_or_else(|| settings.default_channel.clone());
            notifier
                .handle_message(&message.join(" "), &channel, thread.as_deref())
                .await;
        }
        Commands::Watch => {
            let chat = ChatNotifier::slack(slack_options(&settings))?;
            let store = ReminderStore::open(&settings.database_path).await?;
            let scheduler =
                ReminderScheduler::new(store, provider, chat, settings.scheduler_period);

            tracing::info!("starting reminder scheduler");
            let cancel = CancellationToken::new();
            let handle = {
                let cancel = cancel.clone();
                tokio::spawn(async move { scheduler.run(cancel).await })
            };

            tokio::signal::ctrl_c().await?;
            tracing::info!("shutting down");
            cancel.cancel();
            handle.await?;
        }
    }

    Ok(())
}

fn slack_options(settings: &Settings) -> SlackOptions {
    SlackOptions {
        bot_token: settings.slack_bot_token.clone(),
        webhook_url: settings.slack_webhook_url.clone(),
    }
}
