use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quitbet_core::store::LocalStore;
use quitbet_core::{progression, today_local, ProfileStore};

#[derive(Parser)]
#[command(name = "qbt")]
#[command(about = "Local-first recovery progress tracking and streak notifications")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current profile and derived counts
    Status,
    /// Set the onboarding baseline (average money bet per day)
    Onboard {
        /// Average amount bet per day before quitting
        bet: f64,
    },
    /// Mark a lesson day's lesson as complete
    Lesson {
        /// Lesson day (1-based)
        day: u32,
    },
    /// Mark a lesson day's challenge as complete
    Challenge {
        /// Lesson day (1-based)
        day: u32,
    },
    /// Run the daily progression check
    Daily,
    /// List notifications, newest first
    Notifications,
    /// Mark all notifications read
    ReadAll,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "quitbet=info,quitbet_core=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let data_dir = dirs::data_dir()
        .ok_or_else(|| anyhow::anyhow!("no platform data directory"))?
        .join("quitbet");
    std::fs::create_dir_all(&data_dir)?;
    tracing::debug!(path = %data_dir.display(), "Using data directory");
    let local = Arc::new(LocalStore::open(data_dir.join("profile.json"))?);
    let store = ProfileStore::initialize_guest(local).await?;

    match cli.command {
        Commands::Status => {
            let data = store.user_data().await?;
            let p = &data.profile;
            println!("plan:            {}", p.plan_type.as_str());
            println!("days clean:      {}", p.days_clean);
            println!("money saved:     ${:.2}", p.money_saved);
            println!("time saved:      {} min", p.time_saved);
            println!("points:          {}", p.points);
            println!("lessons done:    {}", data.completed_lessons);
            println!("challenges done: {}", data.completed_challenges);
            println!("unread:          {}", data.unread_notifications);
            if !store.has_completed_onboarding() {
                println!("\nonboarding incomplete: run `qbt onboard <bet>`");
            }
        }
        Commands::Onboard { bet } => {
            let profile = store.complete_onboarding(bet).await?;
            println!(
                "Baseline set: ${:.2}/day. Every clean day saves you that much.",
                profile.daily_bet_average
            );
        }
        Commands::Lesson { day } => {
            store.complete_lesson(day).await?;
            println!("Lesson {} complete.", day);
        }
        Commands::Challenge { day } => {
            store.complete_challenge(day).await?;
            println!("Challenge {} complete.", day);
        }
        Commands::Daily => {
            let outcome = progression::run_daily_check(&store, today_local()).await?;
            if outcome.advanced {
                println!("Streak advanced: {} days clean.", outcome.days_clean);
            } else {
                println!("No advance today ({} days clean).", outcome.days_clean);
            }
            for n in &outcome.notifications {
                println!("  [{}] {}: {}", n.kind.as_str(), n.title, n.message);
            }
        }
        Commands::Notifications => {
            let notifications = store.notifications().await?;
            if notifications.is_empty() {
                println!("No notifications.");
            }
            for n in notifications {
                let marker = if n.read { ' ' } else { '*' };
                println!(
                    "{} {} [{}] {}: {}",
                    marker,
                    n.created_at.format("%Y-%m-%d"),
                    n.kind.as_str(),
                    n.title,
                    n.message
                );
            }
        }
        Commands::ReadAll => {
            store.mark_all_notifications_read().await?;
            println!("All notifications marked read.");
        }
    }

    Ok(())
}
