//! chalkboard-cli - Whiteboard Teaching AI scripting CLI
//!
//! Non-interactive access to the backend: list and inspect sessions, ask
//! questions, request animations, print derived media URLs. Pairs with the
//! interactive `chalkboard` TUI.

use anyhow::{Context, Result};
use chalkboard_core::{
    fetch_snapshot, validate_question, Animation, AnimationType, ApiClient, Backend, Config,
    CreateAnimation, CreateExplanation, CreateSession, Explanation, SessionSnapshot,
};
use chrono::Local;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "chalkboard-cli")]
#[command(about = "Whiteboard Teaching AI - scripting CLI")]
#[command(version)]
struct Args {
    /// Override the backend API base URL from the config file
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List recent sessions
    Sessions {
        /// Maximum number of sessions to print
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Show one session's full state: explanations and their animations
    Show {
        /// Opaque session identifier
        session_id: String,
    },
    /// Ask a question; creates a new session unless one is given
    Ask {
        question: String,
        /// Submit into an existing session instead of creating one
        #[arg(long)]
        session_id: Option<String>,
    },
    /// Delete a session
    Delete {
        /// Opaque session identifier
        session_id: String,
    },
    /// Show one explanation
    Explanation { id: i64 },
    /// Show one animation
    Animation {
        id: i64,
        /// Also print the derived video/thumbnail URLs
        #[arg(long)]
        urls: bool,
    },
    /// Request a new animation for an explanation
    Animate {
        explanation_id: i64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// mathematical, conceptual, procedural or interactive
        #[arg(long = "type", default_value = "conceptual")]
        animation_type: AnimationType,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load().context("failed to load configuration")?;
    if let Some(base_url) = args.base_url {
        config.api.base_url = base_url;
    }
    config.validate().context("invalid configuration")?;
    let _log_guard = chalkboard_core::logging::init(&config.logging).ok();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create async runtime")?;

    let client = ApiClient::new(&config.api).context("failed to create API client")?;

    match args.command {
        Command::Sessions { limit } => runtime.block_on(list_sessions(&client, limit)),
        Command::Show { session_id } => runtime.block_on(show_session(&client, &session_id)),
        Command::Ask {
            question,
            session_id,
        } => runtime.block_on(ask(&client, &question, session_id.as_deref())),
        Command::Delete { session_id } => runtime.block_on(delete_session(&client, &session_id)),
        Command::Explanation { id } => runtime.block_on(show_explanation(&client, id)),
        Command::Animation { id, urls } => runtime.block_on(show_animation(&client, id, urls)),
        Command::Animate {
            explanation_id,
            title,
            description,
            animation_type,
        } => runtime.block_on(animate(
            &client,
            explanation_id,
            title,
            description,
            animation_type,
        )),
    }
}

async fn list_sessions(client: &ApiClient, limit: usize) -> Result<()> {
    let mut sessions = client.list_sessions().await?;
    sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sessions.truncate(limit);

    if sessions.is_empty() {
        println!("No sessions yet.");
        return Ok(());
    }

    for session in sessions {
        let created = session
            .created_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M");
        println!("{}  {}  {}", session.session_id, created, session.title);
    }
    Ok(())
}

async fn show_session(client: &ApiClient, session_id: &str) -> Result<()> {
    let snapshot = fetch_snapshot(client, session_id).await?;
    print_snapshot(client, &snapshot);
    Ok(())
}

fn print_snapshot(client: &ApiClient, snapshot: &SessionSnapshot) {
    println!("{}", snapshot.session.title);
    println!("session: {}", snapshot.session.session_id);
    if let Some(description) = &snapshot.session.description {
        println!("{}", description);
    }
    println!();

    if snapshot.explanations.is_empty() {
        println!("No questions yet.");
        return;
    }

    for (idx, explanation) in snapshot.explanations.iter().enumerate() {
        println!(
            "Q{} [{}] {}",
            idx + 1,
            explanation.status,
            explanation.question
        );
        if let Some(text) = &explanation.explanation_text {
            for line in text.lines() {
                println!("    {}", line);
            }
        }
        for animation in snapshot.animations_for(explanation.id) {
            println!(
                "    animation {} [{}] {} ({})",
                animation.id, animation.status, animation.title, animation.animation_type
            );
            if let Some(duration) = animation.duration {
                println!("        duration: {:.1}s", duration);
            }
            println!("        video: {}", client.animation_file_url(animation.id));
        }
        println!();
    }
}

async fn ask(client: &ApiClient, question: &str, session_id: Option<&str>) -> Result<()> {
    let question = validate_question(question)?;

    let session_id = match session_id {
        Some(id) => id.to_string(),
        None => {
            let session = client
                .create_session(&CreateSession {
                    title: title_for_question(&question),
                    description: Some(question.clone()),
                    metadata: Some(serde_json::json!({ "created_from": "cli" })),
                })
                .await?;
            println!("created session {}", session.session_id);
            session.session_id
        }
    };

    let explanation = client
        .create_explanation(&CreateExplanation {
            session_id: session_id.clone(),
            question,
            metadata: None,
        })
        .await?;

    println!(
        "submitted question as explanation {} [{}]",
        explanation.id, explanation.status
    );
    println!("follow along with: chalkboard --session {}", session_id);
    Ok(())
}

async fn delete_session(client: &ApiClient, session_id: &str) -> Result<()> {
    client.delete_session(session_id).await?;
    println!("deleted session {}", session_id);
    Ok(())
}

async fn show_explanation(client: &ApiClient, id: i64) -> Result<()> {
    let explanation = client.get_explanation(id).await?;
    print_explanation(&explanation);
    Ok(())
}

fn print_explanation(explanation: &Explanation) {
    println!("explanation {} [{}]", explanation.id, explanation.status);
    println!("question: {}", explanation.question);
    if let Some(provider) = &explanation.llm_provider {
        println!("provider: {}", provider);
    }
    match &explanation.explanation_text {
        Some(text) => {
            println!();
            println!("{}", text);
        }
        None => println!("(no explanation text yet)"),
    }
}

async fn show_animation(client: &ApiClient, id: i64, urls: bool) -> Result<()> {
    let animation = client.get_animation(id).await?;
    print_animation(&animation);
    if urls {
        println!("video: {}", client.animation_file_url(animation.id));
        println!("thumbnail: {}", client.animation_thumbnail_url(animation.id));
    }
    Ok(())
}

fn print_animation(animation: &Animation) {
    println!(
        "animation {} [{}] {}",
        animation.id, animation.status, animation.title
    );
    println!("type: {}", animation.animation_type);
    if let Some(description) = &animation.description {
        println!("description: {}", description);
    }
    if let Some(duration) = animation.duration {
        println!("duration: {:.1}s", duration);
    }
}

async fn animate(
    client: &ApiClient,
    explanation_id: i64,
    title: String,
    description: Option<String>,
    animation_type: AnimationType,
) -> Result<()> {
    let animation = client
        .create_animation(&CreateAnimation {
            explanation_id,
            title,
            description,
            animation_type,
            metadata: None,
        })
        .await?;

    println!(
        "requested animation {} [{}] for explanation {}",
        animation.id, animation.status, animation.explanation_id
    );
    Ok(())
}

/// Title for a freshly created session: the question itself, clipped.
fn title_for_question(question: &str) -> String {
    if question.chars().count() > 50 {
        let head: String = question.chars().take(50).collect();
        format!("{}...", head)
    } else {
        question.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_for_question() {
        assert_eq!(title_for_question("Why is the sky blue?"), "Why is the sky blue?");

        let long = "a".repeat(80);
        let title = title_for_question(&long);
        assert_eq!(title.chars().count(), 53);
        assert!(title.ends_with("..."));
    }
}
