use std::io::Write;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use roam::config::RoamConfig;
use roam::conversation::replies::{self, ShortReply};
use roam::conversation::{Controller, Conversation, ConversationState, TurnResponse};
use roam::extraction::llm::LlmExtractor;
use roam::timezone::{parse_zone, TownDirectory};

/// Interactive conversation on stdin/stdout. Ready drafts are published once
/// the user agrees; a failed publish keeps the draft so the user can retry.
pub async fn run(config: &RoamConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let mut conn = roam::db::open_database(&db_path)?;

    let default_zone = parse_zone(&config.towns.default_timezone)?;
    let towns = TownDirectory::load(&conn, default_zone)?;
    let extractor = LlmExtractor::new(&config.extraction)?;
    let controller = Controller::new(extractor, towns, config.conversation.clone());

    println!("Tell me about an event you'd like to post, or what you're looking for.");
    println!("Say \"start over\" to discard a draft, Ctrl-D to quit.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut conversation = Conversation::default();

    prompt()?;
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        if line.trim().is_empty() {
            prompt()?;
            continue;
        }

        let turn = controller.turn(&conversation, &line).await;
        conversation = turn.conversation;

        match turn.response {
            TurnResponse::FollowUp { questions, .. } => {
                println!("Almost there! A few more details:");
                for question in questions {
                    println!("  - {question}");
                }
            }
            TurnResponse::Confirm { message, .. } => println!("{message} (yes/no)"),
            TurnResponse::Ready { draft } => {
                // Without a confirm step the user has not seen the summary yet.
                if !config.conversation.require_confirmation {
                    println!("{}", draft.summary());
                    print!("Publish this event? [y/N] ");
                    std::io::stdout().flush()?;
                    let answer = lines.next_line().await?.unwrap_or_default();
                    if replies::classify(&answer) != ShortReply::Affirmative {
                        println!("Okay, not published. Tell me what to change, or say \"start over\".\n");
                        conversation.state = ConversationState::Gathering;
                        prompt()?;
                        continue;
                    }
                }
                match roam::events::publish(&mut conn, &draft, controller.towns()) {
                    Ok(event) => {
                        println!("Published \"{}\" ({})", event.event.title, event.id);
                        conversation = Conversation::default();
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "publish failed");
                        println!("Could not publish: {e}. Your draft is kept; say \"yes\" to retry.");
                    }
                }
            }
            TurnResponse::Search { query } => {
                let results =
                    roam::events::search_events(&conn, &query, None, config.search.default_limit)?;
                println!("Events matching \"{query}\":\n");
                super::print_events(&results);
            }
            TurnResponse::Message { message } => println!("{message}"),
            TurnResponse::Error { reason } => {
                println!("Sorry, I couldn't process that ({reason}). Please try again.");
            }
        }
        println!();
        prompt()?;
    }

    Ok(())
}

fn prompt() -> Result<()> {
    print!("> ");
    std::io::stdout().flush()?;
    Ok(())
}
