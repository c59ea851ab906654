//! Quill application binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Initialise tracing
//! 3. Load the document corpus and build the keyword search
//! 4. Run one conversation over stdin/stdout until EOF or `/quit`

mod cli;
mod corpus;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use quill_chat::{ConversationOrchestrator, ConversationalResponse};
use quill_core::config::QuillConfig;

use cli::CliArgs;
use corpus::{load_corpus, KeywordSearch};

fn print_response(response: &ConversationalResponse) {
    println!("\n{}\n", response.text);
    for (i, source) in response.sources.iter().enumerate() {
        println!("  [{}] {} ({})", i + 1, source.title, source.url);
    }
    if !response.follow_up_questions.is_empty() {
        println!();
        for question in &response.follow_up_questions {
            println!("  > {}", question);
        }
    }
    println!();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = QuillConfig::load_or_default(&config_file);
    if let Some(style) = args.style {
        config.conversation.response_style = style;
    }

    // Tracing.
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Quill v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    // Corpus.
    let corpus_path = args.resolve_corpus_path(&config.corpus.path);
    let documents = match load_corpus(&corpus_path) {
        Ok(docs) => docs,
        Err(e) => {
            tracing::warn!(path = %corpus_path.display(), error = %e, "Corpus unavailable, searching an empty corpus");
            Vec::new()
        }
    };
    let search = KeywordSearch::new(documents);
    if search.is_empty() {
        tracing::warn!("Corpus is empty; answers will carry no sources");
    }

    // Conversation.
    let orchestrator = ConversationOrchestrator::new(config.conversation.clone());
    let session_id = uuid::Uuid::new_v4().to_string();
    orchestrator.init_conversation(&session_id, args.kind, None)?;

    println!(
        "Quill ready: {} documents. Ask a question, or /summary, /history, /quit.",
        search.len()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut asked = false;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            "" => continue,
            "/quit" | "/exit" => break,
            "/summary" => {
                let summary = orchestrator.get_conversation_summary(&session_id)?;
                println!("{}", serde_json::to_string_pretty(&summary)?);
                continue;
            }
            "/history" => {
                for turn in orchestrator.get_conversation_history(&session_id, None)? {
                    println!("{:?}: {}", turn.role, turn.content);
                }
                continue;
            }
            _ => {}
        }

        let result = if asked {
            orchestrator
                .continue_conversation(&session_id, input, &search, None)
                .await
        } else {
            orchestrator
                .process_query(&session_id, input, &search, None)
                .await
        };

        match result {
            Ok(response) => {
                asked = true;
                print_response(&response);
            }
            Err(e) => tracing::error!(error = %e, "Query failed"),
        }
    }

    orchestrator.end_conversation(&session_id).await?;
    tracing::info!("Quill stopped");
    Ok(())
}
