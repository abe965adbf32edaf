use anyhow::Result;
use console::style;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::sync::Arc;
use termimad::MadSkin;
use tracing::debug;
use wanderplan_core::agent::is_exit_command;
use wanderplan_core::config::{self, Config};
use wanderplan_core::providers::{create_chat_search, create_model_client};
use wanderplan_core::tools;
use wanderplan_core::{ContextBuilder, ConversationLoop, TurnOutcome};

const FAREWELL: &str = "Safe travels! Goodbye.";
const THINKING: &str = "Thinking...";

fn waiting_notice(input: &str) -> Option<&'static str> {
    (!is_exit_command(input)).then_some(THINKING)
}

fn history_path() -> std::path::PathBuf {
    config::get_wanderplan_dir().join("history.txt")
}

pub async fn run(config: &Config) -> Result<()> {
    let model = Arc::new(create_model_client(config)?);
    let search = create_chat_search(config);

    let prompt = ContextBuilder::new()
        .with_tools(tools::catalog())
        .build_system_prompt();
    let mut conversation =
        ConversationLoop::new(model, search, config.chat).with_system_prompt(prompt);

    let skin = MadSkin::default();
    let mut editor = DefaultEditor::new()?;
    let _ = editor.load_history(&history_path());

    println!("{}", style("wanderplan").cyan().bold());
    println!("{}", style("Ask about your trip. Type 'exit' to quit.").dim());
    println!();

    loop {
        let line = match editor.readline("you> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(input);

        if let Some(notice) = waiting_notice(input) {
            println!("{}", style(notice).dim());
        }
        match conversation.handle_input(input).await {
            Ok(TurnOutcome::Reply(text)) => {
                println!();
                skin.print_text(&text);
                println!();
            }
            Ok(TurnOutcome::Ended) => break,
            Err(e) => {
                debug!(error = ?e, "chat turn failed");
                eprintln!("{} {}", style("✗").red(), e);
            }
        }
    }

    if let Some(dir) = history_path().parent()
        && std::fs::create_dir_all(dir).is_ok()
    {
        let _ = editor.save_history(&history_path());
    }

    println!("{}", style(FAREWELL).green());
    Ok(())
}
