use super::output::Output;
use crate::chat::ChatService;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Words that leave the interactive chat
pub fn is_exit_command(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "exit" | "quit")
}

/// Read lines from stdin until EOF or an exit word, answering each one
pub async fn run(chat: &ChatService, output: &Output) -> std::io::Result<()> {
    output.banner();
    output.assistant(chat.welcome());
    output.hint("Type 'delete session' to forget this conversation, 'exit' to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        output.prompt();
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if is_exit_command(input) {
            break;
        }

        let reply = chat.handle(input).await;
        output.reply(&reply);
        if let Some(stats) = &reply.stats {
            output.stats(stats);
        }
    }

    output.info("Goodbye!");
    Ok(())
}
