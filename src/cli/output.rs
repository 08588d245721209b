//! Colored output helpers for CLI
//!
//! Provides consistent, colored terminal output for the DeepSearch CLI.

use crate::chat::ChatReply;
use crate::runner::RunStats;
use crate::types::ReplyStatus;
use owo_colors::OwoColorize;
use std::io::{self, Write};

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Create a new output helper with colors enabled
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Create a new output helper with colors disabled
    pub fn no_color() -> Self {
        Self { colored: false }
    }

    pub fn banner(&self) {
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));
        if self.colored {
            println!(
                "\n   {} {}\n   {}\n",
                "DeepSearch".bright_cyan().bold(),
                version.dimmed(),
                "multi-agent deep research assistant".bright_white()
            );
        } else {
            println!(
                "\n   DeepSearch {}\n   multi-agent deep research assistant\n",
                version
            );
        }
    }

    /// Print a message from the assistant
    pub fn assistant(&self, text: &str) {
        if self.colored {
            println!("\n{} {}\n", "DeepSearch:".bright_cyan().bold(), text);
        } else {
            println!("\nDeepSearch: {}\n", text);
        }
    }

    /// Print a chat reply, styled by its outcome
    pub fn reply(&self, reply: &ChatReply) {
        match reply.status {
            ReplyStatus::Completed => self.assistant(&reply.text),
            ReplyStatus::SessionCleared => self.success(&reply.text),
            ReplyStatus::TurnsExceeded => self.warning(&reply.text),
            ReplyStatus::Failed => self.error(&reply.text),
        }
    }

    /// Print the per-run agent and tool counters
    pub fn stats(&self, stats: &RunStats) {
        let tools = stats
            .tool_usage
            .iter()
            .map(|(name, count)| format!("{} x{}", name, count))
            .collect::<Vec<_>>()
            .join(", ");
        let line = if tools.is_empty() {
            stats.summary()
        } else {
            format!("{} | tools: {}", stats.summary(), tools)
        };
        if self.colored {
            println!("  {}", line.dimmed());
        } else {
            println!("  [STATS] {}", line);
        }
    }

    /// Show the input prompt and flush stdout
    pub fn prompt(&self) {
        if self.colored {
            print!("{} ", "You:".green().bold());
        } else {
            print!("You: ");
        }
        io::stdout().flush().ok();
    }

    /// Print a success message with a checkmark
    pub fn success(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "✓".green().bold(), message.green());
        } else {
            println!("  [OK] {}", message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [INFO] {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    /// Print a header for a section
    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    /// Print a key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    /// Print a list item
    pub fn list_item(&self, item: &str) {
        if self.colored {
            println!("    {} {}", "•".blue(), item);
        } else {
            println!("    - {}", item);
        }
    }

    /// Print a hint/tip message
    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {}", message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_output_new() {
        assert!(Output::new().colored);
        assert!(!Output::no_color().colored);
        assert!(Output::default().colored);
    }

    #[test]
    fn test_output_methods_no_panic() {
        for output in [Output::no_color(), Output::new()] {
            output.banner();
            output.assistant("answer");
            output.success("cleared");
            output.info("info");
            output.warning("warning");
            output.error("error");
            output.header("Agents");
            output.kv("model", "gemini-2.5-flash");
            output.list_item("web_search");
            output.hint("type exit to quit");
        }
    }

    #[test]
    fn test_reply_and_stats_no_panic() {
        let output = Output::no_color();
        let mut tool_usage = BTreeMap::new();
        tool_usage.insert("web_search".to_string(), 3);
        let stats = RunStats {
            active_agents: vec!["DeepSearch Agent".to_string(), "Lead Agent".to_string()],
            handoffs: 1,
            tool_usage,
        };
        output.stats(&stats);
        output.stats(&RunStats::default());

        for status in [
            ReplyStatus::Completed,
            ReplyStatus::SessionCleared,
            ReplyStatus::TurnsExceeded,
            ReplyStatus::Failed,
        ] {
            output.reply(&ChatReply {
                text: "text".to_string(),
                status,
                stats: None,
            });
        }
    }
}
