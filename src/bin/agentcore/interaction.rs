//! Terminal-backed [`UserInteraction`].

use std::io::{self, Write};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::Mutex;

use agentcore::tools::{DangerousOperation, TodoItem, TodoStatus, UserInteraction};

type LineSource = Lines<Box<dyn AsyncBufRead + Send + Unpin>>;

/// Line reader shared by the REPL and tool prompts so stdin has one owner.
#[derive(Clone)]
pub struct Console {
    lines: Arc<Mutex<LineSource>>,
}

impl Console {
    pub fn stdin() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }

    pub fn from_reader(reader: impl AsyncBufRead + Send + Unpin + 'static) -> Self {
        let reader: Box<dyn AsyncBufRead + Send + Unpin> = Box::new(reader);
        Self {
            lines: Arc::new(Mutex::new(reader.lines())),
        }
    }

    /// Prints `prompt` and waits for the next line. `None` on end of input.
    pub async fn read_line(&self, prompt: &str) -> io::Result<Option<String>> {
        let mut lines = self.lines.lock().await;
        let mut stdout = io::stdout();
        stdout.write_all(prompt.as_bytes())?;
        stdout.flush()?;
        lines.next_line().await
    }
}

/// Prompts on stdout and reads answers through the shared [`Console`].
#[derive(Clone)]
pub struct TerminalInteraction {
    console: Console,
}

impl TerminalInteraction {
    pub fn new(console: Console) -> Self {
        Self { console }
    }

    async fn read_answer(&self, prompt: &str) -> Option<String> {
        match self.console.read_line(prompt).await {
            Ok(line) => line.map(|line| line.trim().to_string()),
            Err(err) => {
                log::warn!("failed to read answer: {err}");
                None
            }
        }
    }
}

#[async_trait]
impl UserInteraction for TerminalInteraction {
    async fn ask_user(&self, question: &str, options: &[String]) -> Option<String> {
        let mut prompt = format!("\n? {question}\n");
        for (index, option) in options.iter().enumerate() {
            prompt.push_str(&format!("  {}. {option}\n", index + 1));
        }
        prompt.push_str("> ");

        let answer = self.read_answer(&prompt).await?;
        pick_option(answer, options)
    }

    async fn request_permission(&self, operation: &DangerousOperation, command: &str) -> bool {
        let prompt = format!(
            "\n! {} requested:\n  {command}\nAllow? [y/N] ",
            operation.describe()
        );
        self.read_answer(&prompt)
            .await
            .is_some_and(|answer| is_affirmative(&answer))
    }

    fn todos_updated(&self, todos: &[TodoItem]) {
        println!();
        for item in todos {
            let mark = match item.status {
                TodoStatus::Pending => "[ ]",
                TodoStatus::InProgress => "[~]",
                TodoStatus::Completed => "[x]",
            };
            println!("{mark} {}", item.content);
        }
    }
}

// A bare number picks the matching option.
fn pick_option(answer: String, options: &[String]) -> Option<String> {
    if answer.is_empty() {
        return None;
    }
    match answer.parse::<usize>() {
        Ok(choice) if (1..=options.len()).contains(&choice) => Some(options[choice - 1].clone()),
        _ => Some(answer),
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer, "y" | "Y" | "yes" | "Yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentcore::tools::classify_command;

    fn options() -> Vec<String> {
        vec!["main".to_string(), "develop".to_string()]
    }

    #[test]
    fn numbers_pick_options_and_text_passes_through() {
        assert_eq!(pick_option("2".to_string(), &options()).as_deref(), Some("develop"));
        assert_eq!(pick_option("3".to_string(), &options()).as_deref(), Some("3"));
        assert_eq!(pick_option("release".to_string(), &options()).as_deref(), Some("release"));
        assert_eq!(pick_option(String::new(), &options()), None);
    }

    #[tokio::test]
    async fn prompts_and_repl_share_one_reader() {
        let console = Console::from_reader(&b"fix the build\n 1 \ny\n"[..]);
        let interaction = TerminalInteraction::new(console.clone());
        let operation = classify_command("rm -rf build").unwrap();

        let first = console.read_line("> ").await.unwrap();
        assert_eq!(first.as_deref(), Some("fix the build"));
        assert_eq!(
            interaction.ask_user("Branch?", &options()).await.as_deref(),
            Some("main")
        );
        assert!(interaction.request_permission(&operation, "rm -rf build").await);
        assert_eq!(console.read_line("> ").await.unwrap(), None);
        assert!(!interaction.request_permission(&operation, "rm -rf build").await);
    }
}
