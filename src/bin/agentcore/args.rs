use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "agentcore",
    about = "Tool-using coding agent driven by a streaming chat backend"
)]
pub struct CliArgs {
    /// Run a single turn with this prompt and exit
    #[arg(long, short = 'p')]
    pub prompt: Option<String>,
    #[arg(long, short = 'm')]
    pub model: Option<String>,
    #[arg(long)]
    pub base_url: Option<String>,
    #[arg(long)]
    pub system: Option<String>,
    /// Directory tools resolve relative paths against
    #[arg(long)]
    pub cwd: Option<PathBuf>,
    /// Run dangerous shell commands without asking
    #[arg(long)]
    pub skip_permissions: bool,
    #[arg(long)]
    pub max_tool_loops: Option<usize>,
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
}

impl CliArgs {
    pub fn is_one_shot(&self) -> bool {
        self.prompt.is_some()
    }
}
