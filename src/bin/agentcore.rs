#[path = "agentcore/app.rs"]
mod app;
#[path = "agentcore/args.rs"]
mod args;
#[path = "agentcore/config/mod.rs"]
mod config;
#[path = "agentcore/interaction.rs"]
mod interaction;
#[path = "agentcore/logging.rs"]
mod logging;
#[path = "agentcore/tools/mod.rs"]
mod tools;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    app::run().await
}
