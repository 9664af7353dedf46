use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use parking_lot::Mutex;
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;

use agentcore::backend::{HttpBackend, HttpBackendConfig};
use agentcore::runtime::{AgentRuntime, Conversation, RuntimeConfig};
use agentcore::tools::{NonInteractive, UserInteraction};
use agentcore::{AgentError, StreamEvent};

use crate::args::CliArgs;
use crate::config::{load_config, AppConfig};
use crate::interaction::{Console, TerminalInteraction};
use crate::logging::init_logging;
use crate::tools::LocalTools;

pub async fn run() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let loaded = load_config(args.config.clone())?;
    init_logging(&loaded.config.logging, &loaded.paths)?;
    if !loaded.config_exists {
        log::info!(
            "no config at {}, using defaults",
            loaded.paths.config_file.display()
        );
    }

    let console = Console::stdin();
    let runtime = build_runtime(&args, &loaded.config, &console)?;
    let mut conversation = runtime.conversation();
    log::info!("conversation {} started", conversation.id());

    match &args.prompt {
        Some(prompt) => run_turn(&mut conversation, prompt).await,
        None => repl(&mut conversation, &console).await,
    }
}

fn build_runtime(args: &CliArgs, config: &AppConfig, console: &Console) -> anyhow::Result<AgentRuntime> {
    let api_key = std::env::var(&config.backend.api_key_env)
        .ok()
        .map(SecretString::new);
    if api_key.is_none() {
        log::warn!("{} is not set; sending requests without a key", config.backend.api_key_env);
    }
    let backend = HttpBackend::new(HttpBackendConfig {
        base_url: args.base_url.clone().unwrap_or_else(|| config.backend.url.clone()),
        model: args.model.clone().unwrap_or_else(|| config.backend.model.clone()),
        api_key,
        max_tokens: config.backend.max_tokens,
        ..HttpBackendConfig::default()
    })?;

    let working_directory = match args.cwd.clone().or_else(|| config.tools.working_dir.clone()) {
        Some(dir) => dir,
        None => std::env::current_dir().context("cannot resolve working directory")?,
    };
    let runtime_config = RuntimeConfig {
        read_cache_ttl: Duration::from_secs(config.tools.read_cache_ttl_secs),
        max_parallel: config.tools.max_parallel,
        max_tool_loops: args.max_tool_loops.unwrap_or(config.tools.max_tool_loops),
        working_directory: working_directory.clone(),
        skip_permissions: args.skip_permissions || config.tools.skip_permissions,
        system_prompt: args.system.clone().or_else(|| config.backend.system.clone()),
        ..RuntimeConfig::default()
    };

    let interaction: Arc<dyn UserInteraction> = if args.is_one_shot() {
        Arc::new(NonInteractive)
    } else {
        Arc::new(TerminalInteraction::new(console.clone()))
    };

    Ok(
        AgentRuntime::builder(Arc::new(backend), Arc::new(LocalTools::new(working_directory)))
            .config(runtime_config)
            .interaction(interaction)
            .on_index_invalidate(|path: &std::path::Path| {
                log::debug!("file changed: {}", path.display());
            })
            .build(),
    )
}

async fn repl(conversation: &mut Conversation, console: &Console) -> anyhow::Result<()> {
    let running: Arc<Mutex<Option<CancellationToken>>> = Arc::new(Mutex::new(None));
    let listener = tokio::spawn(interrupt_listener(Arc::clone(&running)));
    let result = read_eval_loop(conversation, console, &running).await;
    listener.abort();
    result
}

async fn read_eval_loop(
    conversation: &mut Conversation,
    console: &Console,
    running: &Mutex<Option<CancellationToken>>,
) -> anyhow::Result<()> {
    loop {
        let Some(line) = console.read_line("\n> ").await? else {
            return Ok(());
        };
        let prompt = line.trim();
        if prompt.is_empty() {
            continue;
        }
        if matches!(prompt, "/exit" | "/quit") {
            return Ok(());
        }

        conversation.reset_cancellation();
        *running.lock() = Some(conversation.cancel_token());
        let result = run_turn(conversation, prompt).await;
        running.lock().take();
        if let Err(err) = result {
            eprintln!("error: {err}");
        }
    }
}

/// Lives for the whole session; each Ctrl-C cancels the turn in progress.
async fn interrupt_listener(running: Arc<Mutex<Option<CancellationToken>>>) {
    loop {
        if let Err(err) = tokio::signal::ctrl_c().await {
            log::warn!("cannot listen for Ctrl-C: {err}");
            return;
        }
        match running.lock().as_ref() {
            Some(token) => token.cancel(),
            None => eprintln!("\n(type /exit or press Ctrl-D to quit)"),
        }
    }
}

async fn run_turn(conversation: &mut Conversation, prompt: &str) -> anyhow::Result<()> {
    let outcome = conversation.run_turn(prompt, render_event).await;
    println!();
    match outcome {
        Ok(outcome) => {
            log::info!(
                "turn finished: {} tool calls over {} batches, {} in / {} out tokens",
                outcome.tool_calls.len(),
                outcome.loop_depth,
                outcome.usage.input_tokens,
                outcome.usage.output_tokens
            );
            Ok(())
        }
        Err(AgentError::Cancelled) => {
            eprintln!("(cancelled)");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn render_event(event: &StreamEvent) {
    match event {
        StreamEvent::Text { chars } => {
            print!("{chars}");
            let _ = io::stdout().flush();
        }
        StreamEvent::ToolCallStarted { name, .. } => println!("\n[{name}]"),
        StreamEvent::ToolFailed { name, error, .. } => println!("[{name} failed] {}", first_line(error)),
        StreamEvent::Error { message } => eprintln!("\nstream error: {message}"),
        _ => {}
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}
