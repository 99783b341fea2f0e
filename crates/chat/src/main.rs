use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use serde_json::Value;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use vault_chat::config::{
    load_dotenv, DEFAULT_DOCKER_HOST, DEFAULT_MODEL, DEFAULT_OLLAMA_BASE, DEFAULT_VAULT_URL,
};
use vault_chat::http::build_client;
use vault_chat::probe::{render_report, ProbeStatus};
use vault_chat::{
    logging, repl, Assistant, CommandRunner, Config, DockerClient, OllamaClient, ToolProbe,
    ToolRegistry, VaultClient, DEFAULT_SYSTEM_PROMPT,
};
use vault_chat_core::{Conversation, Role};

const PROBE_TIMEOUT_SECS: u64 = 20;

#[derive(Parser)]
#[command(name = "vault-chat")]
#[command(version)]
#[command(about = "Chat with your Obsidian vault and Docker host, directly or through a local model")]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,
    #[arg(short, long, help = "Debug logging for vault-chat")]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct ConfigArgs {
    #[arg(long, env = "OLLAMA_BASE", default_value = DEFAULT_OLLAMA_BASE, help = "Inference server base URL")]
    ollama_base: String,
    #[arg(long, env = "OLLAMA_MODEL", default_value = DEFAULT_MODEL, help = "Model used by the assistant")]
    model: String,
    #[arg(long, env = "OBSIDIAN_API_URL", default_value = DEFAULT_VAULT_URL, help = "Vault API base URL")]
    vault_url: String,
    #[arg(long, env = "OBSIDIAN_API_KEY", hide_env_values = true, help = "Vault API bearer token")]
    vault_api_key: Option<String>,
    #[arg(long, env = "OBSIDIAN_VERIFY_TLS", help = "Verify the vault's TLS certificate")]
    verify_tls: bool,
    #[arg(long, env = "DOCKER_HOST", default_value = DEFAULT_DOCKER_HOST, help = "Docker Engine API endpoint (tcp:// or http://)")]
    docker_host: String,
    #[arg(long, env = "VAULT_CHAT_TIMEOUT_SECS", help = "Per-request timeout [default: transport default]")]
    timeout_secs: Option<u64>,
}

impl ConfigArgs {
    fn into_config(self) -> Config {
        Config {
            ollama_base: self.ollama_base,
            model: self.model,
            vault_url: self.vault_url,
            vault_api_key: self.vault_api_key,
            verify_tls: self.verify_tls,
            docker_host: self.docker_host,
            timeout: self.timeout_secs.map(Duration::from_secs),
        }
        .normalized()
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Slash-command chat against the vault and Docker (default)
    Commands,
    /// Free-text chat where the model calls vault and Docker tools
    Assistant {
        #[arg(long, help = "Replace the default system prompt")]
        system: Option<String>,
    },
    /// Check which local models accept tool definitions
    CheckTools {
        #[arg(help = "Models to test [default: installed models]")]
        models: Vec<String>,
    },
    /// Generate shell completions
    Completions {
        #[arg(help = "Shell to generate for (bash, zsh, fish, powershell)")]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let env_file = load_dotenv(None);
    let cli = Cli::parse();
    logging::init(cli.verbose);
    if let Some(path) = env_file {
        debug!(path = %path.display(), "loaded environment file");
    }

    let command = cli.command.unwrap_or(Commands::Commands);
    if let Commands::Completions { shell } = command {
        generate(shell, &mut Cli::command(), "vault-chat", &mut io::stdout());
        return Ok(());
    }

    let config = cli.config.into_config();
    match command {
        Commands::Commands => cmd_commands(&config),
        Commands::Assistant { system } => cmd_assistant(&config, system),
        Commands::CheckTools { models } => cmd_check_tools(&config, models),
        Commands::Completions { .. } => Ok(()),
    }
}

fn warn_service_setup(config: &Config) {
    if config.vault_api_key.is_none() {
        warn!("OBSIDIAN_API_KEY is not set; vault requests will be sent without credentials");
    }
    if let Err(e) = config.docker_endpoint() {
        warn!(error = %e, "docker commands will fail");
    }
}

fn cmd_commands(config: &Config) -> Result<()> {
    warn_service_setup(config);
    let runner = CommandRunner::new(VaultClient::new(config), DockerClient::new(config));
    let mut conversation = Conversation::new();

    repl::run("=== MCP Chatbot ===  (/help lists commands)", true, |line| {
        let reply = runner.run_turn(&mut conversation, line);
        repl::show(Role::Assistant, &reply);
    })?;
    Ok(())
}

fn cmd_assistant(config: &Config, system: Option<String>) -> Result<()> {
    warn_service_setup(config);
    let tools = ToolRegistry::with_services(
        Arc::new(VaultClient::new(config)),
        Arc::new(DockerClient::new(config)),
    );
    let assistant = Assistant::new(OllamaClient::new(config), tools, config.model.as_str());
    let mut conversation =
        Conversation::with_system(system.unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()));

    let banner = format!("=== Vault Assistant ({}) ===", config.model);
    repl::run(&banner, false, |line| {
        match assistant.run_turn(&mut conversation, line) {
            Ok(turn) => {
                if let Some(invocation) = &turn.invocation {
                    repl::show(
                        Role::Assistant,
                        &format!(
                            "Calling tool: `{}` with args `{}`",
                            invocation.name,
                            Value::Object(invocation.arguments.clone())
                        ),
                    );
                    repl::show(
                        Role::Tool,
                        &format!("**{} result:**\n```\n{}\n```", invocation.name, invocation.output),
                    );
                }
                repl::show(Role::Assistant, &turn.reply);
            }
            Err(e) => repl::show_error(&e.to_string()),
        }
    })?;
    Ok(())
}

fn cmd_check_tools(config: &Config, models: Vec<String>) -> Result<()> {
    let timeout = config
        .timeout
        .unwrap_or(Duration::from_secs(PROBE_TIMEOUT_SECS));
    let probe = ToolProbe::new(build_client(Some(timeout), false), &config.ollama_base);
    let models = if models.is_empty() {
        probe.list_models()
    } else {
        models
    };

    println!("OLLAMA base: {}", config.ollama_base);
    println!("Testing models: {}", models.join(", "));
    println!();

    let mut stdout = io::stdout();
    let mut outcomes = Vec::new();
    for model in &models {
        print!(" -> Testing {} ...", model);
        stdout.flush()?;
        let outcome = probe.check_model(model);
        match &outcome.status {
            ProbeStatus::Accepted => println!(" ACCEPTED"),
            ProbeStatus::Rejected { status, .. } => println!(" REJECTED (status {})", status),
            ProbeStatus::Error(_) => println!(" ERROR"),
        }
        outcomes.push(outcome);
    }

    println!();
    print!("{}", render_report(&outcomes));
    Ok(())
}
