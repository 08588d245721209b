use anyhow::{Context, Result};
use deepsearch::{
    api::routes::create_app,
    cli::{output::Output, repl, Cli, Commands},
    tools::{default_registry, Mem0Client, TavilyClient},
    types::ReplyStatus,
    session,
    utils::toml_config::ServerConfig,
    AgentGraph, AppState, ChatService, DeepSearchConfig, OpenAIFactory, Runner, RunnerConfig,
};
use owo_colors::OwoColorize;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    let config = DeepSearchConfig::load_or_default(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    init_tracing(&config.server, cli.verbose)?;

    match cli.command() {
        Commands::Config { validate } => return Ok(show_config(&cli, &config, *validate, &output)),
        Commands::Agents => {
            show_agents(&AgentGraph::canonical(&config), &output);
            return Ok(ExitCode::SUCCESS);
        }
        _ => {}
    }

    // Every turn needs the model, search and memory keys
    config.validate_secrets()?;
    let chat = build_chat(&config).await?;

    match cli.command() {
        Commands::Ask { prompt } => {
            let reply = chat.handle(&prompt.join(" ")).await;
            output.reply(&reply);
            if cli.verbose {
                if let Some(stats) = &reply.stats {
                    output.stats(stats);
                }
            }
            if reply.status == ReplyStatus::Failed {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Serve { host, port } => {
            let host = host.clone().unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            serve(chat, &host, port).await?;
        }
        _ => repl::run(&chat, &output).await?,
    }

    Ok(ExitCode::SUCCESS)
}

fn init_tracing(server: &ServerConfig, verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { server.log_level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("deepsearch={},tower_http=info", default_level)))
        .context("invalid log filter")?;

    // stderr keeps stdout for replies
    let registry = tracing_subscriber::registry().with(filter);
    let result = if server.log_format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    result.map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {e}"))
}

/// Wire providers, tools, agents and the session store into one chat service
async fn build_chat(config: &DeepSearchConfig) -> Result<ChatService> {
    let search = TavilyClient::new(
        config.resolve_env(&config.search.api_key_env)?,
        &config.search.base_url,
    )?;
    let memory = Mem0Client::new(
        config.resolve_env(&config.memory.api_key_env)?,
        &config.memory.base_url,
    )?;
    let tools = Arc::new(default_registry(
        Arc::new(search),
        Arc::new(memory),
        config.memory.top_k,
    ));

    let graph = AgentGraph::canonical(config);
    graph.validate(&tools)?;

    let factory = OpenAIFactory::from_config(&config.provider)?;
    let runner = Runner::new(
        Arc::new(graph),
        tools,
        &factory,
        RunnerConfig {
            max_turns: config.run.max_turns,
            sub_agent_max_turns: config.run.sub_agent_max_turns,
        },
    )?;

    let sessions = session::open_store(&config.session.database).await?;
    info!(
        database = %config.session.database,
        session_id = %config.session.session_id,
        "Session store ready"
    );

    Ok(ChatService::new(
        Arc::new(runner),
        sessions,
        config.session.session_id.clone(),
        config.user.profile(),
        config.run.workflow_name.clone(),
    ))
}

async fn serve(chat: ChatService, host: &str, port: u16) -> Result<()> {
    let state = AppState {
        chat: Arc::new(chat),
    };
    let app = create_app(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("DeepSearch listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn show_config(cli: &Cli, config: &DeepSearchConfig, validate: bool, output: &Output) -> ExitCode {
    output.header("Configuration");
    let source = if cli.config.exists() {
        cli.config.display().to_string()
    } else {
        "built-in defaults".to_string()
    };
    output.kv("Source", &source);
    output.kv(
        "Server",
        &format!("{}:{}", config.server.host, config.server.port),
    );
    output.kv("Provider", &config.provider.api_base);
    output.kv("Default model", &config.provider.default_model);
    output.kv("Search", &config.search.base_url);
    output.kv("Memory", &config.memory.base_url);
    output.kv("Session database", &config.session.database);
    output.kv("Max turns", &config.run.max_turns.to_string());
    output.kv("User", &config.user.name);

    if !validate {
        return ExitCode::SUCCESS;
    }

    output.header("Validation");
    let missing = config.missing_secrets();
    if missing.is_empty() {
        output.success("Configuration is valid and all API keys are set");
        ExitCode::SUCCESS
    } else {
        for name in &missing {
            output.error(&format!("Missing environment variable: {}", name));
        }
        output.hint("Set the keys in your environment or in a .env file.");
        ExitCode::FAILURE
    }
}

fn show_agents(graph: &AgentGraph, output: &Output) {
    output.header("Agents");
    for agent in graph.agents() {
        output.kv(&agent.name, &agent.model);
        if !agent.tools.is_empty() {
            output.list_item(&format!("tools: {}", agent.tools.join(", ")));
        }
        let handoffs = graph.handoff_targets(agent.id);
        if !handoffs.is_empty() {
            let targets: Vec<String> = handoffs.iter().map(|id| id.to_string()).collect();
            output.list_item(&format!("hands off to: {}", targets.join(", ")));
        }
        for binding in &agent.sub_agents {
            output.list_item(&format!("calls {} as {}", binding.target, binding.tool_name));
        }
    }
    output.info(&format!("Entry agent: {}", graph.entry()));
}
