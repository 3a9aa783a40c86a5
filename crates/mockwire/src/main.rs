//! Mockwire CLI
//!
//! Edits the persisted rule set, previews matching, and sends requests through
//! the intercepted client.
//!
//! Usage:
//!   mockwire rules add /api/user --method GET --data '{"id":1}'
//!   mockwire match GET https://example.com/api/user/info
//!   mockwire fetch https://example.com/api/user/info

use anyhow::{bail, Context, Result};
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use mockwire::config::{export_file_name, MockRule, ResponseType, RuleMethod};
use mockwire::fetch::{FetchRequest, FetchTransport};
use mockwire::store::JsonFileStore;
use mockwire::transport::ReqwestTransport;
use mockwire::MockEngine;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Mockwire - intercept outbound HTTP calls and answer them from mock rules
#[derive(Parser, Debug)]
#[command(name = "mockwire")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON file holding the persisted configuration
    #[arg(long, env = "MOCKWIRE_STORE", default_value = "mockwire-store.json")]
    store: PathBuf,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage mock rules
    #[command(subcommand)]
    Rules(RulesCommand),

    /// Show or change the global flags
    Settings {
        /// Master switch; when false every request passes through
        #[arg(long)]
        enabled: Option<bool>,
        /// Announce served mocks at info level
        #[arg(long)]
        show_notification: Option<bool>,
        /// Record requests in the request log
        #[arg(long)]
        log_requests: Option<bool>,
    },

    /// Show which rule would answer a request
    Match { method: String, url: String },

    /// Send a request through the intercepted client
    Fetch {
        url: String,
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,
        /// Request body
        #[arg(short, long)]
        data: Option<String>,
    },

    /// Write the configuration to a timestamped JSON file
    Export {
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },

    /// Replace the configuration with the contents of a JSON file
    Import { file: PathBuf },
}

#[derive(Subcommand, Debug)]
enum RulesCommand {
    /// List rules in match order
    List,

    /// Append a rule
    Add {
        /// Regular expression, or a plain substring if it does not compile
        url_pattern: String,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(short, long, default_value_t = RuleMethod::All)]
        method: RuleMethod,
        #[arg(short = 't', long = "type", default_value_t = ResponseType::Json)]
        response_type: ResponseType,
        #[arg(short, long, default_value = "{}")]
        data: String,
        #[arg(short, long, default_value_t = 200)]
        status: u16,
        /// Delay before responding, in milliseconds
        #[arg(long, default_value_t = 0)]
        delay: u64,
        /// Add the rule switched off
        #[arg(long)]
        disabled: bool,
    },

    /// Delete a rule
    Remove { id: String },

    /// Flip a rule between enabled and disabled
    Toggle { id: String },

    /// Move a rule to a new position (0 = first to match)
    Move { id: String, index: usize },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format)?;

    let store = JsonFileStore::open(&args.store)
        .with_context(|| format!("Failed to open store {}", args.store.display()))?;
    let engine = Arc::new(MockEngine::load(Arc::new(store)));

    match args.command {
        Command::Rules(command) => run_rules(&engine, command),
        Command::Settings {
            enabled,
            show_notification,
            log_requests,
        } => {
            if let Some(enabled) = enabled {
                engine.set_enabled(enabled)?;
            }
            if let Some(show) = show_notification {
                engine.set_show_notification(show)?;
            }
            if let Some(log) = log_requests {
                engine.set_log_requests(log)?;
            }
            let config = engine.config();
            println!("enabled:           {}", config.enabled);
            println!("show notification: {}", config.show_notification);
            println!("log requests:      {}", config.log_requests);
            Ok(())
        }
        Command::Match { method, url } => {
            match engine.match_request(&url, &method) {
                Some(rule) => println!("{} {} -> {} ({})", method, url, rule.label(), rule.id),
                None => println!("{} {} -> no match, passes through", method, url),
            }
            Ok(())
        }
        Command::Fetch { url, method, data } => run_fetch(&engine, url, method, data).await,
        Command::Export { dir } => {
            let json = engine.export_config()?;
            let path = dir.join(export_file_name(Utc::now()));
            std::fs::write(&path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Exported configuration to {}", path.display());
            Ok(())
        }
        Command::Import { file } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            engine
                .import_config(&json)
                .with_context(|| format!("Failed to import {}", file.display()))?;
            println!(
                "Imported {} rules from {}",
                engine.config().rules.len(),
                file.display()
            );
            Ok(())
        }
    }
}

fn init_tracing(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    }
    .context("Failed to initialize tracing subscriber")
}

fn run_rules(engine: &MockEngine, command: RulesCommand) -> Result<()> {
    match command {
        RulesCommand::List => {
            let config = engine.config();
            if config.rules.is_empty() {
                println!("No rules");
            }
            for (index, rule) in config.rules.iter().enumerate() {
                println!(
                    "{:>3}  {}  {:<6} {:<30} {} {:<4} {:>5}ms  {} ({})",
                    index,
                    if rule.enabled { "on " } else { "off" },
                    rule.method,
                    rule.url_pattern,
                    rule.status_code,
                    rule.response_type,
                    rule.delay_ms,
                    rule.label(),
                    rule.id,
                );
            }
            Ok(())
        }
        RulesCommand::Add {
            url_pattern,
            name,
            method,
            response_type,
            data,
            status,
            delay,
            disabled,
        } => {
            let rule = MockRule {
                enabled: !disabled,
                name,
                url_pattern,
                method,
                response_type,
                response_data: data,
                status_code: status,
                delay_ms: delay,
                ..MockRule::default()
            };
            let id = engine.add_rule(rule)?;
            println!("Added rule {}", id);
            Ok(())
        }
        RulesCommand::Remove { id } => {
            let rule = engine.remove_rule(&id)?;
            println!("Removed rule {} ({})", rule.label(), rule.id);
            Ok(())
        }
        RulesCommand::Toggle { id } => {
            let Some(enabled) = engine.config().rule(&id).map(|r| r.enabled) else {
                bail!("Rule not found: {}", id);
            };
            engine.set_rule_enabled(&id, !enabled)?;
            println!("Rule {} is now {}", id, if enabled { "disabled" } else { "enabled" });
            Ok(())
        }
        RulesCommand::Move { id, index } => {
            engine.move_rule(&id, index)?;
            println!("Moved rule {}", id);
            Ok(())
        }
    }
}

async fn run_fetch(
    engine: &Arc<MockEngine>,
    url: String,
    method: String,
    data: Option<String>,
) -> Result<()> {
    let transport = ReqwestTransport::new().context("Failed to build HTTP client")?;
    let client = engine.wrap_fetch(Arc::new(transport));

    let mut request = FetchRequest::new(url).with_method(method);
    if let Some(data) = data {
        request = request.with_body(data);
    }

    let response = client.fetch(request).await.context("Request failed")?;
    info!(status = response.status(), mocked = response.is_mocked(), "Request complete");

    println!("{} {}", response.status(), response.status_text());
    for (name, value) in response.headers() {
        println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
    }
    println!();
    println!("{}", response.text());

    let log = engine.request_log();
    if !log.is_empty() {
        println!();
        println!("Request log:");
        for entry in log {
            let when = Utc
                .timestamp_millis_opt(entry.timestamp)
                .single()
                .map(|t| t.to_rfc3339())
                .unwrap_or_default();
            println!(
                "  {} {} {} {}",
                when,
                entry.method,
                entry.url,
                entry.rule_id.as_deref().unwrap_or("(pass-through)")
            );
        }
    }
    Ok(())
}
