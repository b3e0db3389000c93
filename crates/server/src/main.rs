//! Compass Server
//!
//! Axum server for the facade run endpoint and the orchestrator probe
//! panels, plus CLI modes that run the same logic without a server.

mod api;

use clap::{Parser, Subcommand};
use compass_core::config::{AppConfig, ConfigOverrides};
use compass_core::facade::{FacadeGenerator, RunInput};
use compass_core::health::InvokeBadge;
use compass_core::models::PlanConfig;
use compass_core::orchestrator::{
    InvokeRequest, OrchestratorClient, OrchestratorEndpoints, FASTAPI_SERVER,
};
use compass_core::probe::Prober;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Application state
pub struct AppState {
    generator: FacadeGenerator,
    orchestrator: OrchestratorClient,
    config: AppConfig,
}

pub type SharedState = Arc<AppState>;

#[derive(Parser, Clone)]
#[command(author, version, about = "Compass - COMPASS-DRIVE facade and orchestrator probes")]
struct Args {
    /// Config file (defaults to .compass/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Clone)]
enum CliCommand {
    /// Start the HTTP server (default)
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
        /// Interface to bind
        #[arg(long)]
        host: Option<String>,
        /// Orchestrator base URL
        #[arg(long)]
        base: Option<String>,
        /// Hold probes to browser CORS rules for this origin
        #[arg(long)]
        origin: Option<String>,
        /// Plan model, overriding OPENAI_MODEL
        #[arg(long)]
        model: Option<String>,
    },
    /// Generate one facade run and print it
    Run {
        /// Task to plan for
        task: Option<String>,
        /// KPI to attach to the SLO
        #[arg(long)]
        kpi: Option<String>,
        /// Plan model, overriding OPENAI_MODEL
        #[arg(long)]
        model: Option<String>,
        /// Print the raw JSON trace
        #[arg(long)]
        json: bool,
    },
    /// Probe the orchestrator and print its health
    Probe {
        /// Orchestrator base URL
        #[arg(long)]
        base: Option<String>,
        /// Hold probes to browser CORS rules for this origin
        #[arg(long)]
        origin: Option<String>,
        /// Also invoke clock/get_time and the first fastapi-mcp tool
        #[arg(long)]
        invoke: bool,
        /// Print the raw JSON snapshot
        #[arg(long)]
        json: bool,
    },
    /// Invoke one tool through the orchestrator
    Invoke {
        /// Provider name
        server: String,
        /// Tool name
        tool: String,
        /// Tool arguments as a JSON object
        #[arg(long, value_parser = parse_arguments)]
        arguments: Option<Value>,
        /// Orchestrator base URL
        #[arg(long)]
        base: Option<String>,
        /// Hold probes to browser CORS rules for this origin
        #[arg(long)]
        origin: Option<String>,
    },
    /// Show the effective config, optionally writing it back
    Config {
        /// Orchestrator base URL
        #[arg(long)]
        base: Option<String>,
        /// Hold probes to browser CORS rules for this origin
        #[arg(long)]
        origin: Option<String>,
        /// Interface to bind
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
        /// Expected provider (repeatable)
        #[arg(long = "expect")]
        expect: Vec<String>,
        /// Persist the merged config
        #[arg(long)]
        save: bool,
    },
}

fn parse_arguments(raw: &str) -> Result<Value, String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) if value.is_object() => Ok(value),
        Ok(_) => Err("arguments must be a JSON object".to_string()),
        Err(e) => Err(format!("invalid JSON: {}", e)),
    }
}

/// Plan settings from the environment, with an optional model override
fn plan_config(model: Option<String>) -> PlanConfig {
    let config = PlanConfig::from_env();
    match model {
        Some(model) => config.with_model(model),
        None => config,
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

fn orchestrator_client(config: &AppConfig) -> anyhow::Result<OrchestratorClient> {
    let prober = Prober::with_reqwest()?;
    let endpoints = OrchestratorEndpoints::new(&config.orchestrator_base);
    let client = OrchestratorClient::new(prober, endpoints);
    Ok(match &config.probe_origin {
        Some(origin) => client.with_origin(origin.clone()),
        None => client,
    })
}

async fn load_config(
    path: Option<&PathBuf>,
    overrides: ConfigOverrides,
) -> anyhow::Result<AppConfig> {
    let mut config = match path {
        Some(path) => AppConfig::load_from(path).await,
        None => AppConfig::load().await,
    };
    config.merge(overrides);
    config.validate()?;
    Ok(config)
}

async fn run_server(config: AppConfig, plan: PlanConfig) -> anyhow::Result<()> {
    let generator = FacadeGenerator::from_config(&plan);
    let orchestrator = orchestrator_client(&config)?;
    let addr = config.bind_addr();

    tracing::info!(
        planner = generator.planner_name(),
        orchestrator = %config.orchestrator_base,
        "Starting Compass server"
    );

    let state: SharedState = Arc::new(AppState {
        generator,
        orchestrator,
        config,
    });
    let app = api::router(state);

    println!("🧭 Compass Server running at http://{}", addr);
    println!("   Facade:       POST /api/facade/run");
    println!("   Orchestrator: /api/v1/orchestrator/snapshot, /preflight, /invoke");
    println!("   OpenAPI:      /api/v1/openapi.json");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_once(input: RunInput, plan: PlanConfig, json: bool) -> anyhow::Result<()> {
    let generator = FacadeGenerator::from_config(&plan);
    let trace = generator.run_input(&input).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&trace)?);
    } else {
        print!("{}", trace.summary());
    }
    Ok(())
}

async fn probe_once(config: AppConfig, invoke: bool, json: bool) -> anyhow::Result<()> {
    let client = orchestrator_client(&config)?;
    let snapshot = client.snapshot(&config.expected_servers).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        println!("Orchestrator: {}", snapshot.endpoints.base);
        println!("Health:       {}", snapshot.health);
        for (label, result) in [("config", &snapshot.config), ("catalog", &snapshot.catalog)] {
            print!("  {:<8} {}", label, result.status_label());
            if let Some(failure) = &result.failure {
                print!(" ({}) {}", failure.message, failure.classification.guidance());
            }
            println!();
        }
        for provider in &snapshot.providers {
            println!(
                "  {:<12} {} [{}]",
                provider.server,
                provider.label,
                provider.tools.join(", ")
            );
        }
    }

    if invoke {
        let clock = client.invoke_clock().await;
        println!("clock/get_time: {}", InvokeBadge::from_result(Some(&clock)));

        match snapshot.first_tool(FASTAPI_SERVER) {
            Some(tool) => {
                let result = client.invoke(&InvokeRequest::new(FASTAPI_SERVER, tool)).await;
                println!(
                    "{}/{}: {}",
                    FASTAPI_SERVER,
                    tool,
                    InvokeBadge::from_result(Some(&result))
                );
            }
            None => println!("{}: no usable tools in catalog", FASTAPI_SERVER),
        }
    }

    Ok(())
}

async fn invoke_once(config: AppConfig, request: InvokeRequest) -> anyhow::Result<()> {
    let client = orchestrator_client(&config)?;
    let result = client.invoke(&request).await;

    println!(
        "{}/{}: {}",
        request.server,
        request.tool,
        InvokeBadge::from_result(Some(&result))
    );
    if let Some(failure) = &result.failure {
        println!("  {} {}", failure.message, failure.classification.guidance());
    }
    if let Some(body) = result.body.json() {
        println!("{}", serde_json::to_string_pretty(body)?);
    }
    Ok(())
}

async fn show_config(
    path: Option<&PathBuf>,
    overrides: ConfigOverrides,
    save: bool,
) -> anyhow::Result<()> {
    let config = load_config(path, overrides).await?;
    println!("{}", serde_json::to_string_pretty(&config)?);

    if save {
        let target = path.cloned().unwrap_or_else(AppConfig::default_path);
        config.save_to(&target).await?;
        println!("Saved to {}", target.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let config_path = args.config.as_ref();

    match args.command {
        Some(CliCommand::Run {
            task,
            kpi,
            model,
            json,
        }) => run_once(RunInput { task, kpi }, plan_config(model), json).await,
        Some(CliCommand::Probe {
            base,
            origin,
            invoke,
            json,
        }) => {
            let overrides = ConfigOverrides {
                orchestrator_base: base,
                probe_origin: origin,
                ..Default::default()
            };
            probe_once(load_config(config_path, overrides).await?, invoke, json).await
        }
        Some(CliCommand::Invoke {
            server,
            tool,
            arguments,
            base,
            origin,
        }) => {
            let overrides = ConfigOverrides {
                orchestrator_base: base,
                probe_origin: origin,
                ..Default::default()
            };
            let mut request = InvokeRequest::new(server, tool);
            if let Some(arguments) = arguments {
                request = request.with_arguments(arguments);
            }
            invoke_once(load_config(config_path, overrides).await?, request).await
        }
        Some(CliCommand::Config {
            base,
            origin,
            host,
            port,
            expect,
            save,
        }) => {
            let overrides = ConfigOverrides {
                host,
                port,
                orchestrator_base: base,
                expected_servers: (!expect.is_empty()).then_some(expect),
                probe_origin: origin,
            };
            show_config(config_path, overrides, save).await
        }
        Some(CliCommand::Serve {
            port,
            host,
            base,
            origin,
            model,
        }) => {
            let overrides = ConfigOverrides {
                host,
                port,
                orchestrator_base: base,
                probe_origin: origin,
                ..Default::default()
            };
            let config = load_config(config_path, overrides).await?;
            run_server(config, plan_config(model)).await
        }
        None => {
            let config = load_config(config_path, ConfigOverrides::default()).await?;
            run_server(config, plan_config(None)).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invoke_arguments_parse() {
        let args = Args::try_parse_from([
            "compass",
            "invoke",
            "fastapi-mcp",
            "list_jobs",
            "--arguments",
            r#"{"limit": 5}"#,
        ])
        .unwrap();

        match args.command {
            Some(CliCommand::Invoke {
                server,
                tool,
                arguments,
                ..
            }) => {
                assert_eq!(server, "fastapi-mcp");
                assert_eq!(tool, "list_jobs");
                assert_eq!(arguments, Some(json!({"limit": 5})));
            }
            _ => panic!("expected invoke command"),
        }
    }

    #[test]
    fn test_invoke_arguments_must_be_object() {
        assert!(parse_arguments("[1, 2]").is_err());
        assert!(parse_arguments("{broken").is_err());
        let scalar = Args::try_parse_from(["compass", "invoke", "a", "b", "--arguments", "3"]);
        assert!(scalar.is_err());
    }

    #[test]
    fn test_model_override() {
        assert_eq!(plan_config(Some("gpt-test".to_string())).model, "gpt-test");

        let args = Args::try_parse_from(["compass", "run", "Ship it", "--model", "gpt-test"])
            .unwrap();
        assert!(matches!(
            args.command,
            Some(CliCommand::Run { model: Some(ref m), .. }) if m == "gpt-test"
        ));
    }

    #[test]
    fn test_config_expect_is_repeatable() {
        let args = Args::try_parse_from([
            "compass", "config", "--expect", "clock", "--expect", "jobs", "--save",
        ])
        .unwrap();
        match args.command {
            Some(CliCommand::Config { expect, save, .. }) => {
                assert_eq!(expect, vec!["clock".to_string(), "jobs".to_string()]);
                assert!(save);
            }
            _ => panic!("expected config command"),
        }
    }

    #[tokio::test]
    async fn test_saved_config_reloads() {
        let dir = std::env::temp_dir().join(format!("compass-cli-{}", std::process::id()));
        let path = dir.join("config.json");
        let overrides = ConfigOverrides {
            port: Some(9300),
            expected_servers: Some(vec!["clock".to_string()]),
            ..Default::default()
        };

        show_config(Some(&path), overrides, true).await.unwrap();
        let loaded = AppConfig::load_from(&path).await;
        assert_eq!(loaded.port, 9300);
        assert_eq!(loaded.expected_servers, vec!["clock".to_string()]);

        let _ = tokio::fs::remove_dir_all(dir).await;
    }
}
