use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use chainlaunch_reconcile::resources::{
    BackupTarget, Key, KeyProvider, Node, Organization, PluginDeployment,
};
use chainlaunch_reconcile::state::StateEntry;
use chainlaunch_reconcile::{
    Applied, Auth, CancelSignal, ClientConfig, Engine, Error, HttpTransport, PollConfig, Resource,
    Severity, StateFile, cancel_pair,
};

#[derive(Parser)]
#[command(name = "chainlaunch-ctl")]
#[command(about = "Create, refresh and destroy Chainlaunch resources from JSON plans")]
struct Args {
    /// Chainlaunch API base URL
    #[arg(long, env = "CHAINLAUNCH_URL", default_value = "http://localhost:8100/api/v1")]
    url: String,

    /// Username for basic auth
    #[arg(long, env = "CHAINLAUNCH_USERNAME")]
    username: Option<String>,

    /// Password for basic auth
    #[arg(long, env = "CHAINLAUNCH_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// API key, sent as bearer token (takes precedence over basic auth)
    #[arg(long, env = "CHAINLAUNCH_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Per-request timeout in seconds (default: none)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Resource type
    #[arg(long, value_enum)]
    kind: Kind,

    /// State file for the resource
    #[arg(long)]
    state: PathBuf,

    /// Override the number of readiness checks
    #[arg(long)]
    attempts: Option<u32>,

    /// Override the delay between readiness checks
    #[arg(long)]
    delay_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Organization,
    Key,
    KeyProvider,
    Node,
    PluginDeployment,
    BackupTarget,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the resource, or update it when state exists
    Apply {
        /// JSON file with the resource attributes
        #[arg(long)]
        plan: PathBuf,
    },
    /// Re-read the resource; drops the state when it is gone
    Refresh,
    /// Delete the resource and its state
    Destroy,
    /// Wait for an existing resource to become ready
    Wait,
}

impl Args {
    fn client_config(&self) -> anyhow::Result<ClientConfig> {
        let auth = match (&self.api_key, &self.username, &self.password) {
            (Some(key), _, _) => Auth::ApiKey(key.clone()),
            (None, Some(username), Some(password)) => Auth::Basic {
                username: username.clone(),
                password: password.clone(),
            },
            (None, Some(_), None) => bail!("--username requires --password"),
            _ => Auth::None,
        };

        let mut config = ClientConfig::new(&self.url)?.with_auth(auth);
        if let Some(secs) = self.timeout_secs {
            config = config.with_request_timeout(Duration::from_secs(secs));
        }
        if self.attempts.is_some() || self.delay_secs.is_some() {
            let default = PollConfig::default();
            config = config.with_poll(PollConfig::new(
                self.attempts.unwrap_or(default.max_attempts),
                self.delay_secs.map(Duration::from_secs).unwrap_or(default.delay),
            ));
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("chainlaunch_reconcile=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = args.client_config()?;
    let poll = config.poll;
    info!(url = %config.base_url, "Using Chainlaunch API");

    let transport = HttpTransport::new(config).context("Failed to create HTTP client")?;
    let mut engine = Engine::new(Arc::new(transport));
    if let Some(poll) = poll {
        engine = engine.with_poll_override(poll);
    }

    let (handle, cancel) = cancel_pair();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Received SIGINT, cancelling");
            handle.cancel();
        }
    });

    let ctl = Ctl {
        engine,
        state: StateFile::new(&args.state),
        cancel,
    };
    let failed = match args.kind {
        Kind::Organization => ctl.run(&Organization, &args.command).await?,
        Kind::Key => ctl.run(&Key, &args.command).await?,
        Kind::KeyProvider => ctl.run(&KeyProvider::default(), &args.command).await?,
        Kind::Node => ctl.run(&Node::default(), &args.command).await?,
        Kind::PluginDeployment => ctl.run(&PluginDeployment::default(), &args.command).await?,
        Kind::BackupTarget => ctl.run(&BackupTarget, &args.command).await?,
    };

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

struct Ctl {
    engine: Engine,
    state: StateFile,
    cancel: CancelSignal,
}

impl Ctl {
    /// Returns `true` when an error-severity diagnostic was reported.
    async fn run<R: Resource>(&self, resource: &R, command: &Commands) -> anyhow::Result<bool> {
        let kind = resource.kind();
        let prior = self.state.load::<R::Record>().await?;
        if let Some(entry) = prior.as_ref().filter(|e| e.kind != kind) {
            bail!(
                "{} holds a {}, not a {}",
                self.state.path().display(),
                entry.kind,
                kind
            );
        }

        match command {
            Commands::Apply { plan } => {
                let plan: R::Plan = read_plan(plan).await?;
                let applied = match &prior {
                    None => self.engine.create(resource, &plan, &self.cancel).await?,
                    Some(entry) => match self
                        .engine
                        .update(resource, &entry.record, &plan, &self.cancel)
                        .await
                    {
                        Ok(applied) => applied,
                        Err(Error::Unsupported(msg)) => {
                            bail!("{}; destroy and apply again to replace it", msg)
                        }
                        Err(e) => return Err(e.into()),
                    },
                };
                self.finish(resource, applied).await
            }
            Commands::Refresh => {
                let Some(entry) = prior else {
                    bail!("no state at {}", self.state.path().display());
                };
                if let Some(warning) = &entry.warning {
                    eprintln!("Warning: {}", warning);
                }
                if let Some(phase) = entry.phase {
                    info!(kind, id = %entry.id, phase = ?phase, "Last applied phase");
                }
                let refreshed = self
                    .engine
                    .read(resource, &entry.id, Some(&entry.record))
                    .await?;
                match refreshed {
                    Some(record) => {
                        print_record(&record)?;
                        self.state.save(&StateEntry { record, ..entry }).await?;
                    }
                    None => {
                        eprintln!("{} {} no longer exists, removing state", kind, entry.id);
                        self.state.remove().await?;
                    }
                }
                Ok(false)
            }
            Commands::Destroy => {
                match prior {
                    Some(entry) => {
                        self.engine.delete(resource, &entry.id).await?;
                        self.state.remove().await?;
                        info!(kind, id = %entry.id, "Destroyed");
                    }
                    None => info!(kind, "Nothing to destroy"),
                }
                Ok(false)
            }
            Commands::Wait => {
                let Some(entry) = prior else {
                    bail!("no state at {}", self.state.path().display());
                };
                let applied = self
                    .engine
                    .wait_ready(resource, &entry.record, &self.cancel)
                    .await?;
                self.finish(resource, applied).await
            }
        }
    }

    /// Persist an applied record and report its diagnostics.
    async fn finish<R: Resource>(&self, resource: &R, applied: Applied<R::Record>) -> anyhow::Result<bool> {
        for diagnostic in &applied.diagnostics {
            eprintln!("{}", diagnostic);
        }
        let warning = applied
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .map(|d| d.summary.clone())
            .reduce(|a, b| format!("{}; {}", a, b));

        let entry = StateEntry {
            kind: resource.kind().to_string(),
            id: resource.record_id(&applied.record),
            record: applied.record,
            warning,
            phase: Some(applied.phase),
        };
        self.state.save(&entry).await?;
        print_record(&entry.record)?;
        info!(kind = %entry.kind, id = %entry.id, phase = ?applied.phase, "State saved");

        Ok(applied.diagnostics.iter().any(|d| d.severity == Severity::Error))
    }
}

async fn read_plan<P: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<P> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read plan {}", path.display()))?;
    serde_json::from_slice(&data).with_context(|| format!("Invalid plan {}", path.display()))
}

fn print_record<T: serde::Serialize>(record: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(record)?);
    Ok(())
}
