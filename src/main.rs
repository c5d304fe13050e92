// Media key engine host
//
// `serve` runs the engine over JSON lines: events arrive on stdin tagged by
// "event", effects leave on stdout tagged by "effect". Logs go to stderr.
// `install-host` and `uninstall-host` manage the native messaging manifests.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use kodegen_media_keys::host::{AgentDispatcher, InMemoryDirectory, NotificationPresenter};
use kodegen_media_keys::manifest::{
    self, Browser, DEFAULT_FIREFOX_EXTENSION_ID, ManifestLocations, NativeHostManifest,
};
use kodegen_media_keys::{
    Agent, AgentCommand, AgentId, AgentMessage, Collaborators, Engine, EngineHandle,
    EngineOptions, InboundEvent, MediaKeysError, Notification, NotificationKey, PeerCommand,
    PlaybackState, Settings,
};

#[derive(Parser, Debug)]
#[command(name = "kodegen-media-keys", version)]
#[command(about = "Media key arbitration engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the engine over JSON lines on stdin/stdout (default)
    Serve(ServeArgs),
    /// Install the native messaging host manifest
    InstallHost {
        #[arg(long, value_enum, default_value_t = BrowserArg::Chrome)]
        browser: BrowserArg,
        /// Extension id allowed to start the host (required for Chrome)
        #[arg(long)]
        id: Option<String>,
        /// Host executable path written into the manifest
        #[arg(long)]
        host: Option<PathBuf>,
    },
    /// Remove the native messaging host manifest
    UninstallHost {
        #[arg(long, value_enum, default_value_t = BrowserArg::Chrome)]
        browser: BrowserArg,
    },
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Route routable commands to a single agent
    #[arg(long, default_value_t = false)]
    single_agent: bool,
    /// Mirror the current player over MPRIS
    #[arg(long, default_value_t = false)]
    mpris: bool,
    /// Native messaging host executable
    #[arg(long)]
    host: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BrowserArg {
    Chrome,
    Firefox,
}

impl From<BrowserArg> for Browser {
    fn from(arg: BrowserArg) -> Self {
        match arg {
            BrowserArg::Chrome => Self::Chrome,
            BrowserArg::Firefox => Self::Firefox,
        }
    }
}

/// Line read from stdin
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum HostEvent {
    ReportState {
        agent: AgentId,
        #[serde(default)]
        state: PlaybackState,
    },
    AgentRemoved {
        agent: AgentId,
    },
    Agents {
        agents: Vec<Agent>,
    },
    AgentFlags {
        agent: AgentId,
        #[serde(default)]
        secondary: Option<bool>,
        #[serde(default)]
        notifications: Option<bool>,
    },
    Focus {
        agent: AgentId,
    },
    AgentAttached {
        agent: AgentId,
    },
    RawInput {
        name: String,
    },
    Command(AgentCommand),
    PeerCommand {
        command: String,
    },
    Settings(Settings),
    Shutdown,
}

impl HostEvent {
    /// Apply directory changes and produce the engine event, if any
    fn apply(self, directory: &InMemoryDirectory) -> Option<InboundEvent> {
        match self {
            Self::ReportState { agent, state } => Some(InboundEvent::ReportState { agent, state }),
            Self::AgentRemoved { agent } => {
                directory.remove_agent(&agent);
                Some(InboundEvent::AgentRemoved { agent })
            }
            Self::Agents { agents } => {
                directory.set_agents(agents);
                None
            }
            Self::AgentFlags {
                agent,
                secondary,
                notifications,
            } => {
                if let Some(secondary) = secondary {
                    directory.set_secondary(&agent, secondary);
                }
                if let Some(enabled) = notifications {
                    directory.set_notifications(&agent, enabled);
                }
                None
            }
            Self::Focus { agent } => {
                if !directory.set_focus(&agent) {
                    log::warn!("Focus event for unknown agent {agent}");
                }
                Some(InboundEvent::FocusChanged { agent })
            }
            Self::AgentAttached { agent } => Some(InboundEvent::AgentAttached { agent }),
            Self::RawInput { name } => Some(InboundEvent::raw_input(name)),
            Self::Command(command) => Some(InboundEvent::Command(command)),
            Self::PeerCommand { command } => {
                Some(InboundEvent::PeerCommand(PeerCommand::parse(&command)))
            }
            Self::Settings(settings) => Some(InboundEvent::SettingsChanged(settings)),
            Self::Shutdown => Some(InboundEvent::Shutdown),
        }
    }
}

/// Line written to stdout
#[derive(Debug, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
enum HostEffect {
    Dispatch {
        agent: AgentId,
        message: AgentMessage,
    },
    Notify {
        key: NotificationKey,
        notification: Notification,
    },
    Clear {
        key: NotificationKey,
    },
}

/// Dispatcher and presenter that report effects on stdout
struct StdioHost {
    effects: mpsc::UnboundedSender<HostEffect>,
}

impl StdioHost {
    fn emit(&self, effect: HostEffect) -> bool {
        self.effects.send(effect).is_ok()
    }
}

impl AgentDispatcher for StdioHost {
    fn dispatch(
        &self,
        agent: &AgentId,
        message: &AgentMessage,
    ) -> kodegen_media_keys::Result<()> {
        let effect = HostEffect::Dispatch {
            agent: agent.clone(),
            message: message.clone(),
        };
        if self.emit(effect) {
            Ok(())
        } else {
            Err(MediaKeysError::dispatch(agent.clone(), "stdout closed"))
        }
    }
}

impl NotificationPresenter for StdioHost {
    fn notify(
        &self,
        key: &NotificationKey,
        notification: &Notification,
    ) -> kodegen_media_keys::Result<()> {
        let effect = HostEffect::Notify {
            key: key.clone(),
            notification: notification.clone(),
        };
        if self.emit(effect) {
            Ok(())
        } else {
            Err(MediaKeysError::notification("stdout closed"))
        }
    }

    fn clear(&self, key: &NotificationKey) -> kodegen_media_keys::Result<()> {
        if self.emit(HostEffect::Clear { key: key.clone() }) {
            Ok(())
        } else {
            Err(MediaKeysError::notification("stdout closed"))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve(ServeArgs::default())) {
        Command::Serve(args) => serve(args).await,
        Command::InstallHost { browser, id, host } => install_host(browser.into(), id, host),
        Command::UninstallHost { browser } => uninstall_host(browser.into()),
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let mut builder = EngineOptions::builder()
        .single_agent_mode(args.single_agent)
        .use_bridge(args.mpris);
    if let Some(host) = args.host {
        builder = builder.host_path(host);
    }

    let directory = InMemoryDirectory::new();
    let (effects_tx, effects_rx) = mpsc::unbounded_channel();
    let host = Arc::new(StdioHost {
        effects: effects_tx,
    });
    let collaborators = Collaborators::new(Arc::new(directory.clone()), host.clone(), host);

    let (engine, handle) = Engine::with_native_host(builder.build(), collaborators);

    let writer = tokio::spawn(write_effects(effects_rx));
    let engine_task = tokio::spawn(engine.run());

    let read = read_events(&directory, &handle).await;

    if handle.shutdown().is_err() {
        log::debug!("Engine already stopped");
    }
    engine_task.await.context("Engine task panicked")?;
    writer.await.context("Effect writer panicked")??;

    read
}

async fn read_events(directory: &InMemoryDirectory, handle: &EngineHandle) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event: HostEvent = match serde_json::from_str(line) {
            Ok(event) => event,
            Err(e) => {
                log::warn!("Ignoring malformed event: {e}");
                continue;
            }
        };

        let shutdown = matches!(event, HostEvent::Shutdown);
        if let Some(event) = event.apply(directory) {
            if handle.send(event).is_err() {
                break;
            }
        }
        if shutdown {
            break;
        }
    }

    Ok(())
}

async fn write_effects(mut effects: mpsc::UnboundedReceiver<HostEffect>) -> Result<()> {
    let mut stdout = tokio::io::stdout();

    while let Some(effect) = effects.recv().await {
        let mut line = serde_json::to_string(&effect).context("Failed to encode effect")?;
        line.push('\n');
        stdout.write_all(line.as_bytes()).await?;
        stdout.flush().await?;
    }

    Ok(())
}

fn install_host(browser: Browser, id: Option<String>, host: Option<PathBuf>) -> Result<()> {
    let locations = ManifestLocations::from_env()?;

    let extension_id = match (browser, id) {
        (_, Some(id)) => id,
        (Browser::Firefox, None) => DEFAULT_FIREFOX_EXTENSION_ID.to_string(),
        (Browser::Chrome, None) => bail!("--id is required for Chrome"),
    };
    let host_path = host.unwrap_or_else(|| locations.default_host_path());

    let manifest = NativeHostManifest::new(browser, host_path, &extension_id)?;
    let written = manifest::install(&locations, browser, &manifest)?;

    if written.is_empty() {
        bail!("No {browser:?} configuration directory found");
    }
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}

fn uninstall_host(browser: Browser) -> Result<()> {
    let locations = ManifestLocations::from_env()?;

    for path in manifest::uninstall(&locations, browser)? {
        println!("{}", path.display());
    }
    Ok(())
}
