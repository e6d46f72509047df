// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowdeck-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowdeck and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Flowdeck CLI entrypoint.
//!
//! By default this runs the interactive TUI and serves MCP over streamable HTTP at
//! `http://127.0.0.1:<port>/mcp`, both editing the same flow.
//!
//! Use `--mcp` to run the MCP server over stdio instead (intended for tool integrations).

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use axum::Router;
use clap::Parser;
use rmcp::transport::{
    streamable_http_server::session::local::LocalSessionManager, StreamableHttpServerConfig,
    StreamableHttpService,
};
use tokio::sync::Mutex;

use flowdeck::config::{FlowdeckConfig, WriteMode};
use flowdeck::editor::FlowEditor;
use flowdeck::logging::{self, LogTarget, LOG_FILE};
use flowdeck::mcp::FlowdeckMcp;
use flowdeck::store::{
    DirectWrite, FlowFolder, MemoryStorage, PersistenceAdapter, WriteDurability, WriteQueue,
};

/// Flowdeck - build message flows in the terminal
#[derive(Parser, Debug, PartialEq, Eq)]
#[command(name = "flowdeck", version)]
#[command(after_help = "\
Examples:
  flowdeck                       Edit the flow in the current directory
  flowdeck ./support-bot         Edit the flow stored in ./support-bot
  flowdeck --demo                Try a sample flow that is never written to disk
  flowdeck ./support-bot --mcp   Serve the flow to an agent over stdio")]
struct Cli {
    /// Flow directory (default: current directory)
    #[arg(conflicts_with = "demo")]
    dir: Option<PathBuf>,

    /// Edit an in-memory sample flow
    #[arg(long)]
    demo: bool,

    /// Serve MCP over stdio instead of running the TUI
    #[arg(long, conflicts_with = "mcp_http_port")]
    mcp: bool,

    /// Port for the MCP HTTP endpoint next to the TUI (0 picks a free port)
    #[arg(long, value_name = "PORT")]
    mcp_http_port: Option<u16>,

    /// fsync every write and its directory
    #[arg(long)]
    durable_writes: bool,

    /// Write on the editing thread instead of the background writer
    #[arg(long)]
    direct_writes: bool,
}

impl Cli {
    fn flow_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Applies flag overrides on top of the file config.
    fn apply_to(&self, config: &mut FlowdeckConfig) {
        if self.durable_writes {
            config.store.durability = WriteDurability::Durable;
        }
        if self.direct_writes {
            config.store.write_mode = WriteMode::Direct;
        }
        if let Some(port) = self.mcp_http_port {
            config.mcp.http_port = port;
        }
    }

    fn log_target(&self) -> LogTarget {
        if self.mcp {
            LogTarget::Stderr
        } else if self.demo {
            let name = format!("flowdeck-demo-{}.log", std::process::id());
            LogTarget::File(std::env::temp_dir().join(name))
        } else {
            LogTarget::File(self.flow_dir().join(LOG_FILE))
        }
    }
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("flowdeck: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let dir = cli.flow_dir();
    let mut config = if cli.demo {
        FlowdeckConfig::default()
    } else {
        FlowdeckConfig::load_from_dir(&dir)?
    };
    cli.apply_to(&mut config);

    let log_target = cli.log_target();
    if let LogTarget::File(path) = &log_target {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    logging::init(&log_target, config.log.filter.as_deref())
        .context("failed to initialise logging")?;

    let persistence = open_persistence(&cli, &dir, &config)?;
    let (editor, report) = FlowEditor::open(persistence, &config.nodes)
        .with_context(|| format!("failed to open flow in {}", dir.display()))?;
    tracing::info!(
        dir = %dir.display(),
        demo = cli.demo,
        nodes = editor.graph().nodes().len(),
        edges = editor.graph().edges().len(),
        repaired = report.changed(),
        "flow opened"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    if cli.mcp {
        let mcp = FlowdeckMcp::new(editor);
        let editor = mcp.editor();
        runtime
            .block_on(mcp.serve_stdio())
            .map_err(|err| anyhow!("MCP stdio server failed: {err}"))?;
        return flush_on_exit(&editor);
    }

    let editor = Arc::new(Mutex::new(editor));
    runtime.block_on(serve_with_tui(editor.clone(), config.mcp.http_port))?;
    flush_on_exit(&editor)
}

fn open_persistence(
    cli: &Cli,
    dir: &Path,
    config: &FlowdeckConfig,
) -> anyhow::Result<Box<dyn PersistenceAdapter>> {
    if cli.demo {
        let storage = MemoryStorage::seeded(flowdeck::tui::demo_flow().into());
        return Ok(Box::new(DirectWrite::new(storage)));
    }

    let folder = FlowFolder::new(dir).with_durability(config.store.durability);
    Ok(match config.store.write_mode {
        WriteMode::Queued => {
            Box::new(WriteQueue::new(folder).context("failed to start the flow writer")?)
        }
        WriteMode::Direct => Box::new(DirectWrite::new(folder)),
    })
}

async fn serve_with_tui(editor: Arc<Mutex<FlowEditor>>, port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind MCP HTTP port {port}"))?;
    let local_addr = listener.local_addr()?;
    tracing::info!(url = %format!("http://{local_addr}/mcp"), "MCP HTTP endpoint listening");

    let config = StreamableHttpServerConfig {
        stateful_mode: true,
        ..StreamableHttpServerConfig::default()
    };
    let shutdown_token = config.cancellation_token.clone();
    let server_shutdown = shutdown_token.clone();

    let session_manager = Arc::new(LocalSessionManager::default());
    let mcp_service = {
        let mcp = FlowdeckMcp::with_shared_editor(editor.clone());
        StreamableHttpService::new(move || Ok(mcp.clone()), session_manager, config)
    };

    let router = Router::new().nest_service("/mcp", mcp_service);
    let server_handle = tokio::spawn(async move {
        let serve = axum::serve(listener, router).with_graceful_shutdown(async move {
            server_shutdown.cancelled().await;
        });
        if let Err(err) = serve.await {
            tracing::error!(error = %err, "MCP HTTP server failed");
        }
    });

    let tui_join =
        tokio::task::spawn_blocking(move || flowdeck::tui::run(editor).map_err(|err| err.to_string()))
            .await;

    shutdown_token.cancel();
    let _ = server_handle.await;

    tui_join
        .context("TUI thread panicked")?
        .map_err(|err| anyhow!("TUI failed: {err}"))
}

/// Waits for queued writes so nothing committed is lost on exit.
fn flush_on_exit(editor: &Arc<Mutex<FlowEditor>>) -> anyhow::Result<()> {
    editor
        .blocking_lock()
        .store()
        .flush()
        .context("failed to write the flow on exit")
}
