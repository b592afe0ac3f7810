//! Smoke-test harness for the Pulsar module runtime core.
//!
//! This binary is not itself part of the core (spec §1: CLI surface is
//! owned by external collaborators) — it is a thin driver that loads
//! whatever supermodules and user-keys the caller names, runs
//! `ModuleManager::test_all`, and optionally emits the call graph as
//! Graphviz `dot` text. It exists to exercise the workspace end-to-end the
//! way a real host process would, the way `sui-sandbox`'s own `src/main.rs`
//! is a thin CLI wrapped around its library crates.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pulsar_core::ModuleManager;

#[derive(Debug, Parser)]
#[command(author, version, about = "Pulsar module runtime smoke-test harness")]
struct Args {
    /// Path to a supermodule to load (native shared object or scripted
    /// package directory). May be given multiple times.
    #[arg(long = "supermodule", value_name = "PATH")]
    supermodules: Vec<PathBuf>,

    /// Bind a user-visible key to a module-class name, formatted
    /// `key=ModuleClass`. May be given multiple times.
    #[arg(long = "enable-key", value_name = "KEY=CLASS")]
    enable_keys: Vec<String>,

    /// Skip running `ModuleManager::test_all()` after loading.
    #[arg(long, default_value_t = false)]
    no_test_all: bool,

    /// Emit the call graph as Graphviz `dot` text to stdout after running.
    #[arg(long, default_value_t = false)]
    dot: bool,
}

fn parse_enable_key(spec: &str) -> Result<(&str, &str)> {
    spec.split_once('=')
        .ok_or_else(|| anyhow!("--enable-key '{spec}' is not of the form KEY=CLASS"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let manager = ModuleManager::new();

    for path in &args.supermodules {
        let names = manager
            .load_supermodule(path)
            .with_context(|| format!("loading supermodule '{}'", path.display()))?;
        tracing::info!(path = %path.display(), classes = ?names, "loaded supermodule");
    }

    for spec in &args.enable_keys {
        let (key, class) = parse_enable_key(spec)?;
        manager
            .enable_key(key, class)
            .with_context(|| format!("enabling key '{key}' -> '{class}'"))?;
    }

    if !args.no_test_all {
        manager
            .test_all()
            .context("test_all() smoke instantiation failed")?;
        tracing::info!("test_all() completed: every enabled key instantiates cleanly");
    }

    if args.dot {
        println!("{}", manager.dot_graph());
    }

    Ok(())
}
