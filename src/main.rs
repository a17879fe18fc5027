//! # Industrial protocol bridge demo binary
//!
//! Parses a [`BridgeConfig`] path plus verbosity flags, builds a [`Router`],
//! registers the in-process console source/sink pair, and runs until
//! Ctrl-C: parse -> configure logging -> build -> run -> summarize.

use anyhow::{Context, Result};
use clap::Parser;
use ipb_core::cli::Args;
use ipb_core::config::BridgeConfig;
use ipb_core::drivers::{ConsoleSink, ConsoleSource};
use ipb_core::rule_engine::RuleBuilder;
use ipb_core::Router;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = ipb_core::logging::init(&args);

    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            BridgeConfig::from_json(&text).context("parsing BridgeConfig")?
        }
        None => BridgeConfig::default(),
    };
    if let Some(instance_id) = &args.instance_id {
        config.instance_id = instance_id.clone();
    }
    let using_default_routes = config.router.routes.is_empty();

    info!("starting bridge instance '{}'", config.instance_id);

    let (router_config, routes) = config.into_router_parts()?;
    let router = Router::new(router_config);
    router.initialize().context("initializing router")?;

    router.add_sink("console", ConsoleSink::new("console"), 1, true, 0)?;

    if using_default_routes {
        router.add_rule(
            RuleBuilder::new()
                .name("catch-all")
                .match_pattern("*")
                .route_to("console")
                .build(),
        );
    } else {
        for route in routes {
            router.add_rule(route.into_rule()?);
        }
    }

    let source = ConsoleSource::new("stdin");
    router.add_source("stdin", source);
    router.start().context("starting router")?;

    info!("bridge running; type \"address value\" lines on stdin, Ctrl-C to stop");
    tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;

    info!("shutting down");
    router.stop();

    let stats = router.stats();
    info!(
        "summary: in={} out={} dropped={} errors={} p99_ns={}",
        stats.messages_in, stats.messages_out, stats.dropped, stats.errors, stats.latency_p99_ns
    );

    Ok(())
}
