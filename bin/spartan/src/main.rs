use std::sync::Arc;

use clap::Parser;
use spartan_config::grok::PatternRegistry;
use spartan_config::parser::parse_glob;
use spartan_core::registry::{CodecRegistry, Registry};
use spartan_core::traits::{Filter, Input, Output};
use spartan_filters::{build_filter_chain, build_output_chain, Controller, OutputController};
use tokio::sync::mpsc;
use tracing::{error, info};

/// Spartan - a Logstash-spirited log-event processing pipeline.
#[derive(Parser, Debug)]
#[command(name = "spartan", version)]
struct Args {
    /// Filter/pipeline configuration path or glob pattern.
    #[arg(short = 'f', long = "filters", default_value = "spartan.conf")]
    filters: String,

    /// Display version information and exit.
    #[arg(short = 'v', long = "version")]
    version: bool,

    /// Parse the pipeline configuration and exit without starting anything.
    #[arg(long = "configtest", short = 't')]
    configtest: bool,

    /// Number of filter worker pipelines sharing the input channel.
    #[arg(long = "pipelines", default_value_t = 1)]
    pipelines: usize,

    /// Maximum events per batch handed to a filter or output chain.
    #[arg(long = "batch-size", default_value_t = 100)]
    batch_size: usize,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    if args.version {
        println!("spartan {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    if let Err(err) = run(args).await {
        error!(error = %err, "spartan exited with a fatal error");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let parsed = parse_glob(&args.filters)?;

    let filter_registry: Registry<Arc<dyn Filter>> = Registry::new();
    let pattern_registry = Arc::new(PatternRegistry::with_builtins());
    spartan_filters::register_builtins(&filter_registry, pattern_registry)?;

    let codec_registry = Arc::new(CodecRegistry::new());
    spartan_io::codecs::register_builtins(&codec_registry)?;

    let input_registry: Registry<Box<dyn Input>> = Registry::new();
    spartan_io::register_inputs(&input_registry)?;

    let output_registry: Registry<Box<dyn Output>> = Registry::new();
    spartan_io::register_outputs(&output_registry, codec_registry)?;

    let chain = Arc::new(build_filter_chain(&parsed.filters, &filter_registry)?);
    let output_chain = build_output_chain(&parsed.outputs, &output_registry)?;

    let mut inputs = Vec::with_capacity(parsed.inputs.len());
    for def in &parsed.inputs {
        let mut opts = def.options.clone();
        inputs.push(input_registry.create(&def.module, &mut opts)?);
    }

    if args.configtest {
        info!("configuration parsed successfully");
        return Ok(());
    }

    let (input_tx, input_rx) = mpsc::channel(args.batch_size);
    let (output_tx, output_rx) = mpsc::channel(args.batch_size);

    info!("starting outputs");
    let output_controller = OutputController::start(output_chain, output_rx, args.batch_size);

    info!("starting filters");
    let filter_controller = Controller::start(chain, input_rx, output_tx, args.pipelines, args.batch_size);

    info!("starting inputs");
    let cancel = tokio_util::sync::CancellationToken::new();
    for mut input in inputs {
        let tx = input_tx.clone();
        let input_cancel = cancel.child_token();
        input.start(tx, input_cancel).await?;
    }
    drop(input_tx);

    info!("waiting for shutdown signal");
    tokio::signal::ctrl_c().await?;

    info!("shutting down inputs");
    cancel.cancel();

    info!("shutting down filters");
    filter_controller.close().await;

    info!("shutting down outputs");
    output_controller.close().await;

    Ok(())
}
