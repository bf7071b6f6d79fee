//! bindgate - CLI entry point

use anyhow::{Context, Result};
use bindgate::binding::Catalog;
use bindgate::budget::ComplexityClass;
use bindgate::classifier::ProblemClassifier;
use bindgate::cli::{Args, Commands, Config, ManifestArgs, Verbosity};
use bindgate::deploy::{CommandExecutor, DryRunExecutor, Executor};
use bindgate::graph::{DependencyGraph, SharedGraph};
use bindgate::manifest::Manifest;
use bindgate::pipeline::{Pipeline, Plan, RunReport};
use bindgate::qa::QaMetrics;
use bindgate::telemetry::TelemetryDisplay;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbosity: Verbosity, config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.tracing_filter(&config.logging.level)));

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_manifest(config: &Config, input: &ManifestArgs) -> Result<(Manifest, SharedGraph)> {
    let manifest = Manifest::load(&input.manifest)
        .with_context(|| format!("Failed to load manifest {}", input.manifest.display()))?;
    let mut graph = DependencyGraph::new();
    graph.set_max_depth(config.pipeline.max_depth);
    manifest.submit(&ProblemClassifier::new(), &mut graph)?;
    Ok((manifest, SharedGraph::from_graph(graph)))
}

fn build_pipeline(config: &Config, graph: SharedGraph, ceiling: Option<ComplexityClass>) -> Pipeline {
    let pipeline = Pipeline::from_config(config).with_graph(graph);
    match ceiling {
        Some(ceiling) => pipeline.with_ceiling(ceiling),
        None => pipeline,
    }
}

async fn show_order(config: &Config, input: &ManifestArgs) -> Result<()> {
    let (_, graph) = load_manifest(config, input)?;
    let order = graph.topological_order(&input.root).await?;
    for (i, id) in order.iter().enumerate() {
        println!("{:>3}. {}", i + 1, id);
    }
    Ok(())
}

fn print_plan(plan: &Plan, ceiling: ComplexityClass) {
    println!("{} {} (ceiling {})", "Plan for".bold(), plan.root.bold(), ceiling);
    for binding in &plan.bindings {
        println!(
            "  {} -> {} [{}]",
            binding.node_id,
            binding.target.id.cyan(),
            binding.complexity.notation()
        );
    }
}

fn print_metrics(metrics: &QaMetrics) {
    println!("QA ledger:");
    println!("  True accepts:  {}", metrics.true_accept);
    println!("  True rejects:  {}", metrics.true_reject);
    println!("  False accepts: {}", metrics.false_accept);
    println!("  False rejects: {}", metrics.false_reject);
}

fn print_report(report: &RunReport) {
    for deployment in &report.deployments {
        let mark = if deployment.accepted {
            "✓".green()
        } else {
            "✗".red()
        };
        println!(
            "  {} {} on {} ({}ms)",
            mark,
            deployment.node_id,
            deployment.target_id,
            deployment.report.latency_ms()
        );
        if let Some(detail) = &deployment.report.detail {
            println!("      {}", detail.dimmed());
        }
    }

    let state = if report.is_verified() {
        report.state.to_string().green()
    } else {
        report.state.to_string().red()
    };
    println!("Run {}: {}", report.run_id, state);
    if let Some(err) = &report.error {
        println!("  {} {}", "error:".red().bold(), err);
    }
}

async fn plan_root(args: &Args, config: &Config, input: &ManifestArgs, ceiling: Option<ComplexityClass>) -> Result<()> {
    let (manifest, graph) = load_manifest(config, input)?;
    let pipeline = build_pipeline(config, graph, ceiling);
    let plan = pipeline.plan(&input.root, &manifest.catalog()).await?;

    print_plan(&plan, pipeline.ceiling());
    if args.verbosity().show_events() {
        print_metrics(&pipeline.metrics().await);
    }
    Ok(())
}

async fn run_root(
    args: &Args,
    config: &Config,
    input: &ManifestArgs,
    ceiling: Option<ComplexityClass>,
    dry_run: bool,
    ledger: Option<PathBuf>,
) -> Result<()> {
    let verbosity = args.verbosity();
    let (manifest, graph) = load_manifest(config, input)?;
    let catalog: Catalog = manifest.catalog();
    let pipeline = build_pipeline(config, graph, ceiling);

    let executor: Box<dyn Executor> = if dry_run {
        Box::new(DryRunExecutor)
    } else {
        Box::new(CommandExecutor::new(Duration::from_secs(config.pipeline.command_timeout_secs)))
    };

    let report = match pipeline.plan(&input.root, &catalog).await {
        Ok(plan) => {
            if verbosity.show_summary() {
                print_plan(&plan, pipeline.ceiling());
            }
            pipeline.execute(&plan, executor.as_ref()).await
        }
        Err(err) => {
            println!("{} {}", "Planning rejected:".red().bold(), err);
            print_metrics(&pipeline.metrics().await);
            write_ledger(&pipeline, ledger.or_else(|| config.ledger_path())).await?;
            anyhow::bail!("run for {} failed during planning", input.root);
        }
    };

    print_report(&report);
    print_metrics(&pipeline.metrics().await);
    TelemetryDisplay::new(pipeline.telemetry().clone(), verbosity).display_summary();
    write_ledger(&pipeline, ledger.or_else(|| config.ledger_path())).await?;

    if !report.is_verified() {
        anyhow::bail!("run for {} ended in state {}", input.root, report.state);
    }
    Ok(())
}

async fn write_ledger(pipeline: &Pipeline, path: Option<PathBuf>) -> Result<()> {
    if let Some(path) = path {
        let ledger = pipeline.ledger();
        let qa = ledger.lock().await;
        qa.save(&path)
            .with_context(|| format!("Failed to write ledger {}", path.display()))?;
        tracing::info!(path = %path.display(), records = qa.len(), "ledger written");
    }
    Ok(())
}

fn show_config(args: &Args, config: &Config) -> Result<()> {
    println!("{}", "bindgate configuration".bold());
    match args.config.clone().or_else(Config::default_path) {
        Some(path) => println!("# source: {}", path.display()),
        None => println!("# source: built-in defaults"),
    }
    println!();
    print!("{}", config.to_toml()?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    if !config.logging.color_output {
        colored::control::set_override(false);
    }
    init_tracing(args.verbosity(), &config);

    match &args.command {
        Commands::Order { input } => show_order(&config, input).await?,
        Commands::Plan { input, ceiling } => plan_root(&args, &config, input, *ceiling).await?,
        Commands::Run {
            input,
            ceiling,
            dry_run,
            ledger,
        } => run_root(&args, &config, input, *ceiling, *dry_run, ledger.clone()).await?,
        Commands::Config => show_config(&args, &config)?,
    }

    Ok(())
}
