use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use crisis_core::prelude::*;
use crisis_core::telemetry;
use crisis_graph::{EntityId, EntityStatus, BUILTIN_TEMPLATES};
use crisis_scenario::ScenarioRecord;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

fn template_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("template")
            .long("template")
            .help("Built-in topology template (defaults to the configured one)"),
    )
    .arg(
        Arg::new("template-file")
            .long("template-file")
            .value_parser(value_parser!(PathBuf))
            .conflicts_with("template")
            .help("YAML or JSON topology file"),
    )
}

fn cli() -> Command {
    Command::new("crisis-sim")
        .version(crisis_core::VERSION)
        .about("Crisis scenario generation engine")
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML engine configuration"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .default_value("info")
                .help("Log filter used when CRISIS_LOG is unset"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand_required(true)
        .subcommand(template_args(
            Command::new("generate")
                .about("Generate a validated inject timeline")
                .arg(
                    Arg::new("type")
                        .long("type")
                        .default_value("ransomware")
                        .help("Scenario type (ransomware, data_breach, ddos, insider_threat, supply_chain)"),
                )
                .arg(
                    Arg::new("standard")
                        .long("standard")
                        .help("Compliance standard (DORA, NIST_CSF, ISO27001)"),
                )
                .arg(
                    Arg::new("iterations")
                        .long("iterations")
                        .value_parser(value_parser!(u32))
                        .help("Number of injects to generate"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_parser(value_parser!(u64))
                        .help("Seed for action selection"),
                )
                .arg(Arg::new("user").long("user").help("Requesting user"))
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory for persisted scenario records"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the scenario record as JSON"),
                ),
        ))
        .subcommand(template_args(
            Command::new("impact")
                .about("Show the cascading impact of a status change")
                .arg(Arg::new("entity").long("entity").required(true).help("Entity id"))
                .arg(
                    Arg::new("status")
                        .long("status")
                        .default_value("compromised")
                        .help("Hypothetical new status"),
                )
                .arg(
                    Arg::new("depth")
                        .long("depth")
                        .value_parser(value_parser!(usize))
                        .help("Traversal depth"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        ))
        .subcommand(Command::new("templates").about("List built-in topology templates"))
        .subcommand(
            Command::new("validate-template")
                .about("Check a topology file for dangling or duplicate references")
                .arg(
                    Arg::new("path")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("YAML or JSON topology file"),
                ),
        )
}

fn load_config(matches: &ArgMatches) -> Result<EngineConfig> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => EngineConfig::from_path(path).context("loading engine configuration"),
        None => Ok(EngineConfig::default()),
    }
}

fn load_store(args: &ArgMatches, config: &EngineConfig) -> Result<GraphStore> {
    let template = match args.get_one::<PathBuf>("template-file") {
        Some(path) => TopologyTemplate::from_path(path)
            .with_context(|| format!("loading topology {}", path.display()))?,
        None => {
            let name = args
                .get_one::<String>("template")
                .map_or(config.template.as_str(), String::as_str);
            TopologyTemplate::builtin(name)?
        }
    };
    let store = GraphStore::from_template(&template)?.with_snapshot_limit(config.snapshot_limit);
    tracing::info!(
        template = %template.name,
        entities = store.entity_count(),
        relationships = store.relationship_count(),
        "topology loaded"
    );
    Ok(store)
}

fn print_timeline(state: &ScenarioState) {
    println!(
        "Scenario {} ({}, {})",
        state.scenario_id, state.scenario_type, state.standard
    );
    for inject in &state.injects {
        println!(
            "  {} {:<19} {} {} -> {}: {}",
            inject.time_offset,
            inject.phase,
            inject.inject_id,
            inject.source,
            inject.target,
            inject.content
        );
    }
    println!();
    println!("Injects:  {}", state.injects.len());
    println!("Errors:   {}", state.errors.len());
    println!("Warnings: {}", state.warnings.len());
    for warning in &state.warnings {
        println!("  - {warning}");
    }
}

async fn generate(args: &ArgMatches, mut config: EngineConfig) -> Result<()> {
    if let Some(standard) = args.get_one::<String>("standard") {
        config = config.with_standard(standard.parse().map_err(anyhow::Error::msg)?);
    }
    if let Some(iterations) = args.get_one::<u32>("iterations") {
        config = config.with_max_iterations(*iterations);
    }
    if let Some(seed) = args.get_one::<u64>("seed") {
        config = config.with_seed(*seed);
    }
    let scenario_type = args
        .get_one::<String>("type")
        .map_or(ScenarioType::Ransomware, |t| ScenarioType::from(t.as_str()));

    let store = Arc::new(load_store(args, &config)?);
    let repository: Arc<dyn ScenarioRepository> = match args.get_one::<PathBuf>("out") {
        Some(dir) => Arc::new(JsonFileRepository::open(dir.clone()).await?),
        None => Arc::new(InMemoryRepository::new()),
    };

    let orchestrator = ScenarioOrchestrator::new(
        store,
        Collaborators::reference(config.seed),
        repository,
        config.clone(),
    )?;

    let mut state = ScenarioState::new(scenario_type, config.standard, config.max_iterations);
    if let Some(user) = args.get_one::<String>("user") {
        state = state.with_user(user.clone());
    }

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    let state = orchestrator.run(state, cancel_rx).await?;

    if args.get_flag("json") {
        let record = ScenarioRecord::from_state(&state);
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print_timeline(&state);
    }
    Ok(())
}

fn impact(args: &ArgMatches, config: &EngineConfig) -> Result<()> {
    let store = load_store(args, config)?;
    let entity = args
        .get_one::<String>("entity")
        .map(|id| EntityId::from(id.as_str()))
        .context("--entity is required")?;
    let status = args
        .get_one::<String>("status")
        .map_or(EntityStatus::Compromised, |s| EntityStatus::from(s.as_str()));
    let depth = args
        .get_one::<usize>("depth")
        .copied()
        .unwrap_or(config.impact_depth);

    let report = store.calculate_cascading_impact(&entity, &status, depth)?;

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Impact of {} -> {}", report.source, report.new_status);
    println!("  Affected:  {}", report.affected_count());
    println!("  Max depth: {}", report.max_depth_found);
    println!("  Score:     {:.1} ({})", report.impact_score, report.impact_severity);
    println!("  Recovery:  {}", report.estimated_recovery_time);
    for affected in &report.affected {
        println!(
            "    [{}] {} {} ({}, {})",
            affected.depth, affected.entity_id, affected.name, affected.entity_type, affected.criticality
        );
    }
    Ok(())
}

fn validate_template(args: &ArgMatches) -> Result<()> {
    let Some(path) = args.get_one::<PathBuf>("path") else {
        bail!("a template path is required");
    };
    let template = TopologyTemplate::from_path(path)
        .with_context(|| format!("loading topology {}", path.display()))?;
    template.validate()?;
    println!(
        "{}: {} entities, {} relationships OK",
        template.name,
        template.entities.len(),
        template.relationships.len()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();

    let level = matches
        .get_one::<String>("log-level")
        .map_or("info", String::as_str);
    telemetry::init(level, matches.get_flag("json-logs")).map_err(anyhow::Error::msg)?;

    let config = load_config(&matches)?;

    match matches.subcommand() {
        Some(("generate", args)) => generate(args, config).await,
        Some(("impact", args)) => impact(args, &config),
        Some(("templates", _)) => {
            for name in BUILTIN_TEMPLATES {
                let template = TopologyTemplate::builtin(name)?;
                println!(
                    "{name}: {} entities, {} relationships",
                    template.entities.len(),
                    template.relationships.len()
                );
            }
            Ok(())
        }
        Some(("validate-template", args)) => validate_template(args),
        _ => unreachable!("subcommand_required"),
    }
}
