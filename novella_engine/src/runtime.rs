use std::fs;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

use novella_rules::{load_rule_table, RuleIndex, RuleTableSource};

use novella_engine::assets::{AssetCatalog, ManifestAssets, PermissiveAssets};
use novella_engine::config::load_config;
use novella_engine::playbook::{load_playbook, run_playbook};
use novella_engine::save::PersistenceGateway;
use novella_engine::session::{GameSession, RecordingHost};

use crate::cli::Args;

pub fn execute(args: Args) -> Result<()> {
    if args.seed.is_some() && args.playbook.is_none() {
        eprintln!("[novella_engine] warning: --seed is ignored without --playbook");
    }

    let config = load_config(args.config.as_deref())?;

    let loaded = load_rule_table(&args.rules)?;
    if loaded.source == RuleTableSource::Missing {
        eprintln!(
            "[novella_engine] warning: no rule table at {}; starting degraded, every node unlocked",
            args.rules.display()
        );
    }
    let rule_count = loaded.rules.len();
    let index = RuleIndex::build(loaded.rules);

    let assets: Box<dyn AssetCatalog> = match args.assets.as_ref() {
        Some(path) => Box::new(ManifestAssets::from_json_file(path)?),
        None => Box::new(PermissiveAssets),
    };

    let gateway = PersistenceGateway::new(&args.save);
    let mut session = GameSession::new(config, index, gateway, assets);

    println!(
        "Loaded {rule_count} unlock rules; session at scene {} with main pointer {}",
        session.current_scene(),
        session.latest_main_node()
    );

    if let Some(path) = args.playbook.as_ref() {
        let playbook = load_playbook(path)?;
        let mut host = RecordingHost::default();
        let mut rng = match args.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        run_playbook(&mut session, &playbook, &mut host, &mut rng)?;
        println!(
            "Replayed {} playbook step(s); started units: {}",
            playbook.steps.len(),
            if host.started.is_empty() {
                "<none>".to_string()
            } else {
                host.started.join(", ")
            }
        );
    }

    if args.verbose {
        for event in session.events() {
            println!("  {event}");
        }
    }

    if let Some(path) = args.state_json.as_ref() {
        let json = serde_json::to_string_pretty(&session.snapshot())
            .context("failed to serialize session snapshot")?;
        fs::write(path, json)
            .with_context(|| format!("failed to write snapshot: {}", path.display()))?;
        println!("Saved session snapshot to {}", path.display());
    }

    if let Some(path) = args.event_log_json.as_ref() {
        let json = serde_json::to_string_pretty(session.events())
            .context("failed to serialize event log")?;
        fs::write(path, json)
            .with_context(|| format!("failed to write event log: {}", path.display()))?;
        println!("Saved event log to {}", path.display());
    }

    println!(
        "Reached {} node(s); main pointer now {}",
        session.snapshot().reached_states.len(),
        session.latest_main_node()
    );

    Ok(())
}
