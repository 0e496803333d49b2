use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use novella_rules::report::build_table_report;
use novella_rules::{load_rule_table, RuleIndex, RuleTableSource};

#[derive(Parser, Debug)]
#[command(author, version, about = "Validates an unlock-rule table and reports track coverage", long_about = None)]
struct Args {
    /// Path to the unlock-rule table JSON
    #[arg(long, default_value = "assets/unlock_rules.json")]
    table: PathBuf,

    /// Optional path to write the table report as JSON
    #[arg(long)]
    json_report: Option<PathBuf>,

    /// List every rule after the summary
    #[arg(long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let loaded = load_rule_table(&args.table)?;
    if loaded.source == RuleTableSource::Missing {
        eprintln!(
            "[novella_rules] warning: no rule table at {}; every node evaluates as unlocked",
            args.table.display()
        );
    }

    let index = RuleIndex::build(loaded.rules);
    let report = build_table_report(&index);

    println!("Loaded {} unlock rules", report.total_rules);
    match report.main.as_ref() {
        Some(main) => println!(
            "Main track: {} nodes ({}..={}), {} missing",
            main.nodes,
            main.first_ordinal,
            main.last_ordinal,
            main.missing_ordinals.len()
        ),
        None => println!("Main track: no ordered nodes"),
    }
    for (character, summary) in &report.character_arcs {
        println!(
            "Arc {character}: {} nodes ({}..={}), {} missing",
            summary.nodes,
            summary.first_ordinal,
            summary.last_ordinal,
            summary.missing_ordinals.len()
        );
    }
    for (group, summary) in &report.random_groups {
        println!("Random {group}: {} nodes", summary.nodes);
    }
    if !report.unordered_nodes.is_empty() {
        println!(
            "{} node(s) excluded from ordered lookahead: {}",
            report.unordered_nodes.len(),
            report.unordered_nodes.join(", ")
        );
    }
    for dangling in &report.dangling_requirements {
        println!(
            "warning: {} requires undefined node {}",
            dangling.node, dangling.requirement
        );
    }

    if args.verbose {
        for rule in index.rules() {
            println!(
                "  {} (scene: {}, character: {})",
                rule.node, rule.starting_scene, rule.starting_character
            );
        }
    }

    if let Some(path) = args.json_report.as_ref() {
        let json = report
            .to_json_string()
            .context("failed to serialize table report")?;
        fs::write(path, json)
            .with_context(|| format!("failed to write report: {}", path.display()))?;
        println!("Saved table report to {}", path.display());
    }

    Ok(())
}
