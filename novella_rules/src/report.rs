use std::collections::BTreeMap;

use serde::Serialize;

use crate::index::RuleIndex;

/// Authoring report over a loaded rule table: per-track coverage, ids
/// that fell out of the ordered maps, and precondition references to
/// nodes the table never defines.
///
/// A missing ordinal is where `reach_state` lookahead will dead-end, so
/// gaps are usually authoring mistakes. Dangling requirements are legal
/// (an undefined node is still playable and reachable) but worth eyes.
#[derive(Debug, Serialize)]
pub struct TableReport {
    pub total_rules: usize,
    pub main: Option<TrackSummary>,
    pub character_arcs: BTreeMap<String, TrackSummary>,
    pub random_groups: BTreeMap<String, TrackSummary>,
    pub unordered_nodes: Vec<String>,
    pub dangling_requirements: Vec<DanglingRequirement>,
}

#[derive(Debug, Serialize)]
pub struct TrackSummary {
    pub nodes: usize,
    pub first_ordinal: u32,
    pub last_ordinal: u32,
    pub missing_ordinals: Vec<u32>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct DanglingRequirement {
    pub node: String,
    pub requirement: String,
}

impl TableReport {
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub fn build_table_report(index: &RuleIndex) -> TableReport {
    let main = summarize(index.main_ordinals().collect());

    let mut character_arcs = BTreeMap::new();
    for character in index.arc_characters() {
        if let Some(summary) = summarize(index.arc_ordinals(character).collect()) {
            character_arcs.insert(character.to_string(), summary);
        }
    }

    let mut random_groups = BTreeMap::new();
    for group in index.random_groups() {
        let ordinals: Vec<u32> = index
            .random_group(group)
            .filter_map(|rule| index.parsed(&rule.node).and_then(|parsed| parsed.ordinal))
            .collect();
        if let Some(summary) = summarize(ordinals) {
            random_groups.insert(group.to_string(), summary);
        }
    }

    let unordered_nodes: Vec<String> = index
        .unordered_rules()
        .map(|rule| rule.node.clone())
        .collect();

    let mut dangling_requirements = Vec::new();
    for rule in index.rules() {
        for requirement in rule.requires_all.iter().chain(rule.requires_any.iter()) {
            if index.rule(requirement).is_none() {
                dangling_requirements.push(DanglingRequirement {
                    node: rule.node.clone(),
                    requirement: requirement.clone(),
                });
            }
        }
    }

    TableReport {
        total_rules: index.len(),
        main,
        character_arcs,
        random_groups,
        unordered_nodes,
        dangling_requirements,
    }
}

fn summarize(ordinals: Vec<u32>) -> Option<TrackSummary> {
    let first = *ordinals.first()?;
    let last = *ordinals.last()?;

    let mut missing = Vec::new();
    let mut expected = first;
    for ordinal in &ordinals {
        while expected < *ordinal {
            missing.push(expected);
            expected += 1;
        }
        expected = ordinal + 1;
    }

    Some(TrackSummary {
        nodes: ordinals.len(),
        first_ordinal: first,
        last_ordinal: last,
        missing_ordinals: missing,
    })
}

#[cfg(test)]
mod tests {
    use super::{build_table_report, DanglingRequirement};
    use crate::index::RuleIndex;
    use crate::table::UnlockRule;

    fn rule(node: &str) -> UnlockRule {
        UnlockRule {
            node: node.to_string(),
            ..UnlockRule::default()
        }
    }

    #[test]
    fn reports_ordinal_gaps_per_track() {
        let index = RuleIndex::build(vec![
            rule("M00"),
            rule("M01"),
            rule("M04"),
            rule("C00_Amy"),
            rule("C02_Amy"),
        ]);

        let report = build_table_report(&index);
        let main = report.main.expect("main summary");
        assert_eq!(main.nodes, 3);
        assert_eq!(main.missing_ordinals, vec![2, 3]);

        let amy = report.character_arcs.get("Amy").expect("amy summary");
        assert_eq!(amy.missing_ordinals, vec![1]);
    }

    #[test]
    fn flags_requirements_on_undefined_nodes() {
        let mut gated = rule("C05_Amy");
        gated.requires_all = vec!["M03".to_string()];
        let index = RuleIndex::build(vec![rule("M03"), gated, {
            let mut r = rule("M04");
            r.requires_any = vec!["C99_Ghost".to_string()];
            r
        }]);

        let report = build_table_report(&index);
        assert_eq!(
            report.dangling_requirements,
            vec![DanglingRequirement {
                node: "M04".to_string(),
                requirement: "C99_Ghost".to_string(),
            }]
        );
    }

    #[test]
    fn collects_unordered_nodes() {
        let index = RuleIndex::build(vec![rule("M00"), rule("Epilogue")]);
        let report = build_table_report(&index);
        assert_eq!(report.unordered_nodes, vec!["Epilogue".to_string()]);
        assert_eq!(report.total_rules, 2);
    }
}
