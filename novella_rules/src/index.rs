use std::collections::{BTreeMap, HashMap};

use crate::node::{parse_node_id, ParsedNodeId, Track};
use crate::table::UnlockRule;

/// Fast per-track lookup over the flat rule list.
///
/// Node ids are parsed exactly once here; every later check operates on
/// the typed form. Nodes without a parseable track or ordinal stay
/// reachable through [`RuleIndex::rule`] but are excluded from the
/// sorted ordinal maps, so ordered lookahead simply ends at the last
/// well-formed id.
#[derive(Debug, Default)]
pub struct RuleIndex {
    rules: Vec<IndexedRule>,
    by_id: HashMap<String, usize>,
    main: BTreeMap<u32, usize>,
    arcs: BTreeMap<String, BTreeMap<u32, usize>>,
    groups: BTreeMap<String, BTreeMap<u32, usize>>,
}

#[derive(Debug)]
struct IndexedRule {
    rule: UnlockRule,
    parsed: ParsedNodeId,
}

impl RuleIndex {
    /// Builds the index from a freshly loaded rule list. A duplicate
    /// node id keeps the later record.
    pub fn build(rules: Vec<UnlockRule>) -> Self {
        let mut index = RuleIndex::default();

        for rule in rules {
            let parsed = parse_node_id(&rule.node);
            let slot = index.rules.len();
            index.by_id.insert(rule.node.clone(), slot);

            if let Some((track, ordinal)) = parsed.track_and_ordinal() {
                match track {
                    Track::Main => {
                        index.main.insert(ordinal, slot);
                    }
                    Track::CharacterArc { character } => {
                        index
                            .arcs
                            .entry(character.clone())
                            .or_default()
                            .insert(ordinal, slot);
                    }
                    Track::Random { group } => {
                        index
                            .groups
                            .entry(group.clone())
                            .or_default()
                            .insert(ordinal, slot);
                    }
                }
            }

            index.rules.push(IndexedRule { rule, parsed });
        }

        index
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Exact-id lookup; works for every loaded rule, ordered or not.
    pub fn rule(&self, node_id: &str) -> Option<&UnlockRule> {
        self.by_id.get(node_id).map(|slot| &self.rules[*slot].rule)
    }

    /// The parsed form of a loaded rule's id.
    pub fn parsed(&self, node_id: &str) -> Option<&ParsedNodeId> {
        self.by_id.get(node_id).map(|slot| &self.rules[*slot].parsed)
    }

    pub fn main_at(&self, ordinal: u32) -> Option<&UnlockRule> {
        self.main.get(&ordinal).map(|slot| &self.rules[*slot].rule)
    }

    pub fn arc_at(&self, character: &str, ordinal: u32) -> Option<&UnlockRule> {
        self.arcs
            .get(character)
            .and_then(|track| track.get(&ordinal))
            .map(|slot| &self.rules[*slot].rule)
    }

    /// Random-pool nodes for `group`, in ordinal order.
    pub fn random_group(&self, group: &str) -> impl Iterator<Item = &UnlockRule> {
        self.groups
            .get(group)
            .into_iter()
            .flat_map(|track| track.values().map(|slot| &self.rules[*slot].rule))
    }

    pub fn main_ordinals(&self) -> impl Iterator<Item = u32> + '_ {
        self.main.keys().copied()
    }

    pub fn arc_characters(&self) -> impl Iterator<Item = &str> {
        self.arcs.keys().map(String::as_str)
    }

    pub fn arc_ordinals(&self, character: &str) -> impl Iterator<Item = u32> + '_ {
        self.arcs
            .get(character)
            .into_iter()
            .flat_map(|track| track.keys().copied())
    }

    pub fn random_groups(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Rules whose ids never made it into a sorted track map.
    pub fn unordered_rules(&self) -> impl Iterator<Item = &UnlockRule> {
        self.rules
            .iter()
            .filter(|indexed| indexed.parsed.track_and_ordinal().is_none())
            .map(|indexed| &indexed.rule)
    }

    pub fn rules(&self) -> impl Iterator<Item = &UnlockRule> {
        self.rules.iter().map(|indexed| &indexed.rule)
    }
}
