use std::collections::{BTreeMap, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;

use novella_rules::node::{parse_node_id, Track};
use novella_rules::{is_unlocked, RuleIndex, UnlockRule};

/// Outcome of a `reach_state` call.
#[derive(Debug, Clone, PartialEq)]
pub enum ReachOutcome {
    /// The node was already in the reached set; nothing changed and no
    /// save should be written.
    AlreadyReached,
    /// The node was recorded. `newly_available` lists pointer nodes that
    /// the single lookahead step found present, unreached, and unlocked.
    Recorded { newly_available: Vec<String> },
}

/// Marker kind for scene entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Main,
    CharacterArc,
}

/// A pointer node that should surface a narrative marker in a scene.
#[derive(Debug, Clone, Copy)]
pub struct SceneStoryPart<'a> {
    pub kind: MarkerKind,
    pub rule: &'a UnlockRule,
}

/// Owns the reached-state set and the per-track "latest" pointers.
///
/// Pointers are pre-advanced: completing ordinal `k` aims the pointer at
/// `k + 1`, so a pointer always names the node to offer next, never the
/// one just finished. Random-track completions only enter the reached
/// set. Pointer ordinals never decrease.
#[derive(Debug, Clone)]
pub struct ProgressionTracker {
    reached: HashSet<String>,
    latest_main: String,
    latest_arcs: BTreeMap<String, String>,
}

impl ProgressionTracker {
    pub fn new(
        reached: HashSet<String>,
        latest_main: String,
        latest_arcs: BTreeMap<String, String>,
    ) -> Self {
        ProgressionTracker {
            reached,
            latest_main,
            latest_arcs,
        }
    }

    pub fn reached(&self) -> &HashSet<String> {
        &self.reached
    }

    /// Reached ids in sorted order, for deterministic serialization.
    pub fn reached_sorted(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.reached.iter().cloned().collect();
        ids.sort();
        ids
    }

    pub fn latest_main_node(&self) -> &str {
        &self.latest_main
    }

    pub fn latest_character_arc_node(&self, character: &str) -> Option<&str> {
        self.latest_arcs.get(character).map(String::as_str)
    }

    pub fn character_arcs(&self) -> &BTreeMap<String, String> {
        &self.latest_arcs
    }

    pub fn is_node_unlocked(&self, node_id: &str, index: &RuleIndex) -> bool {
        is_unlocked(index, node_id, &self.reached)
    }

    /// Records a completed node. Idempotent: a node already reached is a
    /// no-op. Main/arc completions pre-advance their track pointer to
    /// the id at `ordinal + 1`, whether or not that node exists yet.
    pub fn reach_state(
        &mut self,
        node_id: &str,
        index: &RuleIndex,
        events: &mut Vec<String>,
    ) -> ReachOutcome {
        if !self.reached.insert(node_id.to_string()) {
            return ReachOutcome::AlreadyReached;
        }
        events.push(format!("progress.reach {node_id}"));

        let parsed = parse_node_id(node_id);
        if let Some((track, ordinal)) = parsed.track_and_ordinal() {
            match track {
                Track::Main => {
                    let candidate = Track::Main.id_at(ordinal + 1);
                    if pointer_advances(Some(self.latest_main.as_str()), ordinal + 1) {
                        self.latest_main = candidate;
                        events.push(format!("progress.pointer main {}", self.latest_main));
                    }
                }
                Track::CharacterArc { character } => {
                    let candidate = track.id_at(ordinal + 1);
                    if pointer_advances(
                        self.latest_arcs.get(character).map(String::as_str),
                        ordinal + 1,
                    ) {
                        events.push(format!("progress.pointer arc {character} {candidate}"));
                        self.latest_arcs.insert(character.clone(), candidate);
                    }
                }
                Track::Random { .. } => {}
            }
        }

        let newly_available = self.discover_newly_unlocked(index);
        for node in &newly_available {
            events.push(format!("progress.available {node}"));
        }

        ReachOutcome::Recorded { newly_available }
    }

    /// Single lookahead step over every pointer: reports the pointer
    /// nodes that exist in the index, are unreached, and unlocked.
    /// Pointers themselves never move here; a pointer at an id the index
    /// does not know simply contributes nothing.
    pub fn discover_newly_unlocked(&self, index: &RuleIndex) -> Vec<String> {
        let mut available = Vec::new();

        if let Some(ordinal) = parse_node_id(&self.latest_main).ordinal {
            if let Some(rule) = index.main_at(ordinal) {
                if !self.reached.contains(&rule.node)
                    && is_unlocked(index, &rule.node, &self.reached)
                {
                    available.push(rule.node.clone());
                }
            }
        }

        for (character, pointer) in &self.latest_arcs {
            if let Some(ordinal) = parse_node_id(pointer).ordinal {
                if let Some(rule) = index.arc_at(character, ordinal) {
                    if !self.reached.contains(&rule.node)
                        && is_unlocked(index, &rule.node, &self.reached)
                    {
                        available.push(rule.node.clone());
                    }
                }
            }
        }

        available
    }

    /// Pointer nodes whose rule places them in `scene_id` and which are
    /// currently unlocked. A pointer without a rule record has no scene
    /// to appear in and is skipped.
    pub fn latest_story_parts_in_scene<'a>(
        &self,
        scene_id: &str,
        index: &'a RuleIndex,
    ) -> Vec<SceneStoryPart<'a>> {
        let mut parts = Vec::new();

        if let Some(rule) = index.rule(&self.latest_main) {
            if rule.starting_scene == scene_id
                && is_unlocked(index, &rule.node, &self.reached)
            {
                parts.push(SceneStoryPart {
                    kind: MarkerKind::Main,
                    rule,
                });
            }
        }

        for pointer in self.latest_arcs.values() {
            if let Some(rule) = index.rule(pointer) {
                if rule.starting_scene == scene_id
                    && is_unlocked(index, &rule.node, &self.reached)
                {
                    parts.push(SceneStoryPart {
                        kind: MarkerKind::CharacterArc,
                        rule,
                    });
                }
            }
        }

        parts
    }

    /// Uniform pick among the unlocked random-pool nodes of `group`.
    /// Falls back to the group's ordinal-0 id when nothing is unlocked.
    pub fn select_random_dialogue<R: Rng>(
        &self,
        group: &str,
        index: &RuleIndex,
        rng: &mut R,
    ) -> String {
        let unlocked: Vec<&str> = index
            .random_group(group)
            .filter(|rule| is_unlocked(index, &rule.node, &self.reached))
            .map(|rule| rule.node.as_str())
            .collect();

        match unlocked.choose(rng) {
            Some(node) => node.to_string(),
            None => Track::Random {
                group: group.to_string(),
            }
            .id_at(0),
        }
    }
}

/// Pre-advance guard: a pointer only moves to a strictly higher ordinal.
/// An unset pointer always accepts; a pointer whose ordinal cannot be
/// parsed is never replaced.
fn pointer_advances(current: Option<&str>, target_ordinal: u32) -> bool {
    match current {
        None => true,
        Some(id) if id.is_empty() => true,
        Some(id) => match parse_node_id(id).ordinal {
            Some(current_ordinal) => target_ordinal > current_ordinal,
            None => false,
        },
    }
}
