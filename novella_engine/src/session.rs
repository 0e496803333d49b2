use std::collections::BTreeMap;

use anyhow::{bail, Result};
use rand::Rng;
use serde::Serialize;

use novella_rules::RuleIndex;

use crate::assets::AssetCatalog;
use crate::config::GameConfig;
use crate::overlay::{DirectiveError, ObjectUpdate, OverlayManager, ReconcileSummary};
use crate::progression::{ProgressionTracker, ReachOutcome, SceneStoryPart};
use crate::save::{
    CharacterArcEntry, LoadOutcome, ObjectDetailsEntry, PersistenceGateway, SaveRecord,
    SceneObjectsEntry,
};
use crate::scene_state::{ObjectSeed, ObjectState, SceneStateStore};

/// The external dialogue-playback engine, as the core sees it: it gets
/// told which unit to start and later raises `unit_ended` on the
/// session. The core never parses or renders dialogue text.
pub trait DialogueHost {
    fn start_unit(&mut self, node_id: &str) -> Result<()>;
}

/// Stand-in host that records which units were requested; used by the
/// scripted CLI runs and by tests.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub started: Vec<String>,
}

impl DialogueHost for RecordingHost {
    fn start_unit(&mut self, node_id: &str) -> Result<()> {
        self.started.push(node_id.to_string());
        Ok(())
    }
}

/// Scene-completion observer. Invocation order is fixed and documented:
/// `scene_reconciled` fires after overlay reconciliation and before the
/// progression commit; `scene_committed` fires after the reached-state
/// update and save have both completed.
pub trait SceneEndListener {
    fn scene_reconciled(&mut self, _scene_id: &str) {}
    fn scene_committed(&mut self, _scene_id: &str, _node_id: &str) {}
}

/// What one scene completion did.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitEndSummary {
    pub node: String,
    pub reconcile: ReconcileSummary,
    pub outcome: ReachOutcome,
    pub saved: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub current_scene: String,
    pub active_unit: Option<String>,
    pub latest_main_story: String,
    pub latest_character_arcs: BTreeMap<String, String>,
    pub reached_states: Vec<String>,
    pub object_states: BTreeMap<String, ObjectState>,
}

/// Owns every engine component and wires them together explicitly; this
/// is the only mutation surface the host and the dialogue engine see.
pub struct GameSession {
    config: GameConfig,
    index: RuleIndex,
    tracker: ProgressionTracker,
    store: SceneStateStore,
    overlay: OverlayManager,
    gateway: PersistenceGateway,
    assets: Box<dyn AssetCatalog>,
    listeners: Vec<Box<dyn SceneEndListener>>,
    current_scene: String,
    active_unit: Option<String>,
    events: Vec<String>,
}

impl GameSession {
    /// Builds a session from its collaborators and the save file (or a
    /// fresh start when there is none).
    pub fn new(
        config: GameConfig,
        index: RuleIndex,
        gateway: PersistenceGateway,
        assets: Box<dyn AssetCatalog>,
    ) -> Self {
        let (record, outcome) = gateway.load(&config);
        let mut events = Vec::new();
        events.push(format!(
            "save.load {}",
            match outcome {
                LoadOutcome::FreshStart => "fresh",
                LoadOutcome::Loaded => "loaded",
                LoadOutcome::RecoveredCorrupt => "recovered-corrupt",
            }
        ));

        let tracker = ProgressionTracker::new(
            record.reached_states.iter().cloned().collect(),
            record.latest_main_story.clone(),
            record.arc_map(),
        );
        let store = SceneStateStore::from_parts(record.registry_map(), record.object_map());
        let current_scene = record.current_scene.clone();

        GameSession {
            config,
            index,
            tracker,
            store,
            overlay: OverlayManager::new(),
            gateway,
            assets,
            listeners: Vec::new(),
            current_scene,
            active_unit: None,
            events,
        }
    }

    pub fn add_listener(&mut self, listener: Box<dyn SceneEndListener>) {
        self.listeners.push(listener);
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn current_scene(&self) -> &str {
        &self.current_scene
    }

    pub fn events(&self) -> &[String] {
        &self.events
    }

    pub fn latest_main_node(&self) -> &str {
        self.tracker.latest_main_node()
    }

    pub fn latest_character_arc_node(&self, character: &str) -> Option<&str> {
        self.tracker.latest_character_arc_node(character)
    }

    pub fn is_node_unlocked(&self, node_id: &str) -> bool {
        self.tracker.is_node_unlocked(node_id, &self.index)
    }

    pub fn latest_story_parts_in_scene(&self, scene_id: &str) -> Vec<SceneStoryPart<'_>> {
        self.tracker.latest_story_parts_in_scene(scene_id, &self.index)
    }

    pub fn select_random_dialogue<R: Rng>(&self, group: &str, rng: &mut R) -> String {
        self.tracker.select_random_dialogue(group, &self.index, rng)
    }

    pub fn live_object(&self, object_id: &str) -> Option<&ObjectState> {
        self.overlay.live(object_id)
    }

    pub fn committed_object(&self, object_id: &str) -> Option<&ObjectState> {
        self.store.committed(object_id)
    }

    /// Makes `scene_id` the active scene: captures its object snapshot
    /// on the first ever visit, then seeds the overlay's working view
    /// from the committed store.
    pub fn enter_scene(&mut self, scene_id: &str, present: &[ObjectSeed]) {
        if self.store.capture_if_first_visit(scene_id, present) {
            self.events
                .push(format!("scene.capture {scene_id} {}", present.len()));
        }
        self.current_scene = scene_id.to_string();
        let ids: Vec<String> = self.store.objects_in_scene(scene_id).to_vec();
        self.overlay.begin_scene(&ids, &self.store);
        self.events.push(format!("scene.enter {scene_id}"));
    }

    /// Starts the main-track unit the pointer currently names.
    pub fn start_main(&mut self, host: &mut dyn DialogueHost) -> Result<String> {
        let node = self.tracker.latest_main_node().to_string();
        self.begin_unit(node, host)
    }

    /// Starts the arc unit the character's pointer currently names.
    pub fn start_character_arc(
        &mut self,
        character: &str,
        host: &mut dyn DialogueHost,
    ) -> Result<String> {
        let Some(node) = self.tracker.latest_character_arc_node(character) else {
            bail!("no character arc tracked for {character}");
        };
        let node = node.to_string();
        self.begin_unit(node, host)
    }

    /// Starts a random-pool unit for `group`.
    pub fn start_random<R: Rng>(
        &mut self,
        group: &str,
        host: &mut dyn DialogueHost,
        rng: &mut R,
    ) -> Result<String> {
        let node = self.tracker.select_random_dialogue(group, &self.index, rng);
        self.begin_unit(node, host)
    }

    fn begin_unit(&mut self, node: String, host: &mut dyn DialogueHost) -> Result<String> {
        if let Some(active) = self.active_unit.as_ref() {
            bail!("unit {active} is already running");
        }
        host.start_unit(&node)?;
        self.events.push(format!("unit.start {node}"));
        self.active_unit = Some(node.clone());
        Ok(node)
    }

    /// Dialogue-side directive against an interactive object in the
    /// active scene. Referential failures surface to the caller and
    /// leave shared state untouched.
    pub fn update_object(
        &mut self,
        object_id: &str,
        update: ObjectUpdate,
    ) -> Result<(), DirectiveError> {
        self.overlay
            .update_object(object_id, update, self.assets.as_ref(), &mut self.events)
    }

    /// One cooperative tick for in-flight transitions.
    pub fn advance(&mut self, delta_seconds: f32) {
        self.overlay.advance(delta_seconds, &mut self.events);
    }

    /// Snap-cancels every in-flight transition, e.g. when the player
    /// skips ahead before a move finishes.
    pub fn finish_all_animations_immediately(&mut self) {
        self.overlay.finish_all_animations_immediately(&mut self.events);
    }

    /// Direct completion record from the host, outside the scene-end
    /// path (e.g. a scripted skip). Persists on success like any other
    /// completion; a duplicate is a no-op and writes nothing.
    pub fn reach_state(&mut self, node_id: &str) -> Result<ReachOutcome> {
        let (outcome, _) = self.commit_reached(node_id)?;
        Ok(outcome)
    }

    /// The dialogue engine finished the active unit. Runs the strict,
    /// non-interleavable completion sequence: overlay reconciliation,
    /// then the progression commit, then the save, in that order, so an
    /// interruption can never persist an unlock without its world state
    /// or the reverse.
    pub fn unit_ended(&mut self) -> Result<UnitEndSummary> {
        let Some(node) = self.active_unit.take() else {
            bail!("unit_ended raised with no active unit");
        };

        let reconcile = self
            .overlay
            .reconcile_scene_end(&mut self.store, &mut self.events);
        for listener in &mut self.listeners {
            listener.scene_reconciled(&self.current_scene);
        }

        let (outcome, saved) = self.commit_reached(&node)?;

        for listener in &mut self.listeners {
            listener.scene_committed(&self.current_scene, &node);
        }

        Ok(UnitEndSummary {
            node,
            reconcile,
            outcome,
            saved,
        })
    }

    fn commit_reached(&mut self, node_id: &str) -> Result<(ReachOutcome, bool)> {
        let outcome = self.tracker.reach_state(node_id, &self.index, &mut self.events);
        let saved = matches!(outcome, ReachOutcome::Recorded { .. });
        if saved {
            let record = self.save_record();
            self.gateway.save(&record)?;
            self.events
                .push(format!("save.write {}", self.gateway.path().display()));
        }
        Ok((outcome, saved))
    }

    pub fn save_record(&self) -> SaveRecord {
        SaveRecord {
            reached_states: self.tracker.reached_sorted(),
            latest_main_story: self.tracker.latest_main_node().to_string(),
            latest_character_arcs: self
                .tracker
                .character_arcs()
                .iter()
                .map(|(character, node)| CharacterArcEntry {
                    character: character.clone(),
                    node: node.clone(),
                })
                .collect(),
            current_scene: self.current_scene.clone(),
            scene_name_to_game_objects_list: self
                .store
                .registry()
                .iter()
                .map(|(scene_id, object_ids)| SceneObjectsEntry {
                    scene_id: scene_id.clone(),
                    object_ids: object_ids.clone(),
                })
                .collect(),
            game_object_details: self
                .store
                .objects()
                .iter()
                .map(|(object_id, state)| ObjectDetailsEntry {
                    object_id: object_id.clone(),
                    image_ref: state.image_ref.clone(),
                    position: state.position,
                    active: state.active,
                })
                .collect(),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            current_scene: self.current_scene.clone(),
            active_unit: self.active_unit.clone(),
            latest_main_story: self.tracker.latest_main_node().to_string(),
            latest_character_arcs: self.tracker.character_arcs().clone(),
            reached_states: self.tracker.reached_sorted(),
            object_states: self.store.objects().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{GameSession, RecordingHost, SceneEndListener};
    use crate::assets::PermissiveAssets;
    use crate::config::GameConfig;
    use crate::overlay::{Durability, ObjectUpdate};
    use crate::save::PersistenceGateway;
    use crate::scene_state::{ObjectSeed, ObjectState, Vec2};
    use novella_rules::{RuleIndex, UnlockRule};
    use std::path::Path;

    fn rule(node: &str, scene: &str) -> UnlockRule {
        UnlockRule {
            node: node.to_string(),
            starting_scene: scene.to_string(),
            ..UnlockRule::default()
        }
    }

    fn classroom_rules() -> Vec<UnlockRule> {
        vec![
            rule("M00", "5E_Classroom"),
            rule("M01", "5E_Classroom"),
            rule("M02", "Rooftop"),
        ]
    }

    fn session_at(save_path: &Path) -> GameSession {
        GameSession::new(
            GameConfig::default(),
            RuleIndex::build(classroom_rules()),
            PersistenceGateway::new(save_path),
            Box::new(PermissiveAssets),
        )
    }

    fn seed(id: &str) -> ObjectSeed {
        ObjectSeed {
            id: id.to_string(),
            state: ObjectState {
                image_ref: format!("{id}_Default"),
                position: Vec2::ZERO,
                active: true,
            },
        }
    }

    fn deactivate(durability: Durability) -> ObjectUpdate {
        ObjectUpdate {
            image_ref: None,
            position: None,
            duration_seconds: 0.0,
            active: false,
            durability,
        }
    }

    #[test]
    fn completing_main_advances_and_persists() {
        let dir = tempfile::tempdir().expect("tempdir");
        let save_path = dir.path().join("progression_save.json");
        let mut host = RecordingHost::default();

        let mut session = session_at(&save_path);
        session.enter_scene("5E_Classroom", &[seed("Door")]);
        session.start_main(&mut host).expect("start");
        assert_eq!(host.started, vec!["M00".to_string()]);

        let summary = session.unit_ended().expect("end");
        assert!(summary.saved);
        assert_eq!(session.latest_main_node(), "M01");

        // A second session over the same save file resumes from disk.
        let resumed = session_at(&save_path);
        assert_eq!(resumed.latest_main_node(), "M01");
        assert!(resumed.is_node_unlocked("M01"));
    }

    #[test]
    fn duplicate_completion_does_not_rewrite_the_save() {
        let dir = tempfile::tempdir().expect("tempdir");
        let save_path = dir.path().join("progression_save.json");
        let mut host = RecordingHost::default();

        let mut session = session_at(&save_path);
        session.enter_scene("5E_Classroom", &[seed("Door")]);
        session.start_main(&mut host).expect("start");
        session.unit_ended().expect("end");

        // Force the same node through again.
        session.active_unit_for_tests("M00");
        let summary = session.unit_ended().expect("end again");
        assert!(!summary.saved);
        assert_eq!(session.latest_main_node(), "M01");
    }

    #[test]
    fn scene_end_restores_temporary_and_persists_permanent() {
        // A permanent Door deactivation survives a reload; a
        // temporary Window deactivation does not.
        let dir = tempfile::tempdir().expect("tempdir");
        let save_path = dir.path().join("progression_save.json");
        let mut host = RecordingHost::default();

        let mut session = session_at(&save_path);
        session.enter_scene("5E_Classroom", &[seed("Door"), seed("Window")]);
        session.start_main(&mut host).expect("start");

        session
            .update_object("Door", deactivate(Durability::Permanent))
            .expect("door");
        session
            .update_object("Window", deactivate(Durability::Temporary))
            .expect("window");
        session.unit_ended().expect("end");

        assert!(!session.committed_object("Door").expect("door").active);
        assert!(session.committed_object("Window").expect("window").active);

        // Leave and come back: the scene is not recaptured, and the
        // permanent change is what loads.
        let mut reloaded = session_at(&save_path);
        reloaded.enter_scene("5E_Classroom", &[seed("Door"), seed("Window")]);
        assert!(!reloaded.live_object("Door").expect("door").active);
        assert!(reloaded.live_object("Window").expect("window").active);
    }

    #[test]
    fn listeners_fire_in_documented_order() {
        #[derive(Default)]
        struct OrderProbe(std::rc::Rc<std::cell::RefCell<Vec<&'static str>>>);
        impl SceneEndListener for OrderProbe {
            fn scene_reconciled(&mut self, _scene: &str) {
                self.0.borrow_mut().push("reconciled");
            }
            fn scene_committed(&mut self, _scene: &str, _node: &str) {
                self.0.borrow_mut().push("committed");
            }
        }

        let dir = tempfile::tempdir().expect("tempdir");
        let save_path = dir.path().join("progression_save.json");
        let mut host = RecordingHost::default();
        let calls = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));

        let mut session = session_at(&save_path);
        session.add_listener(Box::new(OrderProbe(calls.clone())));
        session.enter_scene("5E_Classroom", &[seed("Door")]);
        session.start_main(&mut host).expect("start");
        session.unit_ended().expect("end");

        assert_eq!(*calls.borrow(), vec!["reconciled", "committed"]);
    }

    #[test]
    fn unit_ended_without_active_unit_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = session_at(&dir.path().join("progression_save.json"));
        assert!(session.unit_ended().is_err());
    }

    #[test]
    fn story_parts_follow_the_pointer_between_scenes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let save_path = dir.path().join("progression_save.json");
        let mut host = RecordingHost::default();

        let mut session = session_at(&save_path);
        session.enter_scene("5E_Classroom", &[seed("Door")]);
        assert_eq!(
            session
                .latest_story_parts_in_scene("5E_Classroom")
                .iter()
                .map(|p| p.rule.node.as_str())
                .collect::<Vec<_>>(),
            vec!["M00"]
        );

        session.start_main(&mut host).expect("start");
        session.unit_ended().expect("end");
        session.start_main(&mut host).expect("start M01");
        session.unit_ended().expect("end M01");

        // M02 lives on the rooftop now.
        assert!(session.latest_story_parts_in_scene("5E_Classroom").is_empty());
        assert_eq!(
            session
                .latest_story_parts_in_scene("Rooftop")
                .iter()
                .map(|p| p.rule.node.as_str())
                .collect::<Vec<_>>(),
            vec!["M02"]
        );
    }

    impl GameSession {
        fn active_unit_for_tests(&mut self, node: &str) {
            self.active_unit = Some(node.to_string());
        }
    }
}
