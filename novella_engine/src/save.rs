use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::scene_state::{ObjectState, Vec2};

/// The single persisted aggregate. The schema is additive: every
/// collection defaults to empty so saves written by older builds load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaveRecord {
    pub reached_states: Vec<String>,
    pub latest_main_story: String,
    pub latest_character_arcs: Vec<CharacterArcEntry>,
    pub current_scene: String,
    pub scene_name_to_game_objects_list: Vec<SceneObjectsEntry>,
    pub game_object_details: Vec<ObjectDetailsEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CharacterArcEntry {
    pub character: String,
    pub node: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SceneObjectsEntry {
    pub scene_id: String,
    pub object_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDetailsEntry {
    pub object_id: String,
    pub image_ref: String,
    pub position: Vec2,
    pub active: bool,
}

impl SaveRecord {
    /// The record a brand-new game starts from.
    pub fn fresh(config: &GameConfig) -> Self {
        SaveRecord {
            latest_main_story: config.starting_main_node.clone(),
            current_scene: config.new_game_first_scene.clone(),
            ..SaveRecord::default()
        }
    }

    pub fn arc_map(&self) -> BTreeMap<String, String> {
        self.latest_character_arcs
            .iter()
            .map(|entry| (entry.character.clone(), entry.node.clone()))
            .collect()
    }

    pub fn registry_map(&self) -> BTreeMap<String, Vec<String>> {
        self.scene_name_to_game_objects_list
            .iter()
            .map(|entry| (entry.scene_id.clone(), entry.object_ids.clone()))
            .collect()
    }

    pub fn object_map(&self) -> BTreeMap<String, ObjectState> {
        self.game_object_details
            .iter()
            .map(|entry| {
                (
                    entry.object_id.clone(),
                    ObjectState {
                        image_ref: entry.image_ref.clone(),
                        position: entry.position,
                        active: entry.active,
                    },
                )
            })
            .collect()
    }
}

/// How `load` actually produced its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No save file existed; this is a new game.
    FreshStart,
    Loaded,
    /// A file existed but could not be read or parsed; the engine
    /// falls back to a fresh start instead of propagating the failure.
    RecoveredCorrupt,
}

/// Sole owner of the save file. Everything durable funnels through the
/// one `save` call; there are no partial writes.
#[derive(Debug, Clone)]
pub struct PersistenceGateway {
    path: PathBuf,
}

impl PersistenceGateway {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PersistenceGateway { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self, config: &GameConfig) -> (SaveRecord, LoadOutcome) {
        if !self.path.exists() {
            return (SaveRecord::fresh(config), LoadOutcome::FreshStart);
        }

        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return (SaveRecord::fresh(config), LoadOutcome::RecoveredCorrupt),
        };
        match serde_json::from_str::<SaveRecord>(&raw) {
            Ok(record) => (record, LoadOutcome::Loaded),
            Err(_) => (SaveRecord::fresh(config), LoadOutcome::RecoveredCorrupt),
        }
    }

    /// Serializes the whole record and replaces the save file in one
    /// rename, so an interrupted write can never leave a torn save.
    pub fn save(&self, record: &SaveRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create save directory: {}", parent.display())
                })?;
            }
        }

        let serialized = serde_json::to_string_pretty(record)
            .with_context(|| format!("failed to serialize save: {}", self.path.display()))?;

        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, serialized)
            .with_context(|| format!("failed to write save staging file: {}", staging.display()))?;
        fs::rename(&staging, &self.path).with_context(|| {
            format!("failed to move save into place: {}", self.path.display())
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{LoadOutcome, PersistenceGateway, SaveRecord};
    use crate::config::GameConfig;

    #[test]
    fn missing_file_is_a_fresh_start() {
        let dir = tempfile::tempdir().expect("tempdir");
        let gateway = PersistenceGateway::new(dir.path().join("progression_save.json"));
        let config = GameConfig::default();

        let (record, outcome) = gateway.load(&config);
        assert_eq!(outcome, LoadOutcome::FreshStart);
        assert_eq!(record.latest_main_story, "M00");
        assert_eq!(record.current_scene, "5E_Classroom");
        assert!(record.reached_states.is_empty());
    }

    #[test]
    fn corrupt_file_recovers_to_fresh_start() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("progression_save.json");
        std::fs::write(&path, "{definitely not json").expect("write");
        let gateway = PersistenceGateway::new(&path);

        let (record, outcome) = gateway.load(&GameConfig::default());
        assert_eq!(outcome, LoadOutcome::RecoveredCorrupt);
        assert!(record.reached_states.is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let gateway = PersistenceGateway::new(dir.path().join("progression_save.json"));

        let mut record = SaveRecord::fresh(&GameConfig::default());
        record.reached_states = vec!["C00_Amy".to_string(), "M00".to_string()];
        record.latest_main_story = "M01".to_string();
        record.current_scene = "Rooftop".to_string();

        gateway.save(&record).expect("save");
        let (loaded, outcome) = gateway.load(&GameConfig::default());
        assert_eq!(outcome, LoadOutcome::Loaded);
        assert_eq!(loaded, record);

        // No staging leftovers after a successful save.
        assert!(!dir.path().join("progression_save.json.tmp").exists());
    }

    #[test]
    fn old_saves_without_scene_collections_still_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("progression_save.json");
        std::fs::write(
            &path,
            r#"{"reachedStates":["M00"],"latestMainStory":"M01","latestCharacterArcs":[]}"#,
        )
        .expect("write");

        let gateway = PersistenceGateway::new(&path);
        let (record, outcome) = gateway.load(&GameConfig::default());
        assert_eq!(outcome, LoadOutcome::Loaded);
        assert_eq!(record.latest_main_story, "M01");
        assert!(record.scene_name_to_game_objects_list.is_empty());
        assert!(record.game_object_details.is_empty());
        assert!(record.current_scene.is_empty());
    }
}
