use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Tunables the engine host is constructed with. Defaults mirror the
/// shipped game; a JSON file can override any subset of fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameConfig {
    /// Main-track node a brand-new save points at.
    pub starting_main_node: String,
    /// Scene a brand-new save opens in.
    pub new_game_first_scene: String,
    /// Transition length used when a directive does not pass one.
    pub default_transition_seconds: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            starting_main_node: "M00".to_string(),
            new_game_first_scene: "5E_Classroom".to_string(),
            default_transition_seconds: 0.5,
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<GameConfig> {
    let Some(path) = path else {
        return Ok(GameConfig::default());
    };

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse config json: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::{load_config, GameConfig};

    #[test]
    fn absent_path_yields_defaults() {
        let config = load_config(None).expect("defaults");
        assert_eq!(config.starting_main_node, "M00");
        assert_eq!(config.new_game_first_scene, "5E_Classroom");
    }

    #[test]
    fn partial_override_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"startingMainNode":"M10"}"#).expect("write");

        let config = load_config(Some(&path)).expect("load");
        assert_eq!(config.starting_main_node, "M10");
        assert_eq!(
            config.new_game_first_scene,
            GameConfig::default().new_game_first_scene
        );
    }
}
