use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rand::Rng;
use serde::Deserialize;

use crate::expression::{face_sprite_name, pose_sprite_name, Face, Pose};
use crate::overlay::{Durability, ObjectUpdate};
use crate::scene_state::{ObjectSeed, Vec2};
use crate::session::{DialogueHost, GameSession};

/// A scripted scenario the CLI replays against a session: the same
/// call sequence a real host and dialogue engine would issue, authored
/// as data so runs are reproducible.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playbook {
    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Step {
    EnterScene {
        scene: String,
        #[serde(default)]
        objects: Vec<ObjectSeed>,
    },
    StartMain,
    StartArc {
        character: String,
    },
    StartRandom {
        group: String,
    },
    UpdateObject {
        object: String,
        #[serde(default)]
        image: Option<String>,
        #[serde(default)]
        position: Option<[f32; 2]>,
        /// Seconds for the move; omitted means the configured default,
        /// zero means instant.
        #[serde(default)]
        duration: Option<f32>,
        active: bool,
        #[serde(default)]
        permanent: bool,
    },
    /// Swap a portrait object to a numbered pose/face pair; out-of-range
    /// indices fall back to the Default variants.
    SetExpression {
        object: String,
        character: String,
        #[serde(default)]
        pose: u8,
        #[serde(default)]
        face: u8,
        #[serde(default = "default_true")]
        active: bool,
    },
    Tick {
        seconds: f32,
    },
    FinishAnimations,
    EndUnit,
    /// Record a completion directly, without a unit having played.
    Reach {
        node: String,
    },
}

fn default_true() -> bool {
    true
}

pub fn load_playbook(path: &Path) -> Result<Playbook> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read playbook: {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse playbook json: {}", path.display()))
}

/// Replays every step in order. Directive failures abort the run with
/// the step index attached, mirroring how a live host would surface
/// them.
pub fn run_playbook<R: Rng>(
    session: &mut GameSession,
    playbook: &Playbook,
    host: &mut dyn DialogueHost,
    rng: &mut R,
) -> Result<()> {
    for (step_index, step) in playbook.steps.iter().enumerate() {
        apply_step(session, step, host, rng)
            .with_context(|| format!("playbook step {step_index} failed"))?;
    }
    Ok(())
}

fn apply_step<R: Rng>(
    session: &mut GameSession,
    step: &Step,
    host: &mut dyn DialogueHost,
    rng: &mut R,
) -> Result<()> {
    match step {
        Step::EnterScene { scene, objects } => {
            session.enter_scene(scene, objects);
        }
        Step::StartMain => {
            session.start_main(host)?;
        }
        Step::StartArc { character } => {
            session.start_character_arc(character, host)?;
        }
        Step::StartRandom { group } => {
            session.start_random(group, host, rng)?;
        }
        Step::UpdateObject {
            object,
            image,
            position,
            duration,
            active,
            permanent,
        } => {
            let duration_seconds =
                duration.unwrap_or(session.config().default_transition_seconds);
            session.update_object(
                object,
                ObjectUpdate {
                    image_ref: image.clone(),
                    position: position.map(|[x, y]| Vec2::new(x, y)),
                    duration_seconds,
                    active: *active,
                    durability: if *permanent {
                        Durability::Permanent
                    } else {
                        Durability::Temporary
                    },
                },
            )?;
        }
        Step::SetExpression {
            object,
            character,
            pose,
            face,
            active,
        } => {
            let pose_name = pose_sprite_name(character, Pose::from_index(*pose));
            session.update_object(
                object,
                ObjectUpdate {
                    image_ref: Some(pose_name),
                    position: None,
                    duration_seconds: 0.0,
                    active: *active,
                    durability: Durability::Temporary,
                },
            )?;
            let face_name = face_sprite_name(character, Face::from_index(*face));
            session.update_object(
                object,
                ObjectUpdate {
                    image_ref: Some(face_name),
                    position: None,
                    duration_seconds: 0.0,
                    active: *active,
                    durability: Durability::Temporary,
                },
            )?;
        }
        Step::Tick { seconds } => {
            session.advance(*seconds);
        }
        Step::FinishAnimations => {
            session.finish_all_animations_immediately();
        }
        Step::EndUnit => {
            session.unit_ended()?;
        }
        Step::Reach { node } => {
            session.reach_state(node)?;
        }
    }
    Ok(())
}
