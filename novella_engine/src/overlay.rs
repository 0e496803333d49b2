use std::collections::BTreeMap;

use thiserror::Error;

use crate::assets::AssetCatalog;
use crate::scene_state::{ObjectState, SceneStateStore, Vec2};

#[derive(Debug, Error, PartialEq)]
pub enum DirectiveError {
    #[error("unknown object id: {0}")]
    UnknownObject(String),
}

/// Whether an object mutation survives the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Durability {
    Temporary,
    Permanent,
}

/// One directive against an object: image and active flag apply
/// immediately; a non-zero position with a positive duration drives a
/// tick-driven transition instead of an instant move.
#[derive(Debug, Clone)]
pub struct ObjectUpdate {
    pub image_ref: Option<String>,
    pub position: Option<Vec2>,
    pub duration_seconds: f32,
    pub active: bool,
    pub durability: Durability,
}

#[derive(Debug, Clone)]
struct Transition {
    from: Vec2,
    target: Vec2,
    duration: f32,
    elapsed: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub snapped: usize,
    pub restored: usize,
    pub committed: usize,
}

/// Working object state for the active scene.
///
/// `live` mirrors what the presentation layer currently shows. The
/// `temporary` and `permanent` sets record the target state of every
/// directive issued this scene; reconciliation at scene end restores
/// temporaries from the committed store and writes permanents back,
/// permanent winning when both touched the same object.
#[derive(Debug, Default)]
pub struct OverlayManager {
    live: BTreeMap<String, ObjectState>,
    temporary: BTreeMap<String, ObjectState>,
    permanent: BTreeMap<String, ObjectState>,
    transitions: BTreeMap<String, Transition>,
}

impl OverlayManager {
    pub fn new() -> Self {
        OverlayManager::default()
    }

    /// Seeds the live view from the committed store when a scene starts.
    /// Any leftovers from a previous scene are dropped.
    pub fn begin_scene(&mut self, object_ids: &[String], store: &SceneStateStore) {
        self.live.clear();
        self.temporary.clear();
        self.permanent.clear();
        self.transitions.clear();

        for id in object_ids {
            if let Some(state) = store.committed(id) {
                self.live.insert(id.clone(), state.clone());
            }
        }
    }

    pub fn live(&self, object_id: &str) -> Option<&ObjectState> {
        self.live.get(object_id)
    }

    pub fn live_states(&self) -> &BTreeMap<String, ObjectState> {
        &self.live
    }

    pub fn has_transition(&self, object_id: &str) -> bool {
        self.transitions.contains_key(object_id)
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    pub fn pending_temporary(&self) -> usize {
        self.temporary.len()
    }

    pub fn pending_permanent(&self) -> usize {
        self.permanent.len()
    }

    /// Applies a dialogue-side directive to `object_id`.
    ///
    /// Unknown ids fail the directive without touching shared state. A
    /// missing image asset skips only the image change and logs it; the
    /// position/active parts still apply.
    pub fn update_object(
        &mut self,
        object_id: &str,
        update: ObjectUpdate,
        assets: &dyn AssetCatalog,
        events: &mut Vec<String>,
    ) -> Result<(), DirectiveError> {
        let Some(state) = self.live.get_mut(object_id) else {
            return Err(DirectiveError::UnknownObject(object_id.to_string()));
        };

        if let Some(image_ref) = update.image_ref.as_ref() {
            if assets.has_image(image_ref) {
                state.image_ref = image_ref.clone();
            } else {
                events.push(format!("overlay.image-missing {object_id} {image_ref}"));
            }
        }

        state.active = update.active;

        // A zero vector doubles as "no movement" in authored directives.
        let movement = update.position.filter(|pos| *pos != Vec2::ZERO);
        if let Some(target) = movement {
            if update.duration_seconds <= 0.0 {
                state.position = target;
            } else {
                // Transitions never queue: an in-flight one snaps to its
                // target before the new one starts.
                if let Some(previous) = self.transitions.remove(object_id) {
                    state.position = previous.target;
                    events.push(format!("transition.snap {object_id}"));
                }
                self.transitions.insert(
                    object_id.to_string(),
                    Transition {
                        from: state.position,
                        target,
                        duration: update.duration_seconds,
                        elapsed: 0.0,
                    },
                );
                events.push(format!("transition.start {object_id}"));
            }
        }

        // Record the eventual state the directive lands on, so scene-end
        // reconciliation sees targets rather than mid-flight positions.
        let mut recorded = state.clone();
        if let Some(target) = movement {
            recorded.position = target;
        }
        let label = match update.durability {
            Durability::Temporary => {
                self.temporary.insert(object_id.to_string(), recorded);
                "temporary"
            }
            Durability::Permanent => {
                self.permanent.insert(object_id.to_string(), recorded);
                "permanent"
            }
        };
        events.push(format!("overlay.update {object_id} {label}"));

        Ok(())
    }

    /// Advances every in-flight transition by `delta_seconds`.
    pub fn advance(&mut self, delta_seconds: f32, events: &mut Vec<String>) {
        let mut finished = Vec::new();

        for (id, transition) in self.transitions.iter_mut() {
            transition.elapsed += delta_seconds;
            let t = transition.elapsed / transition.duration;
            let position = transition.from.lerp(transition.target, t);
            if let Some(state) = self.live.get_mut(id) {
                state.position = position;
            }
            if transition.elapsed >= transition.duration {
                finished.push(id.clone());
            }
        }

        for id in finished {
            self.transitions.remove(&id);
            events.push(format!("transition.done {id}"));
        }
    }

    /// Snaps every in-flight transition straight to its target and
    /// discards it. This is cancellation: there is no partially-complete
    /// state left behind.
    pub fn finish_all_animations_immediately(&mut self, events: &mut Vec<String>) -> usize {
        let snapped = self.transitions.len();
        for (id, transition) in std::mem::take(&mut self.transitions) {
            if let Some(state) = self.live.get_mut(&id) {
                state.position = transition.target;
            }
            events.push(format!("transition.snap {id}"));
        }
        snapped
    }

    /// Scene-end reconciliation, in this exact order: snap transitions,
    /// restore every temporary from the committed store, then write
    /// every permanent back (permanent wins on overlap). Both working
    /// sets are cleared afterwards.
    pub fn reconcile_scene_end(
        &mut self,
        store: &mut SceneStateStore,
        events: &mut Vec<String>,
    ) -> ReconcileSummary {
        let snapped = self.finish_all_animations_immediately(events);

        let mut restored = 0;
        for id in self.temporary.keys() {
            if let Some(committed) = store.committed(id) {
                self.live.insert(id.clone(), committed.clone());
                events.push(format!("overlay.restore {id}"));
                restored += 1;
            }
        }

        let mut committed = 0;
        for (id, state) in &self.permanent {
            store.commit(id, state.clone());
            self.live.insert(id.clone(), state.clone());
            events.push(format!("overlay.commit {id}"));
            committed += 1;
        }

        self.temporary.clear();
        self.permanent.clear();

        ReconcileSummary {
            snapped,
            restored,
            committed,
        }
    }
}
