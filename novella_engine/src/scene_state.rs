use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }

    pub fn lerp(self, target: Vec2, t: f32) -> Vec2 {
        let t = t.clamp(0.0, 1.0);
        Vec2 {
            x: self.x + (target.x - self.x) * t,
            y: self.y + (target.y - self.y) * t,
        }
    }
}

/// Persisted visual state of one interactive object, independent of
/// which scene currently displays it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectState {
    pub image_ref: String,
    pub position: Vec2,
    pub active: bool,
}

/// An object as the host sees it when a scene is entered; used to seed
/// the first-visit snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSeed {
    pub id: String,
    #[serde(flatten)]
    pub state: ObjectState,
}

/// Durable scene/object registry: which objects belong to which scene,
/// and the last-committed state of each object.
#[derive(Debug, Clone, Default)]
pub struct SceneStateStore {
    registry: BTreeMap<String, Vec<String>>,
    objects: BTreeMap<String, ObjectState>,
}

impl SceneStateStore {
    pub fn new() -> Self {
        SceneStateStore::default()
    }

    pub fn from_parts(
        registry: BTreeMap<String, Vec<String>>,
        objects: BTreeMap<String, ObjectState>,
    ) -> Self {
        SceneStateStore { registry, objects }
    }

    /// Registers `scene_id` and snapshots the presented objects, once.
    ///
    /// Returns `true` when this call captured the scene. Later visits
    /// are no-ops: the first snapshot is authoritative. An object whose
    /// id is already committed (loaded from a save, or shared with an
    /// earlier scene) keeps its committed state.
    pub fn capture_if_first_visit(&mut self, scene_id: &str, present: &[ObjectSeed]) -> bool {
        if self.registry.contains_key(scene_id) {
            return false;
        }

        let ids: Vec<String> = present.iter().map(|seed| seed.id.clone()).collect();
        self.registry.insert(scene_id.to_string(), ids);
        for seed in present {
            self.objects
                .entry(seed.id.clone())
                .or_insert_with(|| seed.state.clone());
        }
        true
    }

    pub fn is_scene_registered(&self, scene_id: &str) -> bool {
        self.registry.contains_key(scene_id)
    }

    pub fn objects_in_scene(&self, scene_id: &str) -> &[String] {
        self.registry
            .get(scene_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn committed(&self, object_id: &str) -> Option<&ObjectState> {
        self.objects.get(object_id)
    }

    /// Writes a permanent mutation back; only the overlay reconcile
    /// step should call this.
    pub fn commit(&mut self, object_id: &str, state: ObjectState) {
        self.objects.insert(object_id.to_string(), state);
    }

    pub fn registry(&self) -> &BTreeMap<String, Vec<String>> {
        &self.registry
    }

    pub fn objects(&self) -> &BTreeMap<String, ObjectState> {
        &self.objects
    }
}

#[cfg(test)]
mod tests {
    use super::{ObjectSeed, ObjectState, SceneStateStore, Vec2};

    fn seed(id: &str, active: bool) -> ObjectSeed {
        ObjectSeed {
            id: id.to_string(),
            state: ObjectState {
                image_ref: format!("{id}_Default"),
                position: Vec2::new(1.0, 2.0),
                active,
            },
        }
    }

    #[test]
    fn first_visit_captures_scene_and_objects() {
        let mut store = SceneStateStore::new();
        let captured =
            store.capture_if_first_visit("5E_Classroom", &[seed("Door", true), seed("Desk", true)]);

        assert!(captured);
        assert_eq!(store.objects_in_scene("5E_Classroom"), ["Door", "Desk"]);
        assert!(store.committed("Door").expect("door").active);
    }

    #[test]
    fn later_visits_never_recapture() {
        let mut store = SceneStateStore::new();
        store.capture_if_first_visit("5E_Classroom", &[seed("Door", true)]);

        let mut altered = seed("Door", true).state;
        altered.active = false;
        store.commit("Door", altered);

        let recaptured = store.capture_if_first_visit("5E_Classroom", &[seed("Door", true)]);
        assert!(!recaptured);
        assert!(!store.committed("Door").expect("door").active);
    }

    #[test]
    fn shared_object_keeps_committed_state_across_scenes() {
        let mut store = SceneStateStore::new();
        store.capture_if_first_visit("5E_Classroom", &[seed("Bell", true)]);
        let mut rung = seed("Bell", true).state;
        rung.image_ref = "Bell_Rung".to_string();
        store.commit("Bell", rung);

        store.capture_if_first_visit("Hallway", &[seed("Bell", true)]);
        assert_eq!(
            store.committed("Bell").map(|s| s.image_ref.as_str()),
            Some("Bell_Rung")
        );
    }

    #[test]
    fn lerp_clamps_to_target() {
        let from = Vec2::ZERO;
        let to = Vec2::new(10.0, -4.0);
        assert_eq!(from.lerp(to, 0.5), Vec2::new(5.0, -2.0));
        assert_eq!(from.lerp(to, 1.5), to);
    }
}
