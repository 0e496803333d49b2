//! Character pose/face variants and their sprite-name composition.
//!
//! Dialogue directives address these by numeric id; the lookup is total,
//! with anything out of range resolving to `Default`.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Pose {
    #[default]
    Default,
    Confident,
    Reclusive,
    Thinking,
    Fighting,
}

impl Pose {
    pub fn from_index(index: u8) -> Self {
        match index {
            0 => Pose::Default,
            1 => Pose::Confident,
            2 => Pose::Reclusive,
            3 => Pose::Thinking,
            4 => Pose::Fighting,
            _ => Pose::Default,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Pose::Default => "Default",
            Pose::Confident => "Confident",
            Pose::Reclusive => "Reclusive",
            Pose::Thinking => "Thinking",
            Pose::Fighting => "Fighting",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Face {
    #[default]
    Default,
    Happy,
    Embarrassed,
    Angry,
    Sad,
    Surprised,
    Playful,
    Pouting,
}

impl Face {
    pub fn from_index(index: u8) -> Self {
        match index {
            0 => Face::Default,
            1 => Face::Happy,
            2 => Face::Embarrassed,
            3 => Face::Angry,
            4 => Face::Sad,
            5 => Face::Surprised,
            6 => Face::Playful,
            7 => Face::Pouting,
            _ => Face::Default,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Face::Default => "Default",
            Face::Happy => "Happy",
            Face::Embarrassed => "Embarrassed",
            Face::Angry => "Angry",
            Face::Sad => "Sad",
            Face::Surprised => "Surprised",
            Face::Playful => "Playful",
            Face::Pouting => "Pouting",
        }
    }
}

/// Sprite name for a character's pose layer, e.g. `Amy_Confident`.
pub fn pose_sprite_name(character: &str, pose: Pose) -> String {
    format!("{character}_{}", pose.name())
}

/// Sprite name for a character's face layer, e.g. `Amy_Happy`.
pub fn face_sprite_name(character: &str, face: Face) -> String {
    format!("{character}_{}", face.name())
}

#[cfg(test)]
mod tests {
    use super::{face_sprite_name, pose_sprite_name, Face, Pose};

    #[test]
    fn lookup_is_total_over_u8() {
        for index in 0..=u8::MAX {
            // Must never panic; out-of-range collapses to Default.
            let pose = Pose::from_index(index);
            let face = Face::from_index(index);
            if index > 7 {
                assert_eq!(face, Face::Default);
            }
            if index > 4 {
                assert_eq!(pose, Pose::Default);
            }
        }
    }

    #[test]
    fn known_indices_map_to_variants() {
        assert_eq!(Pose::from_index(1), Pose::Confident);
        assert_eq!(Pose::from_index(4), Pose::Fighting);
        assert_eq!(Face::from_index(2), Face::Embarrassed);
        assert_eq!(Face::from_index(7), Face::Pouting);
    }

    #[test]
    fn sprite_names_compose_character_and_variant() {
        assert_eq!(pose_sprite_name("Amy", Pose::Thinking), "Amy_Thinking");
        assert_eq!(
            face_sprite_name("HarutoSakuma", Face::Surprised),
            "HarutoSakuma_Surprised"
        );
    }
}
