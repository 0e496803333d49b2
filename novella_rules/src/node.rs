use std::fmt;

use serde::Serialize;

/// Storyline a node belongs to. `Main` is a singleton track; character
/// arcs and random pools are keyed by the name embedded in the node id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Track {
    Main,
    CharacterArc { character: String },
    Random { group: String },
}

impl Track {
    /// Formats the node id this track uses at `ordinal`. Ordinals are
    /// zero-padded to two digits, matching the authored id convention
    /// (`M05`, `C03_Amy`, `R02_Seat1`).
    pub fn id_at(&self, ordinal: u32) -> String {
        match self {
            Track::Main => format!("M{ordinal:02}"),
            Track::CharacterArc { character } => format!("C{ordinal:02}_{character}"),
            Track::Random { group } => format!("R{ordinal:02}_{group}"),
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Track::Main => write!(f, "main"),
            Track::CharacterArc { character } => write!(f, "arc:{character}"),
            Track::Random { group } => write!(f, "random:{group}"),
        }
    }
}

/// Result of parsing a raw node id once, at table load time.
///
/// `track` or `ordinal` may be absent for malformed ids; such nodes stay
/// addressable by exact id but never participate in ordered lookahead.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedNodeId {
    pub track: Option<Track>,
    pub ordinal: Option<u32>,
}

impl ParsedNodeId {
    pub fn track_and_ordinal(&self) -> Option<(&Track, u32)> {
        match (&self.track, self.ordinal) {
            (Some(track), Some(ordinal)) => Some((track, ordinal)),
            _ => None,
        }
    }
}

/// Parses a node id of the form `M<digits>`, `C<digits>_<character>`, or
/// `R<digits>_<group>` into its typed track and ordinal.
///
/// Ids with an unknown prefix, a missing digit run, or a missing name
/// suffix (for `C`/`R`) come back partially parsed rather than failing:
/// the caller decides whether unordered nodes matter.
pub fn parse_node_id(id: &str) -> ParsedNodeId {
    let mut chars = id.chars();
    let prefix = match chars.next() {
        Some(c) => c,
        None => {
            return ParsedNodeId {
                track: None,
                ordinal: None,
            }
        }
    };

    let rest = chars.as_str();
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    let ordinal = digits.parse::<u32>().ok();
    let suffix = rest[digits.len()..].strip_prefix('_').filter(|s| !s.is_empty());

    let track = match prefix {
        'M' => Some(Track::Main),
        'C' => suffix.map(|character| Track::CharacterArc {
            character: character.to_string(),
        }),
        'R' => suffix.map(|group| Track::Random {
            group: group.to_string(),
        }),
        _ => None,
    };

    ParsedNodeId { track, ordinal }
}

#[cfg(test)]
mod tests {
    use super::{parse_node_id, Track};

    #[test]
    fn parses_main_ids() {
        let parsed = parse_node_id("M05");
        assert_eq!(parsed.track, Some(Track::Main));
        assert_eq!(parsed.ordinal, Some(5));
    }

    #[test]
    fn parses_character_arc_ids() {
        let parsed = parse_node_id("C03_HarutoSakuma");
        assert_eq!(
            parsed.track,
            Some(Track::CharacterArc {
                character: "HarutoSakuma".to_string()
            })
        );
        assert_eq!(parsed.ordinal, Some(3));
    }

    #[test]
    fn parses_random_group_ids() {
        let parsed = parse_node_id("R02_Seat1");
        assert_eq!(
            parsed.track,
            Some(Track::Random {
                group: "Seat1".to_string()
            })
        );
        assert_eq!(parsed.ordinal, Some(2));
    }

    #[test]
    fn arc_without_suffix_has_no_track() {
        let parsed = parse_node_id("C07");
        assert_eq!(parsed.track, None);
        assert_eq!(parsed.ordinal, Some(7));
    }

    #[test]
    fn unknown_prefix_is_unordered() {
        let parsed = parse_node_id("Prologue");
        assert_eq!(parsed.track, None);
        assert_eq!(parsed.ordinal, None);
    }

    #[test]
    fn missing_digits_leave_ordinal_empty() {
        let parsed = parse_node_id("M_intro");
        assert_eq!(parsed.track, Some(Track::Main));
        assert_eq!(parsed.ordinal, None);
    }

    #[test]
    fn formats_ids_with_two_digit_padding() {
        assert_eq!(Track::Main.id_at(1), "M01");
        assert_eq!(
            Track::CharacterArc {
                character: "Amy".to_string()
            }
            .id_at(12),
            "C12_Amy"
        );
        assert_eq!(
            Track::Random {
                group: "Seat1".to_string()
            }
            .id_at(0),
            "R00_Seat1"
        );
        assert_eq!(Track::Main.id_at(104), "M104");
    }
}
