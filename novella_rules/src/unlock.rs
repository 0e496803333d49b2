use std::collections::HashSet;

use crate::index::RuleIndex;

/// Pure unlock predicate over a node and the reached-state snapshot.
///
/// A node with no rule record is always unlocked (open-world default).
/// Otherwise both lists must pass, with an empty list counting as
/// satisfied: `requires_all` wants every listed node reached,
/// `requires_any` wants at least one.
pub fn is_unlocked(index: &RuleIndex, node_id: &str, reached: &HashSet<String>) -> bool {
    let Some(rule) = index.rule(node_id) else {
        return true;
    };

    let all_met = rule.requires_all.is_empty()
        || rule.requires_all.iter().all(|id| reached.contains(id));
    let any_met = rule.requires_any.is_empty()
        || rule.requires_any.iter().any(|id| reached.contains(id));

    all_met && any_met
}

#[cfg(test)]
mod tests {
    use super::is_unlocked;
    use crate::index::RuleIndex;
    use crate::table::UnlockRule;
    use std::collections::HashSet;

    fn index_with(rules: Vec<UnlockRule>) -> RuleIndex {
        RuleIndex::build(rules)
    }

    fn gated(node: &str, all: &[&str], any: &[&str]) -> UnlockRule {
        UnlockRule {
            node: node.to_string(),
            requires_all: all.iter().map(|s| s.to_string()).collect(),
            requires_any: any.iter().map(|s| s.to_string()).collect(),
            ..UnlockRule::default()
        }
    }

    fn reached(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn unknown_node_is_always_unlocked() {
        let index = index_with(vec![]);
        assert!(is_unlocked(&index, "M99", &reached(&[])));
    }

    #[test]
    fn empty_lists_unlock_unconditionally() {
        let index = index_with(vec![gated("C00_Amy", &[], &[])]);
        assert!(is_unlocked(&index, "C00_Amy", &reached(&[])));
    }

    #[test]
    fn requires_all_needs_every_precondition() {
        let index = index_with(vec![gated("C05_Amy", &["M03"], &[])]);
        assert!(!is_unlocked(&index, "C05_Amy", &reached(&[])));
        assert!(!is_unlocked(&index, "C05_Amy", &reached(&["M02"])));
        assert!(is_unlocked(&index, "C05_Amy", &reached(&["M03"])));
    }

    #[test]
    fn requires_any_needs_one_precondition() {
        let index = index_with(vec![gated("R01_Seat1", &[], &["M02", "C01_Amy"])]);
        assert!(!is_unlocked(&index, "R01_Seat1", &reached(&[])));
        assert!(is_unlocked(&index, "R01_Seat1", &reached(&["C01_Amy"])));
    }

    #[test]
    fn both_lists_must_pass_together() {
        let index = index_with(vec![gated("M04", &["M03"], &["C02_Amy", "C02_Haruto"])]);
        assert!(!is_unlocked(&index, "M04", &reached(&["M03"])));
        assert!(!is_unlocked(&index, "M04", &reached(&["C02_Amy"])));
        assert!(is_unlocked(&index, "M04", &reached(&["M03", "C02_Haruto"])));
    }

    #[test]
    fn evaluation_has_no_side_effects() {
        let index = index_with(vec![gated("M04", &["M03"], &[])]);
        let snapshot = reached(&["M03"]);
        let before = snapshot.clone();
        assert!(is_unlocked(&index, "M04", &snapshot));
        assert!(is_unlocked(&index, "M04", &snapshot));
        assert_eq!(snapshot, before);
    }
}
