//! Static layer of the narrative progression engine.
//!
//! Everything here is read-only after load: node-id parsing, the
//! unlock-rule table, the per-track lookup index, the unlock predicate,
//! and the authoring report built on top of them. The stateful engine
//! host lives in `novella_engine`.

pub mod index;
pub mod node;
pub mod report;
pub mod table;
pub mod unlock;

pub use index::RuleIndex;
pub use node::{parse_node_id, ParsedNodeId, Track};
pub use table::{load_rule_table, LoadedRuleTable, RuleTableSource, UnlockRule};
pub use unlock::is_unlocked;
