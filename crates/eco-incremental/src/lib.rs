mod generate;
mod lookback;
mod merge;
mod origin;
mod relex;

pub use generate::{generate, GenerateResult, GeneratedToken};
pub use merge::merge_back;
pub use origin::{find_preceeding_node, RelexOrigin};
pub use relex::{relex, relex_import, RelexConfig, RelexOutcome};

pub use lookback::propagate as propagate_lookback;
