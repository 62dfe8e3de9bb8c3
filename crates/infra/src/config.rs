//! Engine tuning knobs.

use serde::Deserialize;

use inkworks_invoicing::DEFAULT_DRAFT_PREFIX;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Extra attempts after an optimistic concurrency conflict.
    pub max_conflict_retries: u32,
    /// Prefix of the placeholder number a draft invoice carries.
    pub draft_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: 3,
            draft_prefix: DEFAULT_DRAFT_PREFIX.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: EngineConfig = serde_json::from_str(r#"{ "max_conflict_retries": 7 }"#).unwrap();
        assert_eq!(cfg.max_conflict_retries, 7);
        assert_eq!(cfg.draft_prefix, "DRAFT-");
    }
}
