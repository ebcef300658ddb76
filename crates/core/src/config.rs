//! The configuration entity consumed by the core (spec §3, §6.1).

use serde::Deserialize;

use crate::engine::Engine;

/// A caller-supplied override for one column's target type (spec §3
/// `external_columns`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExternalColumn {
    #[serde(rename = "column-name")]
    pub column_name: String,
    #[serde(rename = "column-type")]
    pub column_type: String,
}

/// Which source tables a run should cover: either everything, or an
/// explicit include/exclude list (spec §3, mutually exclusive per §4.C).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TableSelection {
    #[default]
    All,
    Include(Vec<String>),
    Exclude(Vec<String>),
}

/// The migration configuration object (spec §3 "Configuration entity", §6.1).
///
/// Deserialized directly from the kebab-case keys of spec §6 so a JSON or
/// YAML file can be handed straight to [`crate::validator::validate`].
#[derive(Debug, Clone, Deserialize)]
pub struct MigrationConfig {
    #[serde(rename = "from-rdbms")]
    pub from_rdbms: String,
    #[serde(rename = "to-rdbms")]
    pub to_rdbms: String,
    #[serde(rename = "from-schema")]
    pub from_schema: String,
    #[serde(rename = "to-schema")]
    pub to_schema: String,
    #[serde(rename = "include-tables", default)]
    pub include_tables: Option<Vec<String>>,
    #[serde(rename = "exclude-tables", default)]
    pub exclude_tables: Option<Vec<String>>,
    #[serde(rename = "migrate-metadata")]
    pub migrate_metadata: bool,
    #[serde(rename = "migrate-plaindata")]
    pub migrate_plaindata: bool,
    #[serde(rename = "migrate-lobdata")]
    pub migrate_lobdata: bool,
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: u32,
    #[serde(rename = "chunk-size", default = "default_chunk_size")]
    pub chunk_size: u32,
    #[serde(rename = "max-processes", default = "default_max_processes")]
    pub max_processes: u32,
    #[serde(rename = "external-columns", default)]
    pub external_columns: Vec<ExternalColumn>,
    /// Non-fatal pairings (anything but `oracle`→`postgres`) only run when
    /// this is explicitly set, per spec §4.C `PairUncertified`.
    #[serde(rename = "allow-uncertified-pair", default)]
    pub allow_uncertified_pair: bool,
}

#[must_use]
pub fn default_batch_size() -> u32 {
    100_000
}

#[must_use]
pub fn default_chunk_size() -> u32 {
    8192
}

#[must_use]
pub fn default_max_processes() -> u32 {
    1
}

pub const BATCH_SIZE_RANGE: std::ops::RangeInclusive<u32> = 1_000..=10_000_000;
pub const CHUNK_SIZE_RANGE: std::ops::RangeInclusive<u32> = 1_024..=16_777_216;
pub const MAX_PROCESSES_RANGE: std::ops::RangeInclusive<u32> = 1..=1_000;

impl MigrationConfig {
    /// The resolved table selection, ready for the pipeline's filter step
    /// (spec §4.D step 2). Assumes the validator already enforced
    /// mutual exclusivity.
    #[must_use]
    pub fn table_selection(&self) -> TableSelection {
        if let Some(include) = &self.include_tables {
            TableSelection::Include(include.clone())
        } else if let Some(exclude) = &self.exclude_tables {
            TableSelection::Exclude(exclude.clone())
        } else {
            TableSelection::All
        }
    }

    pub(crate) fn parsed_engines(&self) -> (Option<Engine>, Option<Engine>) {
        (self.from_rdbms.parse().ok(), self.to_rdbms.parse().ok())
    }
}

/// Connection parameters for one engine (spec §3 "Connection parameters").
/// Never deserialized from the migration configuration file itself;
/// credential retrieval is an external collaborator (spec §1, §6.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub user: String,
    pub pwd: String,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub driver: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_minimal_config_with_defaults() {
        let json = serde_json::json!({
            "from-rdbms": "oracle",
            "to-rdbms": "postgres",
            "from-schema": "HR",
            "to-schema": "hr",
            "migrate-metadata": true,
            "migrate-plaindata": true,
            "migrate-lobdata": false,
        });
        let config: MigrationConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.batch_size, 100_000);
        assert_eq!(config.chunk_size, 8192);
        assert_eq!(config.max_processes, 1);
        assert!(matches!(config.table_selection(), TableSelection::All));
    }

    #[test]
    fn include_tables_takes_precedence_when_only_include_set() {
        let json = serde_json::json!({
            "from-rdbms": "oracle",
            "to-rdbms": "postgres",
            "from-schema": "HR",
            "to-schema": "hr",
            "include-tables": ["EMP"],
            "migrate-metadata": true,
            "migrate-plaindata": true,
            "migrate-lobdata": false,
        });
        let config: MigrationConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.table_selection(), TableSelection::Include(vec!["EMP".to_string()]));
    }
}
