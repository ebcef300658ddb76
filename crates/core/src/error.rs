use std::fmt;

/// The error kinds enumerated in spec §7. Each carries enough context to
/// render the `{code, value, detail, attribute?}` record of spec §6.4.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MigrationErrorKind {
    #[error("unknown or unconfigured RDBMS engine")]
    EngineUnknown,
    #[error("source and target engines must differ")]
    EnginePairInvalid,
    #[error("migration path has not been certified")]
    PairUncertified,
    #[error("value is outside the allowed range")]
    OutOfRange,
    #[error("attributes cannot be set at the same time")]
    MutuallyExclusive,
    #[error("migration step combination is incoherent")]
    StepIncoherent,
    #[error("schema not found")]
    SchemaNotFound,
    #[error("table not found")]
    TableNotFound,
    #[error("target schema creation failed")]
    SchemaCreateFailed,
    #[error("DDL execution failed")]
    DdlFailed,
    #[error("column type is not known in the target dialect")]
    TypeUnknown,
    #[error("no equivalent target type could be found")]
    TypeUnsupported,
    #[error("target type truncates the source declaration")]
    TypePrecisionLoss,
    #[error("connection is not available")]
    ConnectionUnavailable,
    #[error("bulk copy failed")]
    CopyFailed,
    #[error("unexpected error")]
    Unexpected,
}

impl MigrationErrorKind {
    /// The host error code reused across kinds (spec §6.4/§7).
    #[must_use]
    pub fn code(self) -> u32 {
        match self {
            MigrationErrorKind::Unexpected => 104,
            MigrationErrorKind::SchemaNotFound | MigrationErrorKind::TableNotFound => 119,
            MigrationErrorKind::MutuallyExclusive => 126,
            MigrationErrorKind::EngineUnknown
            | MigrationErrorKind::TypeUnknown
            | MigrationErrorKind::TypeUnsupported => 142,
            MigrationErrorKind::OutOfRange
            | MigrationErrorKind::TypePrecisionLoss => 151,
            MigrationErrorKind::EnginePairInvalid
            | MigrationErrorKind::PairUncertified
            | MigrationErrorKind::StepIncoherent
            | MigrationErrorKind::SchemaCreateFailed
            | MigrationErrorKind::DdlFailed
            | MigrationErrorKind::ConnectionUnavailable
            | MigrationErrorKind::CopyFailed => 101,
        }
    }
}

/// A single structured migration error, the Rust counterpart of the
/// original's `validate_format_error(code, value, detail, attribute)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationError {
    pub kind: MigrationErrorKind,
    pub value: String,
    pub detail: String,
    pub attribute: Option<String>,
}

impl MigrationError {
    #[must_use]
    pub fn new(kind: MigrationErrorKind, value: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    #[must_use]
    pub fn code(&self) -> u32 {
        self.kind.code()
    }

    /// Wraps a driver/IO failure as `Unexpected`, stripping control
    /// characters from the source message first (spec §7 "A caught driver
    /// exception is reduced to a sanitized message").
    pub fn unexpected(context: impl Into<String>, source: impl fmt::Display) -> Self {
        Self::new(MigrationErrorKind::Unexpected, context, sanitize(&source.to_string()))
    }
}

impl fmt::Display for MigrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {} ({})", self.code(), self.kind, self.value, self.detail)?;
        if let Some(attribute) = &self.attribute {
            write!(f, " @{attribute}")?;
        }
        Ok(())
    }
}

impl std::error::Error for MigrationError {}

/// Strips ASCII control characters (other than plain whitespace) from a
/// driver error message before it is surfaced, so stray terminal escapes
/// from a driver never reach the report.
#[must_use]
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .filter(|ch| !ch.is_control() || *ch == ' ' || *ch == '\t')
        .collect()
}

/// An accumulator of `MigrationError`s, mirroring the original's
/// `errors: list[str]` parameter threaded through every validation and
/// migration function. Components append to it; they never raise across
/// component boundaries (spec §7).
pub type Errors = Vec<MigrationError>;

pub type Result<T> = std::result::Result<T, MigrationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_control_characters_but_keeps_spacing() {
        assert_eq!(sanitize("line1\nline2\tok\x07bell"), "line1line2\tokbell");
    }

    #[test]
    fn code_mapping_matches_spec_reused_codes() {
        assert_eq!(MigrationErrorKind::Unexpected.code(), 104);
        assert_eq!(MigrationErrorKind::SchemaNotFound.code(), 119);
        assert_eq!(MigrationErrorKind::TableNotFound.code(), 119);
        assert_eq!(MigrationErrorKind::MutuallyExclusive.code(), 126);
        assert_eq!(MigrationErrorKind::TypeUnknown.code(), 142);
        assert_eq!(MigrationErrorKind::OutOfRange.code(), 151);
    }

    #[test]
    fn display_includes_attribute_when_present() {
        let error = MigrationError::new(MigrationErrorKind::SchemaNotFound, "HR", "schema not found in RDBMS oracle")
            .with_attribute("from-schema");
        assert!(error.to_string().contains("@from-schema"));
    }
}
