//! Error taxonomy for the injection pipeline.
//!
//! Errors are classified by how much of the run they take down:
//! - **Fatal**: configuration is unusable, the run aborts before any mutation
//! - **Recoverable**: one definition is skipped, the run continues
//! - **Skipped**: one optional write (a location, a trader) is skipped, the
//!   rest of the definition still lands

use thiserror::Error;

use crate::rarity::Rarity;

/// Severity level of an error, used to decide the unit of work it discards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorSeverity {
    /// Aborts the whole run.
    Fatal,

    /// Discards one definition.
    Recoverable,

    /// Discards one optional write within a definition.
    Skipped,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fatal => "fatal",
            Self::Recoverable => "recoverable",
            Self::Skipped => "skipped",
        }
    }

    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal)
    }
}

/// Invalid pipeline configuration. Always fatal.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    #[error("rarity_weights.{0} is missing")]
    MissingWeight(Rarity),

    #[error("rarity_weights.{rarity} must be a number, got {value}")]
    NonNumericWeight { rarity: Rarity, value: String },

    #[error("rarity_weights must sum to exactly 1.0, got {sum:.6}")]
    WeightSum { sum: f64 },
}

/// Errors surfaced while injecting a single definition.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum InjectError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("clone source {clone_source} for {definition} not found in item templates")]
    MissingBaseTemplate {
        definition: String,
        clone_source: String,
    },

    #[error("map '{map}' not found")]
    MissingLocation { map: String },

    #[error("no probability data for container {container} on {map}")]
    MissingContainerBaseline { map: String, container: String },

    #[error("trader {trader} not found (fallback {fallback} also missing)")]
    MissingTrader { trader: String, fallback: String },

    #[error("definition id {id} already emitted in this run")]
    DuplicateDefinition { id: String },

    #[error("no shape configured for composite '{name}'")]
    MissingCompositeShape { name: String },

    #[error("template {id} is malformed: {reason}")]
    MalformedTemplate { id: String, reason: String },

    #[error("invalid definition: {0}")]
    InvalidDefinition(String),
}

impl InjectError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Configuration(_) => ErrorSeverity::Fatal,
            Self::MissingBaseTemplate { .. }
            | Self::DuplicateDefinition { .. }
            | Self::MissingCompositeShape { .. }
            | Self::MalformedTemplate { .. }
            | Self::InvalidDefinition(_) => ErrorSeverity::Recoverable,
            Self::MissingLocation { .. }
            | Self::MissingContainerBaseline { .. }
            | Self::MissingTrader { .. } => ErrorSeverity::Skipped,
        }
    }

    /// Short identifier for the error variant, used in structured logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::MissingBaseTemplate { .. } => "missing_base_template",
            Self::MissingLocation { .. } => "missing_location",
            Self::MissingContainerBaseline { .. } => "missing_container_baseline",
            Self::MissingTrader { .. } => "missing_trader",
            Self::DuplicateDefinition { .. } => "duplicate_definition",
            Self::MissingCompositeShape { .. } => "missing_composite_shape",
            Self::MalformedTemplate { .. } => "malformed_template",
            Self::InvalidDefinition(_) => "invalid_definition",
        }
    }
}

pub type Result<T> = std::result::Result<T, InjectError>;
