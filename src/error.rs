use std::fmt;

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Pipeline stage a [`FormatError::Processing`] originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Configuration,
    Assembly,
    Deduplication,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Configuration => "configuration",
            Stage::Assembly => "record assembly",
            Stage::Deduplication => "deduplication",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Failed to read '{name}'")]
    Read {
        name: String,
        #[source]
        source: BoxError,
    },
    #[error("Input is empty: {reason}")]
    EmptyInput { reason: String },
    #[error("No document (CPF/CNPJ) column found: {detail}")]
    NoDocumentColumn { detail: String },
    #[error("Processing failed during {stage}")]
    Processing {
        stage: Stage,
        #[source]
        source: BoxError,
    },
}

impl FormatError {
    pub fn read(name: impl Into<String>, source: impl Into<BoxError>) -> Self {
        FormatError::Read {
            name: name.into(),
            source: source.into(),
        }
    }

    pub fn empty_input(reason: impl Into<String>) -> Self {
        FormatError::EmptyInput {
            reason: reason.into(),
        }
    }

    pub fn processing(stage: Stage, source: impl Into<BoxError>) -> Self {
        FormatError::Processing {
            stage,
            source: source.into(),
        }
    }
}

pub type Result<T, E = FormatError> = std::result::Result<T, E>;
