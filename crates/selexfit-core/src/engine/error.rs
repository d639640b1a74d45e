use thiserror::Error;

use crate::core::energy::ModelError;
use crate::core::sequence::SequenceError;
use crate::core::utils::roots::RootError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Root for {context} not bracketed over [{lo}, {hi}]")]
    RootNotBracketed {
        context: &'static str,
        lo: f64,
        hi: f64,
    },

    #[error("Numerically degenerate state: {0}")]
    NumericDegenerate(String),

    #[error("Sequence error: {source}")]
    Sequence {
        #[from]
        source: SequenceError,
    },

    #[error("Energy model error: {source}")]
    Model {
        #[from]
        source: ModelError,
    },
}

impl EngineError {
    pub(crate) fn from_root(context: &'static str, err: RootError) -> Self {
        match err {
            RootError::NotBracketed { lo, hi } => {
                EngineError::RootNotBracketed { context, lo, hi }
            }
            RootError::InvalidBracket { lo, hi } => EngineError::NumericDegenerate(format!(
                "bracket [{lo}, {hi}] for {context} is empty or not finite"
            )),
        }
    }

    /// Evaluation errors the fitter may swallow as a rejected step, as
    /// opposed to configuration errors that must abort the fit.
    pub(crate) fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::RootNotBracketed { .. } | EngineError::NumericDegenerate(_)
        )
    }
}
