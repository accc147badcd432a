//! Selection-and-reconciliation engine
//!
//! The engine turns a loaded inventory into the final upgrade artifacts:
//! 1. Selection - resolve the operator's cluster choice per domain
//! 2. Vendor reconciliation - one effective vendor per cluster, skip the rest
//! 3. Image resolution - one custom ISO per vendor or per cluster
//! 4. Spec building - one image assignment record per selected cluster

pub mod image;
pub mod selection;
pub mod spec;
pub mod vendor;

use std::io;

/// How many answers a single prompt may consume before the run is aborted.
pub const PROMPT_ATTEMPTS: usize = 3;

/// Errors produced while resolving selections and building the image spec.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Input or inventory state that cannot be worked with.
    #[error("{0}")]
    Validation(String),

    /// The operator exceeded the retry budget on a prompt.
    #[error("no valid {subject} after {attempts} attempts")]
    InputExhausted {
        /// What was being asked for.
        subject: &'static str,
        /// Attempts consumed.
        attempts: usize,
    },

    /// The prompt source itself failed (closed terminal, exhausted script).
    #[error("prompt failed: {0}")]
    Prompt(#[from] io::Error),
}

impl EngineError {
    /// Exhaustion of the standard retry budget for `subject`.
    pub fn exhausted(subject: &'static str) -> Self {
        Self::InputExhausted {
            subject,
            attempts: PROMPT_ATTEMPTS,
        }
    }
}
