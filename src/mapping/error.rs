//! Error definitions for the mapping module

use thiserror::Error;

/// Failures while turning a stick deflection into a publishable command
#[derive(Debug, Error)]
pub enum MappingError {
    /// The active topic carries a schema other than Twist/TwistStamped
    #[error("Unknown message schema: {0}")]
    UnsupportedSchema(String),

    /// No topic has been selected for publishing yet
    #[error("No topic selected")]
    NoTopic,
}
