//! Error taxonomy for the settings form and event bridge.
//!
//! Nothing here is fatal: every variant terminates in a user-visible
//! notification or a returned failure value at the call site.

use thiserror::Error;

/// Errors produced by the configuration tree, editors, and router.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No node anywhere in the tree carries the requested key.
    #[error("no config node with key `{key}`")]
    NotFound {
        /// The key that was looked up.
        key: String,
    },

    /// An image payload exceeded the upload ceiling and was rejected
    /// before any value change was committed.
    #[error("image payload is {size} bytes, over the {limit} byte limit")]
    PayloadTooLarge {
        /// Actual payload size in bytes.
        size: u64,
        /// Maximum accepted size in bytes.
        limit: u64,
    },

    /// A local image file could not be read.
    #[error("cannot read image file `{path}`: {source}")]
    ImageRead {
        /// Path that was supplied by the user.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An event payload failed the envelope shape check.
    #[error("malformed event envelope: {reason}")]
    MalformedEnvelope {
        /// Human-readable description of the shape mismatch.
        reason: String,
    },

    /// The persistence collaborator rejected a save.
    #[error("settings save rejected (code {code}): {msg}")]
    PersistenceFailure {
        /// Reply code from the collaborator; 200 means success.
        code: i32,
        /// Collaborator-supplied failure message.
        msg: String,
    },
}
