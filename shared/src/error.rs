//! Error types for the bootstrap core.
//!
//! `LoadError` is `Clone` because a single settled load is handed to every caller that
//! awaited the shared in-flight future.

use crate::loader::ModuleKind;
use std::sync::Arc;
use thiserror::Error;

/// Failure of an asynchronous module load or of the one-time runtime initialization.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The module could not be fetched/constructed.
    #[error("failed to load {kind} module: {reason}")]
    Import { kind: ModuleKind, reason: Arc<str> },

    /// The module loaded but its runtime failed to start.
    #[error("physics runtime initialization failed: {reason}")]
    Init { reason: Arc<str> },
}

impl LoadError {
    pub fn import(kind: ModuleKind, reason: impl Into<Arc<str>>) -> Self {
        Self::Import {
            kind,
            reason: reason.into(),
        }
    }

    pub fn init(reason: impl Into<Arc<str>>) -> Self {
        Self::Init {
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by the physics access proxy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProxyError {
    /// A physics member was read before initialization completed.
    #[error("physics module accessed before initialization: `{member}`")]
    Uninitialized { member: String },

    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Rejected asset descriptors and catalog files.
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("asset `{name}`: scale must be finite and > 0 (got {scale})")]
    InvalidScale { name: String, scale: f32 },

    #[error("asset `{name}`: mass must be finite and >= 0 (got {mass})")]
    InvalidMass { name: String, mass: f32 },

    #[error("asset `{name}`: restitution must be within [0, 1] (got {restitution})")]
    InvalidRestitution { name: String, restitution: f32 },

    #[error("asset `{name}`: collider dimensions must be finite and > 0")]
    InvalidShape { name: String },

    #[error("asset `{0}` is already registered")]
    Duplicate(String),

    #[error("failed to parse asset catalog: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("failed to read asset catalog: {0}")]
    Io(#[from] std::io::Error),
}
