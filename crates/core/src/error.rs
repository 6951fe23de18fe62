//! Error types for SplitView operations.
//!
//! This module defines the main error type [`SplitViewError`] which represents
//! every failure the extraction core can report: DOM access, selector parsing,
//! element activation, rule and settings files, and fetching.
//!
//! Most component failures never reach the user. The extraction pipeline
//! converts them into "skip this target" and only surfaces
//! [`SplitViewError::NothingExtracted`] when no target produced content.
//!
//! # Example
//!
//! ```rust
//! use splitview_core::{SplitViewError, Result};
//!
//! fn first_item(items: &[String]) -> Result<&String> {
//!     items.first().ok_or(SplitViewError::NothingExtracted)
//! }
//! # assert!(first_item(&[]).is_err());
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::dom::NodeId;

/// Main error type for extraction operations.
#[derive(Error, Debug)]
pub enum SplitViewError {
    /// HTTP request errors from reqwest.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTML could not be parsed or rewritten.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// A CSS selector (from a site rule or the command line) is malformed.
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// A node handle no longer resolves to a node of the document.
    ///
    /// Handles are plain identities; the page may have dropped the node
    /// since the handle was taken.
    #[error("Node {0} is not part of the document")]
    NodeNotFound(NodeId),

    /// The page rejected or failed an element activation (click).
    #[error("Failed to activate element {node}: {reason}")]
    ActivationFailed { node: NodeId, reason: String },

    /// The live subtree and its clone diverged while copying styles.
    #[error("Clone does not mirror the live subtree ({live} live elements, {clone} cloned)")]
    StructureMismatch { live: usize, clone: usize },

    /// Every target of an extraction run was empty or failed.
    #[error("Nothing extracted")]
    NothingExtracted,

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File read/write errors.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Site rule files that cannot be decoded.
    #[error("Site rule error: {0}")]
    SiteRuleError(String),

    /// Settings that cannot be decoded or stored.
    #[error("Settings error: {0}")]
    SettingsError(String),

    /// JSON encoding errors.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for SplitViewError.
pub type Result<T> = std::result::Result<T, SplitViewError>;
