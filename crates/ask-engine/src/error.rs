// error.rs - Error types for the execution engine.
//
// Only caller-facing failures live here. A law violation or a failed step
// is not an error: the engine absorbs both into a BLOCKED or FAILED result.

use std::path::PathBuf;

use thiserror::Error;

use ask_law::LawError;
use ask_plan::FormatError;

/// Errors surfaced to the caller by the engine and its configuration.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The planner output could not be normalized into a plan.
    #[error("plan format error: {0}")]
    Plan(#[from] FormatError),

    /// A configured law failed to compile.
    #[error("law format error: {0}")]
    Law(#[from] LawError),

    /// The configuration file could not be read.
    #[error("failed to read config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for `KernelConfig`.
    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A law file named in the configuration could not be read.
    #[error("failed to read law file at {path}: {source}")]
    LawFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Error a tool returns instead of a result mapping.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolError {
    /// The tool ran and could not complete.
    #[error("tool '{tool}' failed: {message}")]
    Failed { tool: String, message: String },

    /// A required input parameter is missing or has the wrong type.
    #[error("tool '{tool}' received invalid input '{parameter}'")]
    InvalidInput { tool: String, parameter: String },
}
