// config.rs - Kernel configuration.
//
// A kernel is configured from TOML: the laws to load (inline LawScript or
// files holding one LAW block each) and the engine's fixed conventions.
// Every default reproduces the built-in behavior, so an empty file is a
// valid configuration.
//
// ```toml
// laws = ['LAW { when inventory > 0 block refund_order because "Check inventory first" }']
// law_files = ["laws/refunds.law"]
//
// [engine]
// refund_tool = "refund_order"
// refund_flag = "refund_done"
// success_status = "success"
// ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use ask_law::{compile_law, LawBook};
use ask_plan::REFUND_ORDER;

use crate::error::EngineError;

/// Top-level kernel configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KernelConfig {
    /// Inline LawScript blocks, compiled in order.
    #[serde(default)]
    pub laws: Vec<String>,

    /// Files each holding one LawScript block, compiled after inline laws.
    /// Relative paths are resolved against the config file's directory.
    #[serde(default)]
    pub law_files: Vec<PathBuf>,

    /// Engine conventions.
    #[serde(default)]
    pub engine: EngineOptions,
}

/// Fixed conventions the engine applies to every plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineOptions {
    /// Tool whose successful run sets `refund_flag` in world state.
    #[serde(default = "default_refund_tool")]
    pub refund_tool: String,

    /// World-state field set to true after a successful refund.
    #[serde(default = "default_refund_flag")]
    pub refund_flag: String,

    /// Tool result status that counts as success.
    #[serde(default = "default_success_status")]
    pub success_status: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            refund_tool: default_refund_tool(),
            refund_flag: default_refund_flag(),
            success_status: default_success_status(),
        }
    }
}

// Serde default functions
fn default_refund_tool() -> String {
    REFUND_ORDER.to_string()
}

fn default_refund_flag() -> String {
    "refund_done".to_string()
}

fn default_success_status() -> String {
    "success".to_string()
}

impl KernelConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, EngineError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| EngineError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text)?;

        if let Some(base) = path.parent() {
            for file in &mut config.law_files {
                if file.is_relative() {
                    *file = base.join(&*file);
                }
            }
        }
        Ok(config)
    }

    /// Compile every configured law into a book.
    ///
    /// Inline laws come first, then law files, each in listed order. A law
    /// whose id is already in the book is skipped.
    pub fn compile_laws(&self) -> Result<LawBook, EngineError> {
        let mut book = LawBook::new();

        for text in &self.laws {
            book.add_unique(compile_law(text)?);
        }
        for path in &self.law_files {
            let text = fs::read_to_string(path).map_err(|source| EngineError::LawFile {
                path: path.clone(),
                source,
            })?;
            book.add_unique(compile_law(&text)?);
        }

        Ok(book)
    }
}
