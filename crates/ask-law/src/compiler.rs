// compiler.rs - LawScript compiler.
//
// Compiles one human-authored LawScript block into an enforceable Law:
//
//   LAW { when <field> <op> <value> block <tool> because "<reason>" }
//
// 1. Match the grammar (keywords case-insensitive, first match only)
// 2. Type the condition (ordering operators need an integer threshold)
// 3. Derive the law id from the exact source text
//
// Nothing is guessed: text that does not match the grammar is an error.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::error::LawError;
use crate::law::{Condition, Law};

/// Number of hex characters kept from the SHA-256 digest of the source.
pub const LAW_ID_LEN: usize = 8;

static LAW_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)LAW\s*\{\s*",
        r"when\s+(?P<field>\w+)\s*(?P<op>>|<|==|!=)\s*(?P<value>\w+)\s*",
        r"block\s+(?P<tool>\w+)\s*",
        r#"because\s+"(?P<reason>[^"]+)"\s*"#,
        r"\}",
    ))
    .unwrap()
});

/// The LawScript compiler.
pub struct LawCompiler;

impl LawCompiler {
    /// Compile LawScript text into a Law.
    pub fn compile(text: &str) -> Result<Law, LawError> {
        let caps = LAW_PATTERN
            .captures(text)
            .ok_or_else(|| LawError::InvalidLawScript {
                text: text.trim().to_string(),
            })?;

        let condition = Condition::new(&caps["field"], caps["op"].parse()?, &caps["value"])?;

        Ok(Law {
            id: law_id(text),
            condition,
            block_actions: BTreeSet::from([caps["tool"].to_string()]),
            reason: caps["reason"].to_string(),
        })
    }
}

/// Compile LawScript text into a Law.
pub fn compile_law(text: &str) -> Result<Law, LawError> {
    LawCompiler::compile(text)
}

/// Deterministic short id: the first hex characters of SHA-256(text).
pub fn law_id(text: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(text.as_bytes()));
    digest[..LAW_ID_LEN].to_string()
}
