// translator.rs - Turns plain human feedback into LawScript.
//
// Reviewers rarely write LawScript. The translator recognizes a handful of
// feedback patterns and emits the matching LawScript block, which is then
// compiled like any other law. Adding the law to a book is the caller's
// decision.

use crate::compiler::compile_law;
use crate::error::LawError;
use crate::law::Law;

const CHECK_INVENTORY_FIRST: &str = r#"LAW {
  when inventory > 0
  block refund_order
  because "Check inventory first"
}"#;

const NO_NEGATIVE_INVENTORY: &str = r#"LAW {
  when inventory < 0
  block refund_order
  because "Inventory cannot be negative"
}"#;

const NO_INVENTORY: &str = r#"LAW {
  when inventory == 0
  block refund_order
  because "No inventory available"
}"#;

/// The LawScript text for a piece of feedback, if a pattern matches.
pub fn feedback_to_law_script(feedback: &str) -> Option<&'static str> {
    let text = feedback.to_lowercase();

    if !(text.contains("refund") && text.contains("inventory")) {
        return None;
    }

    let script = if text.contains('>') || text.contains("more than") || text.contains("greater than")
    {
        CHECK_INVENTORY_FIRST
    } else if text.contains('<') || text.contains("less than") {
        NO_NEGATIVE_INVENTORY
    } else {
        NO_INVENTORY
    };
    Some(script)
}

/// Translate feedback into a compiled law.
pub fn translate_feedback(feedback: &str) -> Result<Law, LawError> {
    let script = feedback_to_law_script(feedback).ok_or_else(|| LawError::Untranslatable {
        feedback: feedback.to_string(),
    })?;
    compile_law(script)
}
