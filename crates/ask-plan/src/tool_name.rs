// tool_name.rs - Maps free-form action labels onto canonical tool names.
//
// Planners phrase the same intent many ways ("Refund the order",
// "issue_refund", "check stock levels"). The classifier is deliberately
// small and deterministic: substring tests on the case-folded label, in a
// fixed priority order, with a slug of the label as the last resort.

/// Canonical name of the refund tool.
pub const REFUND_ORDER: &str = "refund_order";
/// Canonical name of the inventory-check tool.
pub const CHECK_INVENTORY: &str = "check_inventory";
/// Canonical name of the order-verification tool.
pub const VERIFY_ORDER: &str = "verify_order";
/// Name given to a step whose label is missing or empty.
pub const UNKNOWN_ACTION: &str = "unknown_action";

/// Tools that always operate on an order and therefore need an order id.
pub const ORDER_TOOLS: &[&str] = &[REFUND_ORDER, CHECK_INVENTORY, VERIFY_ORDER];

/// Classify a raw action label.
///
/// Priority: refund, then inventory/stock, then verify/check order.
/// Anything else becomes the lowercased label with spaces replaced by
/// underscores.
pub fn normalize_tool_name(raw: &str) -> String {
    if raw.trim().is_empty() {
        return UNKNOWN_ACTION.to_string();
    }

    let name = raw.to_lowercase();

    if name.contains("refund") {
        return REFUND_ORDER.to_string();
    }
    if name.contains("inventory") || name.contains("stock") {
        return CHECK_INVENTORY.to_string();
    }
    if name.contains("verify") || name.contains("check_order") || name.contains("check order") {
        return VERIFY_ORDER.to_string();
    }

    name.replace(' ', "_")
}

/// Whether the tool is one of the built-in order tools.
pub fn requires_order_id(tool: &str) -> bool {
    ORDER_TOOLS.contains(&tool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refund_phrasings() {
        assert_eq!(normalize_tool_name("Refund Order"), REFUND_ORDER);
        assert_eq!(normalize_tool_name("issue_refund"), REFUND_ORDER);
        assert_eq!(normalize_tool_name("REFUND"), REFUND_ORDER);
    }

    #[test]
    fn inventory_and_stock_phrasings() {
        assert_eq!(normalize_tool_name("Check Inventory"), CHECK_INVENTORY);
        assert_eq!(normalize_tool_name("check stock levels"), CHECK_INVENTORY);
    }

    #[test]
    fn verification_phrasings() {
        assert_eq!(normalize_tool_name("verify payment"), VERIFY_ORDER);
        assert_eq!(normalize_tool_name("check_order"), VERIFY_ORDER);
        assert_eq!(normalize_tool_name("Check Order status"), VERIFY_ORDER);
    }

    #[test]
    fn refund_wins_over_inventory() {
        // "refund" is tested first.
        assert_eq!(normalize_tool_name("refund after inventory check"), REFUND_ORDER);
    }

    #[test]
    fn unknown_labels_are_slugged() {
        assert_eq!(normalize_tool_name("Send Customer Email"), "send_customer_email");
        assert_eq!(normalize_tool_name("notify"), "notify");
    }

    #[test]
    fn empty_label_is_unknown_action() {
        assert_eq!(normalize_tool_name(""), UNKNOWN_ACTION);
        assert_eq!(normalize_tool_name("   "), UNKNOWN_ACTION);
    }

    #[test]
    fn order_tools_require_order_id() {
        assert!(requires_order_id(REFUND_ORDER));
        assert!(requires_order_id(VERIFY_ORDER));
        assert!(!requires_order_id("send_customer_email"));
    }
}
