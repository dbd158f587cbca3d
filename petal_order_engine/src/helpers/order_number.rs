use crate::db_types::ORDER_NUMBER_PREFIX;

/// Pulls the numeric sequence out of an order number. `PB-00042` yields 42.
///
/// Numbers imported from the old system are not always zero-padded, so any digit run after the prefix is accepted.
/// Anything else, including a number that overflows an `i64`, yields `None`.
pub fn sequence_from_number(number: &str) -> Option<i64> {
    let pattern = regex::Regex::new(&format!(r"^{ORDER_NUMBER_PREFIX}(\d+)$")).unwrap();
    pattern.captures(number.trim()).and_then(|c| c.get(1)).and_then(|m| m.as_str().parse::<i64>().ok())
}
