use std::fmt::Write;

/// Renders bytes as a MySQL hexadecimal literal.
///
/// Non-empty input produces the `0x` form (`0x0aff`). Empty input produces `X''` because a bare
/// `0x` is not a valid literal.
pub fn encode_hex_literal(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return "X''".to_string();
    }

    let mut literal = String::with_capacity(2 + bytes.len() * 2);
    literal.push_str("0x");
    for byte in bytes {
        // Writing into a `String` cannot fail.
        let _ = write!(literal, "{byte:02x}");
    }

    literal
}
