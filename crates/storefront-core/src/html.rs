//! HTML helpers for email bodies.
//!
//! Everything interpolated into an email body goes through [`escape`]: session
//! metadata and form fields are attacker-controlled.

/// Escape `& < > " '` for safe interpolation into HTML text and attributes.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            other => out.push(other),
        }
    }
    out
}

/// Bare address from a `"Name <addr@host>"` mailbox string.
pub fn mailbox_address(mailbox: &str) -> &str {
    match (mailbox.find('<'), mailbox.rfind('>')) {
        (Some(start), Some(end)) if start < end => mailbox[start + 1..end].trim(),
        (Some(start), None) => mailbox[start + 1..].trim(),
        _ => mailbox.trim(),
    }
}
