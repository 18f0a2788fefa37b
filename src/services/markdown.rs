//! Escaping for Telegram's MarkdownV2 parse mode.

const RESERVED: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
    '\\',
];

fn escape_chars(text: &str, reserved: &[char]) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if reserved.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Plain text, rendered literally.
pub fn escape(text: &str) -> String {
    escape_chars(text, RESERVED)
}

/// Target of an inline link, the part inside `(...)`.
pub fn escape_url(url: &str) -> String {
    escape_chars(url, &[')', '\\'])
}

/// Contents of a ``` pre block.
pub fn escape_code(text: &str) -> String {
    escape_chars(text, &['`', '\\'])
}

/// Inline link with literal `text`.
pub fn link(text: &str, url: &str) -> String {
    format!("[{}]({})", escape(text), escape_url(url))
}
