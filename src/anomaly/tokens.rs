/// Tokens that may precede the box marker as part of a "P.O." prefix.
pub const DEFAULT_PREFIXES: [&str; 6] = ["p", "p.", "o", "o.", "po", "p.o."];

/// Split on any run of whitespace and lower-case every token.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// True for a non-empty token made only of letters and digits (`337`, `106b`).
pub fn is_alphanumeric(token: &str) -> bool {
    !token.is_empty() && token.chars().all(char::is_alphanumeric)
}
