/// Quotes `text` the way error messages show literals: `"abc"`, with escapes.
pub fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote() {
        assert_eq!(quote("ext"), "\"ext\"");
        assert_eq!(quote("\"1 foo:\""), r#""\"1 foo:\"""#);
    }
}
