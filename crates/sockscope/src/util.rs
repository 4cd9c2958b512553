//! Small text helpers.

/// Split a command line on runs of whitespace.
///
/// No quoting rules apply; each whitespace-separated field is one token.
pub fn tokens(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens() {
        assert_eq!(tokens("nsenter"), vec!["nsenter"]);
        assert_eq!(
            tokens("  sudo -n\tnsenter \n"),
            vec!["sudo", "-n", "nsenter"]
        );
        assert!(tokens("   ").is_empty());
    }
}
