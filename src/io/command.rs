/// Splits a command line into its executable and arguments.
///
/// Tokens are separated by whitespace. There is no quoting or escaping.
pub fn tokenize(command: &str) -> Option<(&str, Vec<&str>)> {
    let mut tokens = command.split_whitespace();
    let program = tokens.next()?;

    Some((program, tokens.collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_program_and_args() {
        let (program, args) = tokenize("sleep 0.1").unwrap();
        assert_eq!(program, "sleep");
        assert_eq!(args, vec!["0.1"]);
    }

    #[test]
    fn test_tokenize_collapses_whitespace() {
        let (program, args) = tokenize("  echo   a\tb  ").unwrap();
        assert_eq!(program, "echo");
        assert_eq!(args, vec!["a", "b"]);
    }

    #[test]
    fn test_tokenize_no_quoting() {
        let (_, args) = tokenize("echo \"a b\"").unwrap();
        assert_eq!(args, vec!["\"a", "b\""]);
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").is_none());
        assert!(tokenize("   ").is_none());
    }
}
