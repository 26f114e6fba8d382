//! Ordered argument list for external programs.

use std::fmt;

/// Program name plus an ordered sequence of `(token, value)` pairs.
///
/// Pairs render in insertion order, a pair without value as a single token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<(String, Option<String>)>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append a positional token.
    pub fn arg(mut self, token: impl Into<String>) -> Self {
        self.args.push((token.into(), None));
        self
    }

    /// Append a flag with its value, e.g. `-l frk`.
    pub fn flag(mut self, flag: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.push((flag.into(), Some(value.into())));
        self
    }

    /// Append every whitespace-separated token of `raw` as it comes.
    pub fn tokens(mut self, raw: &str) -> Self {
        self.args
            .extend(raw.split_whitespace().map(|token| (token.to_string(), None)));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Flattened argument vector, program excluded.
    pub fn args(&self) -> Vec<String> {
        self.args
            .iter()
            .flat_map(|(token, value)| std::iter::once(token.clone()).chain(value.clone()))
            .collect()
    }

    /// Value of the first pair with this flag.
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(token, _)| token == flag)
            .and_then(|(_, value)| value.as_deref())
    }

    pub fn to_command(&self) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&self.program);
        command.args(self.args());
        command
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for token in self.args() {
            write!(f, " {}", token)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_in_insertion_order() {
        let cmd = CommandLine::new("program")
            .arg("a")
            .arg("b")
            .tokens("--dpi 470")
            .flag("-l", "frk")
            .arg("alto");
        assert_eq!(cmd.to_string(), "program a b --dpi 470 -l frk alto");
        assert_eq!(cmd.args(), vec!["a", "b", "--dpi", "470", "-l", "frk", "alto"]);
        assert_eq!(cmd.value_of("-l"), Some("frk"));
        assert_eq!(cmd.value_of("--dpi"), None);
    }

    #[test]
    fn test_empty_tokens() {
        let cmd = CommandLine::new("tesseract").tokens("   ");
        assert!(cmd.args().is_empty());
        assert_eq!(cmd.to_string(), "tesseract");
    }
}
