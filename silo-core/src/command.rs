use crate::{Parameter, truncate_long};
use std::{
    fmt::{self, Display},
    time::Duration,
};

/// How the command text is interpreted by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Ad-hoc statement text generated by a `SqlWriter`.
    Text,
    /// Name of a stored procedure (or scalar function).
    Procedure,
}

/// A statement ready to be executed by a [`Connection`](crate::Connection),
/// carrying its bind parameters and the configured timeout.
#[derive(Debug, Clone)]
pub struct Command {
    pub kind: CommandKind,
    pub sql: String,
    pub parameters: Vec<Parameter>,
    pub timeout: Duration,
}

impl Command {
    pub fn text(sql: String, parameters: Vec<Parameter>, timeout: Duration) -> Self {
        Self {
            kind: CommandKind::Text,
            sql,
            parameters,
            timeout,
        }
    }

    pub fn procedure(name: String, parameters: Vec<Parameter>, timeout: Duration) -> Self {
        Self {
            kind: CommandKind::Procedure,
            sql: name,
            parameters,
            timeout,
        }
    }

    /// The timeout a driver should apply: the larger of the configured value
    /// and the connection's own floor.
    pub fn effective_timeout(&self, floor: Duration) -> Duration {
        self.timeout.max(floor)
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", truncate_long!(self.sql))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_timeout_respects_floor() {
        let command = Command::text("SELECT 1".into(), vec![], Duration::from_secs(30));
        assert_eq!(
            command.effective_timeout(Duration::ZERO),
            Duration::from_secs(30)
        );
        assert_eq!(
            command.effective_timeout(Duration::from_secs(60)),
            Duration::from_secs(60)
        );
    }

    #[test]
    fn display_truncates_long_statements() {
        let command = Command::text("x".repeat(1000), vec![], Duration::ZERO);
        let text = command.to_string();
        assert!(text.len() < 600);
        assert!(text.ends_with("..."));
    }

    #[test]
    fn display_truncation_respects_char_boundaries() {
        // Two-byte chars put the raw cut-off inside a code point.
        let command = Command::text("é".repeat(400), vec![], Duration::ZERO);
        let text = command.to_string();
        assert!(text.ends_with("..."));
        assert!(text.chars().all(|c| c == 'é' || c == '.'));
    }
}
