//! Command layer: turns input lines into statements and runs them against a
//! table.

use thiserror::Error;

use crate::record::{RecordResult, Row, RowLayout, Table};

/// Non-SQL commands starting with a dot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaCommand {
    Exit,
    Constants,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Insert(Row),
    Select,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Meta(MetaCommand),
    Statement(Statement),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrepareError {
    #[error("Syntax error. Could not parse statement.")]
    Syntax,

    #[error("ID must be positive.")]
    NegativeId,

    #[error("String is too long.")]
    StringTooLong,

    #[error("Unrecognized command '{0}'.")]
    UnrecognizedMeta(String),

    #[error("Unrecognized keyword at start of '{0}'.")]
    UnrecognizedStatement(String),
}

/// Result of running a statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Inserted(usize),
    Rows(Vec<Row>),
}

impl Input {
    /// Parse one trimmed line of input
    pub fn parse(line: &str, layout: &RowLayout) -> Result<Self, PrepareError> {
        let line = line.trim();
        if line.starts_with('.') {
            return match line {
                ".exit" => Ok(Input::Meta(MetaCommand::Exit)),
                ".constants" => Ok(Input::Meta(MetaCommand::Constants)),
                _ => Err(PrepareError::UnrecognizedMeta(line.to_string())),
            };
        }

        Statement::parse(line, layout).map(Input::Statement)
    }
}

impl Statement {
    pub fn parse(line: &str, layout: &RowLayout) -> Result<Self, PrepareError> {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("insert") => {
                let (Some(id), Some(username), Some(email), None) =
                    (tokens.next(), tokens.next(), tokens.next(), tokens.next())
                else {
                    return Err(PrepareError::Syntax);
                };

                let id: i64 = id.parse().map_err(|_| PrepareError::Syntax)?;
                if id < 0 {
                    return Err(PrepareError::NegativeId);
                }
                let id = u32::try_from(id).map_err(|_| PrepareError::Syntax)?;

                if username.len() > layout.username_size || email.len() > layout.email_size {
                    return Err(PrepareError::StringTooLong);
                }
                Ok(Statement::Insert(Row::new(id, username, email)))
            }
            Some("select") if tokens.next().is_none() => Ok(Statement::Select),
            Some("select") => Err(PrepareError::Syntax),
            _ => Err(PrepareError::UnrecognizedStatement(line.to_string())),
        }
    }

    pub async fn execute(&self, table: &mut Table) -> RecordResult<Outcome> {
        match self {
            Statement::Insert(row) => table.insert_row(row).await.map(Outcome::Inserted),
            Statement::Select => table.rows().await.map(Outcome::Rows),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::{OpenMode, Pager, PagerConfig};
    use crate::record::RecordError;

    fn parse(line: &str) -> Result<Input, PrepareError> {
        Input::parse(line, &RowLayout::default())
    }

    #[test]
    fn test_parse_meta_commands() {
        assert_eq!(parse(".exit"), Ok(Input::Meta(MetaCommand::Exit)));
        assert_eq!(parse("  .constants "), Ok(Input::Meta(MetaCommand::Constants)));
        assert_eq!(
            parse(".tables"),
            Err(PrepareError::UnrecognizedMeta(".tables".to_string()))
        );
    }

    #[test]
    fn test_parse_insert() {
        assert_eq!(
            parse("insert 1 user1 person1@example.com"),
            Ok(Input::Statement(Statement::Insert(Row::new(
                1,
                "user1",
                "person1@example.com"
            ))))
        );
    }

    #[test]
    fn test_parse_insert_errors() {
        assert_eq!(parse("insert"), Err(PrepareError::Syntax));
        assert_eq!(parse("insert 1 user1"), Err(PrepareError::Syntax));
        assert_eq!(parse("insert 1 a b c"), Err(PrepareError::Syntax));
        assert_eq!(parse("insert x user1 e"), Err(PrepareError::Syntax));
        assert_eq!(parse("insert 4294967296 u e"), Err(PrepareError::Syntax));
        assert_eq!(parse("insert -1 user1 e"), Err(PrepareError::NegativeId));

        let long_name = "a".repeat(33);
        assert_eq!(
            parse(&format!("insert 1 {} e", long_name)),
            Err(PrepareError::StringTooLong)
        );
        let max_name = "a".repeat(32);
        assert!(parse(&format!("insert 1 {} {}", max_name, "b".repeat(255))).is_ok());
    }

    #[test]
    fn test_parse_select_and_unknown() {
        assert_eq!(parse("select"), Ok(Input::Statement(Statement::Select)));
        assert_eq!(parse("select *"), Err(PrepareError::Syntax));
        assert_eq!(
            parse("delete 1"),
            Err(PrepareError::UnrecognizedStatement("delete 1".to_string()))
        );
    }

    #[tokio::test]
    async fn test_execute_insert_then_select() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = PagerConfig {
            open_mode: OpenMode::Truncate,
            ..PagerConfig::default()
        };
        let pager = Pager::open(temp_dir.path().join("test.db"), config)
            .await
            .unwrap();
        let mut table = Table::new(pager, RowLayout::default()).unwrap();

        let insert = Statement::Insert(Row::new(1, "user1", "person1@example.com"));
        assert_eq!(insert.execute(&mut table).await.unwrap(), Outcome::Inserted(0));

        let rows = Statement::Select.execute(&mut table).await.unwrap();
        assert_eq!(
            rows,
            Outcome::Rows(vec![Row::new(1, "user1", "person1@example.com")])
        );

        let empty = Statement::Insert(Row::new(0, "", ""));
        assert!(matches!(
            empty.execute(&mut table).await,
            Err(RecordError::EmptyRow)
        ));
    }
}
