//! A [`Driver`] that writes statements as a SQL script instead of executing them.

use std::io::Write;

use crate::error::DriverError;
use crate::types::Record;

use super::connection::{Driver, InsertStatement};

/// Renders every statement with inline literals to `W`, one per line.
///
/// Useful for dry runs or for producing a script to apply with the database's own client.
#[derive(Debug)]
pub struct ScriptDriver<W: Write + Send> {
    out: W,
    statements: u64,
}

impl<W: Write + Send> ScriptDriver<W> {
    pub fn new(out: W) -> Self {
        Self { out, statements: 0 }
    }

    /// Number of statements written so far.
    pub fn statements(&self) -> u64 {
        self.statements
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, sql: &str) -> Result<(), DriverError> {
        writeln!(self.out, "{sql};")?;
        self.statements += 1;
        Ok(())
    }
}

/// Quote `value` as a SQL string literal.
pub fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

impl<W: Write + Send> Driver for ScriptDriver<W> {
    fn execute_many(&mut self, stmt: &InsertStatement<'_>, rows: &[Record]) -> Result<u64, DriverError> {
        let columns = stmt.columns.join(", ");
        for row in rows {
            let values: Vec<String> = row.iter().map(|v| sql_literal(v)).collect();
            let sql = format!(
                "INSERT INTO {} ({columns}) VALUES ({})",
                stmt.table,
                values.join(", ")
            );
            self.line(&sql)?;
        }
        Ok(rows.len() as u64)
    }

    fn execute(&mut self, sql: &str) -> Result<u64, DriverError> {
        self.line(sql)?;
        Ok(0)
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        self.line("COMMIT")?;
        self.out.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_escape_single_quotes() {
        assert_eq!(sql_literal("O'Brien"), "'O''Brien'");
        assert_eq!(sql_literal(""), "''");
    }

    #[test]
    fn rows_render_as_one_insert_each() {
        let columns = vec!["ID".to_string(), "NAME".to_string()];
        let stmt = InsertStatement {
            sql: "INSERT INTO PEOPLE (ID, NAME) VALUES (?, ?)",
            table: "PEOPLE",
            columns: &columns,
        };
        let rows = vec![
            vec!["1".to_string(), "Ada".to_string()],
            vec!["2".to_string(), "O'Hara".to_string()],
        ];

        let mut driver = ScriptDriver::new(Vec::new());
        assert_eq!(driver.execute_many(&stmt, &rows).unwrap(), 2);
        driver.commit().unwrap();
        assert_eq!(driver.statements(), 3);

        let script = String::from_utf8(driver.into_inner()).unwrap();
        assert_eq!(
            script,
            "INSERT INTO PEOPLE (ID, NAME) VALUES ('1', 'Ada');\n\
             INSERT INTO PEOPLE (ID, NAME) VALUES ('2', 'O''Hara');\n\
             COMMIT;\n"
        );
    }
}
