//! Declarative SQLite table definitions.
//!
//! Snapshots consumed by this crate are rebuilt by an external pipeline
//! rather than migrated in place, so there is no schema versioning here:
//! tables we own are created idempotently, and tables the pipeline owns are
//! checked for compatibility before the first query runs.

use anyhow::{bail, Result};
use rusqlite::Connection;

#[macro_export]
macro_rules! sqlite_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            // Allow unused_mut because the variable is only mutated when optional
            // field assignments are passed to the macro (e.g., `is_primary_key = true`)
            #[allow(unused_mut)]
            let mut column = Column {
                name: $name,
                sql_type: $sql_type,
                is_primary_key: false,
                non_null: false,
                default_value: None,
            };
            $(
                column.$field = $value;
            )*
            column
        }
    };
}

#[derive(Debug, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
    Real,
    Blob,
}

impl SqlType {
    fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Blob => "BLOB",
        }
    }
}

pub struct Column {
    pub name: &'static str,
    pub sql_type: &'static SqlType,
    pub is_primary_key: bool,
    pub non_null: bool,
    pub default_value: Option<&'static str>,
}

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
}

impl Table {
    /// Table name qualified with an attached-database schema, when given.
    pub fn qualified_name(&self, schema: Option<&str>) -> String {
        match schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.to_string(),
        }
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }

    /// Create the table if it does not exist yet. Safe to call repeatedly.
    pub fn create(&self, conn: &Connection, schema: Option<&str>) -> Result<()> {
        let mut create_sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (",
            self.qualified_name(schema)
        );
        for (column_index, column) in self.columns.iter().enumerate() {
            if column_index > 0 {
                create_sql.push_str(", ");
            }
            create_sql.push_str(&format!("{} {}", column.name, column.sql_type.as_sql()));
            if column.is_primary_key {
                create_sql.push_str(" PRIMARY KEY");
            }
            if column.non_null {
                create_sql.push_str(" NOT NULL");
            }
            if let Some(default_value) = column.default_value {
                create_sql.push_str(&format!(" DEFAULT {}", default_value));
            }
        }
        create_sql.push_str(");");
        conn.execute(&create_sql, [])?;
        Ok(())
    }

    /// Check that the table exists and carries every declared column.
    ///
    /// Extra columns and differing type affinities are accepted: snapshot
    /// pipelines evolve independently and SQLite affinity declarations vary
    /// between export tools. Only missing tables or columns are errors.
    pub fn ensure_compatible(&self, conn: &Connection) -> Result<()> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", self.name))?;
        let actual_columns: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<std::result::Result<_, _>>()?;

        if actual_columns.is_empty() {
            bail!("missing table '{}'", self.name);
        }

        for column in self.columns {
            if !actual_columns.iter().any(|name| name == column.name) {
                bail!(
                    "table '{}' is missing column '{}' (found: {})",
                    self.name,
                    column.name,
                    actual_columns.join(", ")
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_TABLE: Table = Table {
        name: "test_table",
        columns: &[
            sqlite_column!("id", &SqlType::Text, is_primary_key = true),
            sqlite_column!("name", &SqlType::Text, non_null = true),
            sqlite_column!("hidden", &SqlType::Integer, default_value = Some("0")),
        ],
    };

    #[test]
    fn test_create_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        TEST_TABLE.create(&conn, None).unwrap();
        TEST_TABLE.create(&conn, None).unwrap();

        conn.execute(
            "INSERT INTO test_table (id, name) VALUES ('a', 'first')",
            [],
        )
        .unwrap();
        TEST_TABLE.create(&conn, None).unwrap();

        // Existing rows survive re-creation
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM test_table", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_create_applies_default_value() {
        let conn = Connection::open_in_memory().unwrap();
        TEST_TABLE.create(&conn, None).unwrap();
        conn.execute(
            "INSERT INTO test_table (id, name) VALUES ('a', 'first')",
            [],
        )
        .unwrap();

        let hidden: i64 = conn
            .query_row("SELECT hidden FROM test_table WHERE id = 'a'", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(hidden, 0);
    }

    #[test]
    fn test_create_in_attached_schema() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("ATTACH DATABASE ':memory:' AS extra;")
            .unwrap();
        TEST_TABLE.create(&conn, Some("extra")).unwrap();

        conn.execute(
            "INSERT INTO extra.test_table (id, name) VALUES ('a', 'first')",
            [],
        )
        .unwrap();

        // The main schema must not have gained the table
        let in_main: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='test_table'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(in_main, 0);
    }

    #[test]
    fn test_ensure_compatible_accepts_extra_columns() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE test_table (id TEXT PRIMARY KEY, name TEXT, hidden INT, extra BLOB)",
            [],
        )
        .unwrap();
        TEST_TABLE.ensure_compatible(&conn).unwrap();
    }

    #[test]
    fn test_ensure_compatible_detects_missing_table() {
        let conn = Connection::open_in_memory().unwrap();
        let result = TEST_TABLE.ensure_compatible(&conn);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("missing table 'test_table'"));
    }

    #[test]
    fn test_ensure_compatible_detects_missing_column() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE test_table (id TEXT PRIMARY KEY, name TEXT)", [])
            .unwrap();

        let result = TEST_TABLE.ensure_compatible(&conn);
        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("missing column 'hidden'"));
    }
}
