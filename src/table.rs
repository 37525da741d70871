//! # Tabular Message Payloads
//!
//! A compact column-oriented table used as the payload of messages flowing
//! through the engine. The table is a set of named columns holding
//! [`serde_json::Value`] cells; all columns have the same length, which is
//! the table's row count.
//!
//! The table is deliberately narrow: it is the seam through which the engine
//! talks to whatever dataframe storage the surrounding pipeline uses. The one
//! structural operation the engine relies on is [`TablePayload::with_columns`],
//! which returns a *new* table with columns added or overwritten - the
//! original is never mutated, so a failed run can never leave a partial
//! result visible upstream.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Error type for table payload construction and column operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
  /// A column's length disagrees with the table's row count.
  #[error("column '{column}' has {actual} rows, expected {expected}")]
  RaggedColumn {
    /// The offending column name.
    column: String,
    /// The table's row count.
    expected: usize,
    /// The column's actual length.
    actual: usize,
  },
  /// The same column name appeared twice in one batch of columns.
  #[error("duplicate column '{column}'")]
  DuplicateColumn {
    /// The repeated column name.
    column: String,
  },
  /// A serialized table names a column on only one side of its
  /// names/cells pair.
  #[error("column '{column}' is present in only one of names and cells")]
  SkewedColumn {
    /// The column named on one side only.
    column: String,
  },
}

/// A column-oriented table with named columns and a fixed row count.
///
/// Column order is preserved: iteration and output reflect the order in
/// which columns were first added, with freshly appended columns at the end.
///
/// # Example
///
/// ```rust
/// use inferweave::table::TablePayload;
/// use serde_json::json;
///
/// let table = TablePayload::from_columns(vec![(
///   "log".to_string(),
///   vec![json!("err1"), json!("err2")],
/// )])?;
/// assert_eq!(table.row_count(), 2);
/// assert_eq!(table.column("log").unwrap()[0], json!("err1"));
/// # Ok::<(), inferweave::table::TableError>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TableWire")]
pub struct TablePayload {
  /// Column names in presentation order.
  names: Vec<String>,
  /// Column cells, keyed by name.
  cells: HashMap<String, Vec<Value>>,
}

/// Raw serialized form, re-validated before it becomes a [`TablePayload`].
#[derive(Deserialize)]
struct TableWire {
  names: Vec<String>,
  cells: HashMap<String, Vec<Value>>,
}

impl TryFrom<TableWire> for TablePayload {
  type Error = TableError;

  fn try_from(mut wire: TableWire) -> Result<Self, TableError> {
    let mut columns = Vec::with_capacity(wire.names.len());
    for name in wire.names {
      match wire.cells.remove(&name) {
        Some(cells) => columns.push((name, cells)),
        None if columns.iter().any(|(taken, _)| *taken == name) => {
          return Err(TableError::DuplicateColumn { column: name });
        }
        None => return Err(TableError::SkewedColumn { column: name }),
      }
    }
    if let Some(orphan) = wire.cells.into_keys().next() {
      return Err(TableError::SkewedColumn { column: orphan });
    }
    Self::from_columns(columns)
  }
}

impl TablePayload {
  /// Creates an empty table with zero columns and zero rows.
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Builds a table from a list of named columns.
  ///
  /// The first column fixes the row count; every further column must match
  /// it.
  ///
  /// # Errors
  ///
  /// Returns [`TableError::RaggedColumn`] on a length mismatch and
  /// [`TableError::DuplicateColumn`] if a name repeats.
  pub fn from_columns(columns: Vec<(String, Vec<Value>)>) -> Result<Self, TableError> {
    Self::new().with_columns(columns)
  }

  /// Returns the number of rows.
  #[must_use]
  pub fn row_count(&self) -> usize {
    self
      .names
      .first()
      .and_then(|name| self.cells.get(name))
      .map_or(0, Vec::len)
  }

  /// Returns the column names in presentation order.
  #[must_use]
  pub fn column_names(&self) -> &[String] {
    &self.names
  }

  /// Returns the cells of a column, or `None` if no such column exists.
  #[must_use]
  pub fn column(&self, name: &str) -> Option<&[Value]> {
    self.cells.get(name).map(Vec::as_slice)
  }

  /// Returns a new table with the given columns added or overwritten.
  ///
  /// Existing columns keep their position when overwritten; new columns are
  /// appended in the order given. Row count and row order of existing
  /// columns are untouched. The receiver itself is not modified.
  ///
  /// # Errors
  ///
  /// Returns [`TableError::RaggedColumn`] if a column's length disagrees
  /// with the table's row count (for a previously empty table, with the
  /// first supplied column), and [`TableError::DuplicateColumn`] if the
  /// batch names the same column twice.
  pub fn with_columns(&self, columns: Vec<(String, Vec<Value>)>) -> Result<Self, TableError> {
    let mut next = self.clone();
    let mut expected = if next.names.is_empty() {
      None
    } else {
      Some(next.row_count())
    };
    let mut seen: Vec<&str> = Vec::with_capacity(columns.len());

    for (name, cells) in &columns {
      if seen.contains(&name.as_str()) {
        return Err(TableError::DuplicateColumn {
          column: name.clone(),
        });
      }
      seen.push(name);
      match expected {
        Some(rows) if cells.len() != rows => {
          return Err(TableError::RaggedColumn {
            column: name.clone(),
            expected: rows,
            actual: cells.len(),
          });
        }
        Some(_) => {}
        None => expected = Some(cells.len()),
      }
    }

    for (name, cells) in columns {
      if next.cells.insert(name.clone(), cells).is_none() {
        next.names.push(name);
      }
    }
    Ok(next)
  }
}
