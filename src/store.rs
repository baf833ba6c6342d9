//! Read-only access to the relational store used by reports.
//!
//! Reports never talk to `rusqlite` directly; they go through [`RecordStore`]
//! so the engine can be exercised against instrumented stores in tests.

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

use crate::error::{ReportError, Result};

/// One raw result row, addressed by select-list position.
#[derive(Debug, Clone, PartialEq)]
pub struct Record(Vec<Value>);

impl Record {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn int(&self, idx: usize) -> i64 {
        match self.0.get(idx) {
            Some(Value::Integer(i)) => *i,
            Some(Value::Real(f)) => *f as i64,
            Some(Value::Text(s)) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }

    pub fn text(&self, idx: usize) -> String {
        match self.0.get(idx) {
            Some(Value::Text(s)) => s.clone(),
            Some(Value::Integer(i)) => i.to_string(),
            Some(Value::Real(f)) => f.to_string(),
            _ => String::new(),
        }
    }
}

pub trait RecordStore {
    /// Run a query whose first column of the first row is a count.
    fn count(&self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Run a query and return at most `limit` rows starting at `offset`.
    fn select_page(
        &self,
        sql: &str,
        params: &[Value],
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Record>>;
}

impl RecordStore for Connection {
    fn count(&self, sql: &str, params: &[Value]) -> Result<u64> {
        tracing::debug!(sql, "count");
        let mut stmt = self.prepare(sql)?;
        let n: i64 = stmt.query_row(params_from_iter(params.iter()), |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }

    fn select_page(
        &self,
        sql: &str,
        params: &[Value],
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Record>> {
        let paged = format!("{sql} LIMIT ?{} OFFSET ?{}", params.len() + 1, params.len() + 2);
        tracing::debug!(sql = %paged, offset, limit, "select");
        let mut bound: Vec<Value> = params.to_vec();
        let offset = i64::try_from(offset)
            .map_err(|_| ReportError::Other(format!("row offset {offset} is out of range")))?;
        bound.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
        bound.push(Value::Integer(offset));

        let mut stmt = self.prepare(&paged)?;
        let ncols = stmt.column_count();
        let rows = stmt
            .query_map(params_from_iter(bound.iter()), |row| {
                let values = (0..ncols)
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(Record::new(values))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
