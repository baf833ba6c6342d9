use rusqlite::types::Value;

use crate::context::RequestContext;
use crate::models::ApprovalStatus;

/// Row predicate a report applies on top of its fixed source query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    All,
    /// `plugins.approved` equals the given status.
    Approval(ApprovalStatus),
    /// `column >= now - window_secs`.
    Since { column: &'static str, window_secs: i64 },
    /// `column` equals the requesting actor's user id.
    ActorIs { column: &'static str },
}

/// A filter bound to one request. Count and fetch both read from this.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFilter {
    pub clause: Option<String>,
    pub params: Vec<Value>,
}

impl Filter {
    pub fn resolve(&self, ctx: &RequestContext<'_>) -> ResolvedFilter {
        match *self {
            Filter::All => ResolvedFilter {
                clause: None,
                params: Vec::new(),
            },
            Filter::Approval(status) => ResolvedFilter {
                clause: Some("p.approved = ?1".to_string()),
                params: vec![Value::Integer(status.code())],
            },
            Filter::Since { column, window_secs } => ResolvedFilter {
                clause: Some(format!("{column} >= ?1")),
                params: vec![Value::Integer(ctx.now - window_secs)],
            },
            Filter::ActorIs { column } => ResolvedFilter {
                clause: Some(format!("{column} = ?1")),
                params: vec![Value::Integer(ctx.actor.id)],
            },
        }
    }
}
