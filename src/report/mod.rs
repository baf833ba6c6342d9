//! Generic paginated, sortable, access-controlled reports.
//!
//! A report is a [`ReportDefinition`] value: a fixed source query, a
//! [`Filter`], a column set whose sortable columns carry their own ORDER BY
//! terms, a default order and a row transform. [`Report`] binds a definition
//! to one request and runs it against the store.

pub mod builtin;
pub mod filter;

use std::cell::OnceCell;
use std::collections::HashMap;

use serde::Serialize;

use crate::context::RequestContext;
use crate::error::{ReportError, Result};
use crate::fmt::{epoch, html_escape};
use crate::models::CapabilityCheck;
use crate::settings::Settings;
use crate::store::Record;

pub use filter::{Filter, ResolvedFilter};

// ---------------------------------------------------------------------------
// Columns and paging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Anything other than `desc` (any case) is ascending.
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    pub fn param(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// A report column. Sortable columns list the ORDER BY terms that sort by
/// them; user input only ever selects one of these lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub key: &'static str,
    pub label: &'static str,
    pub order: &'static [&'static str],
}

impl Column {
    pub const fn sortable(
        key: &'static str,
        label: &'static str,
        order: &'static [&'static str],
    ) -> Self {
        Self { key, label, order }
    }

    pub const fn fixed(key: &'static str, label: &'static str) -> Self {
        Self { key, label, order: &[] }
    }

    pub fn is_sortable(&self) -> bool {
        !self.order.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagingState {
    pub page: u64,
    pub per_page: u64,
    pub sort_key: Option<String>,
    pub direction: SortDirection,
}

impl PagingState {
    pub fn new(per_page: u64) -> Self {
        Self {
            page: 0,
            per_page: per_page.max(1),
            sort_key: None,
            direction: SortDirection::Asc,
        }
    }

    pub fn page(mut self, page: u64) -> Self {
        self.page = page;
        self
    }

    pub fn sorted_by(mut self, key: &str, direction: SortDirection) -> Self {
        self.sort_key = Some(key.to_string());
        self.direction = direction;
        self
    }

    /// Row offset of this page, or `None` when it lies beyond what the store
    /// can address (SQLite offsets are signed 64-bit).
    pub fn offset(&self) -> Option<u64> {
        self.page
            .checked_mul(self.per_page)
            .filter(|offset| i64::try_from(*offset).is_ok())
    }
}

/// Index of the last page that holds data; 0 when there is none.
pub fn last_page(total: u64, per_page: u64) -> u64 {
    if total == 0 {
        0
    } else {
        (total - 1) / per_page.max(1)
    }
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Link { href: String, label: String },
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    pub fn plain(&self) -> &str {
        match self {
            Cell::Text(s) => s,
            Cell::Link { label, .. } => label,
        }
    }

    pub fn to_html(&self) -> String {
        match self {
            Cell::Text(s) => html_escape(s),
            Cell::Link { href, label } => {
                format!("<a href=\"{}\">{}</a>", html_escape(href), html_escape(label))
            }
        }
    }
}

/// Column key to display cell. Produced fresh by every fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultRow {
    cells: HashMap<&'static str, Cell>,
}

impl ResultRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &'static str, cell: Cell) -> Self {
        self.cells.insert(key, cell);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Cell> {
        self.cells.get(key)
    }

    /// Plain text of a cell, empty when the column is missing.
    pub fn text(&self, key: &str) -> &str {
        self.get(key).map(Cell::plain).unwrap_or("")
    }
}

/// Display helpers handed to row transforms.
pub struct Formatter<'a> {
    date_format: &'a str,
    base_url: &'a str,
}

impl<'a> Formatter<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self {
            date_format: &settings.date_format,
            base_url: settings.base_url.trim_end_matches('/'),
        }
    }

    pub fn date(&self, secs: i64) -> Cell {
        Cell::Text(epoch(secs, self.date_format))
    }

    pub fn plugin_link(&self, frankenstyle: &str, name: &str) -> Cell {
        Cell::Link {
            href: format!("{}/{}", self.base_url, frankenstyle),
            label: if name.is_empty() { frankenstyle.to_string() } else { name.to_string() },
        }
    }
}

pub type RowTransform = fn(&Record, &Formatter<'_>) -> ResultRow;

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// Fixed parts of a report query. `select` positions are what the row
/// transform reads.
#[derive(Debug, Clone, Copy)]
pub struct QuerySource {
    pub select: &'static str,
    pub from: &'static str,
    pub base_where: Option<&'static str>,
    pub group_by: Option<&'static str>,
}

pub struct ReportDefinition {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub capability: &'static str,
    pub quick_access: bool,
    pub columns: Vec<Column>,
    pub source: QuerySource,
    pub filter: Filter,
    /// Full ORDER BY terms including direction; also the tie-breaker after a
    /// requested sort.
    pub default_order: &'static [&'static str],
    pub transform: RowTransform,
}

/// What a report looks like to someone browsing the list of reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportDescriptor {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub can_view: bool,
    pub quick_access: bool,
}

impl ReportDefinition {
    pub fn can_view(&self, actor: &dyn CapabilityCheck) -> bool {
        actor.has_capability(self.capability)
    }

    pub fn descriptor(&self, actor: &dyn CapabilityCheck) -> ReportDescriptor {
        ReportDescriptor {
            name: self.name,
            title: self.title,
            description: self.description,
            can_view: self.can_view(actor),
            quick_access: self.quick_access,
        }
    }

    pub fn sortable_column(&self, key: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.key == key && c.is_sortable())
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| ReportError::InvalidDefinition {
            name: self.name.to_string(),
            reason: reason.to_string(),
        };
        if self.default_order.is_empty() {
            return Err(invalid("no default order"));
        }
        if self.columns.is_empty() {
            return Err(invalid("no columns"));
        }
        for (i, col) in self.columns.iter().enumerate() {
            if self.columns[..i].iter().any(|c| c.key == col.key) {
                return Err(invalid(&format!("duplicate column '{}'", col.key)));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Bound report
// ---------------------------------------------------------------------------

/// One page of a report plus the paging state that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub paging: PagingState,
    pub rows: Vec<ResultRow>,
    pub total: u64,
}

impl Page {
    pub fn page_count(&self) -> u64 {
        last_page(self.total, self.paging.per_page) + 1
    }
}

/// A report definition bound to one request. Only obtainable through
/// [`Report::open`], which enforces `can_view` before any query runs.
pub struct Report<'a> {
    def: &'a ReportDefinition,
    ctx: &'a RequestContext<'a>,
    filter: ResolvedFilter,
    row_count: OnceCell<u64>,
}

impl<'a> Report<'a> {
    pub fn open(def: &'a ReportDefinition, ctx: &'a RequestContext<'a>) -> Result<Self> {
        if !def.can_view(&ctx.actor) {
            tracing::info!(report = def.name, user = %ctx.actor.username, "report access denied");
            return Err(ReportError::PermissionDenied(def.name.to_string()));
        }
        Ok(Self {
            def,
            ctx,
            filter: def.filter.resolve(ctx),
            row_count: OnceCell::new(),
        })
    }

    pub fn columns(&self) -> &[Column] {
        &self.def.columns
    }

    fn where_clause(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(base) = self.def.source.base_where {
            parts.push(base);
        }
        if let Some(clause) = self.filter.clause.as_deref() {
            parts.push(clause);
        }
        if parts.is_empty() {
            "1 = 1".to_string()
        } else {
            parts.join(" AND ")
        }
    }

    /// Drop a sort key that does not name a sortable column.
    fn sanitize(&self, mut paging: PagingState) -> PagingState {
        paging.per_page = paging.per_page.max(1);
        if let Some(key) = paging.sort_key.as_deref() {
            if self.def.sortable_column(key).is_none() {
                tracing::debug!(report = self.def.name, key, "ignoring unknown sort key");
                paging.sort_key = None;
            }
        }
        paging
    }

    fn order_by(&self, paging: &PagingState) -> String {
        let mut terms: Vec<String> = Vec::new();
        if let Some(col) = paging.sort_key.as_deref().and_then(|k| self.def.sortable_column(k)) {
            let dir = paging.direction.sql();
            terms.extend(col.order.iter().map(|t| format!("{t} {dir}")));
        }
        terms.extend(self.def.default_order.iter().map(|t| t.to_string()));
        terms.join(", ")
    }

    pub fn row_count(&self) -> Result<u64> {
        if let Some(n) = self.row_count.get() {
            return Ok(*n);
        }
        let src = &self.def.source;
        let sql = match src.group_by {
            Some(group) => format!(
                "SELECT COUNT(*) FROM (SELECT 1 FROM {} WHERE {} GROUP BY {group})",
                src.from,
                self.where_clause()
            ),
            None => format!("SELECT COUNT(*) FROM {} WHERE {}", src.from, self.where_clause()),
        };
        let n = self.ctx.store.count(&sql, &self.filter.params)?;
        Ok(*self.row_count.get_or_init(|| n))
    }

    pub fn fetch_page(&self, paging: &PagingState) -> Result<Vec<ResultRow>> {
        let paging = self.sanitize(paging.clone());
        let src = &self.def.source;
        let group = src.group_by.map(|g| format!(" GROUP BY {g}")).unwrap_or_default();
        let sql = format!(
            "SELECT {} FROM {} WHERE {}{group} ORDER BY {}",
            src.select,
            src.from,
            self.where_clause(),
            self.order_by(&paging)
        );
        let Some(offset) = paging.offset() else {
            tracing::debug!(
                report = self.def.name,
                page = paging.page,
                "page beyond addressable range"
            );
            return Ok(Vec::new());
        };
        let records = self
            .ctx
            .store
            .select_page(&sql, &self.filter.params, offset, paging.per_page)?;

        let fetched = records.len().min(paging.per_page as usize) as u64;
        // A short page tells us the total without a count query, provided
        // the page actually reached into the data.
        if fetched < paging.per_page && (fetched > 0 || paging.page == 0) {
            if let Some(total) = offset.checked_add(fetched) {
                let _ = self.row_count.set(total);
            }
        }

        let fmt = Formatter::new(self.ctx.settings);
        Ok(records
            .iter()
            .take(paging.per_page as usize)
            .map(|r| (self.def.transform)(r, &fmt))
            .collect())
    }

    /// Fetch a page, clamping a page index past the end of the data to the
    /// last page that exists.
    pub fn page(&self, paging: PagingState) -> Result<Page> {
        let mut paging = self.sanitize(paging);
        let mut rows = self.fetch_page(&paging)?;
        if rows.is_empty() && paging.page > 0 {
            let last = last_page(self.row_count()?, paging.per_page);
            if paging.page > last {
                tracing::debug!(
                    report = self.def.name,
                    requested = paging.page,
                    last,
                    "clamping page"
                );
                paging.page = last;
                rows = self.fetch_page(&paging)?;
            }
        }
        let total = self.row_count()?;
        tracing::info!(
            report = self.def.name,
            page = paging.page,
            rows = rows.len(),
            total,
            "report page"
        );
        Ok(Page { paging, rows, total })
    }
}

/// Test doubles shared by the report, registry and CLI tests.
#[cfg(test)]
pub mod testing {
    use std::cell::Cell as Counter;
    use std::collections::HashSet;

    use rusqlite::types::Value;
    use rusqlite::Connection;

    use crate::error::Result;
    use crate::models::Actor;
    use crate::store::{Record, RecordStore};

    /// Delegates to a real connection and counts every call.
    pub struct CountingStore<'c> {
        pub conn: &'c Connection,
        pub counts: Counter<usize>,
        pub selects: Counter<usize>,
    }

    impl<'c> CountingStore<'c> {
        pub fn new(conn: &'c Connection) -> Self {
            Self {
                conn,
                counts: Counter::new(0),
                selects: Counter::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.counts.get() + self.selects.get()
        }
    }

    impl RecordStore for CountingStore<'_> {
        fn count(&self, sql: &str, params: &[Value]) -> Result<u64> {
            self.counts.set(self.counts.get() + 1);
            self.conn.count(sql, params)
        }

        fn select_page(
            &self,
            sql: &str,
            params: &[Value],
            offset: u64,
            limit: u64,
        ) -> Result<Vec<Record>> {
            self.selects.set(self.selects.get() + 1);
            self.conn.select_page(sql, params, offset, limit)
        }
    }

    pub fn actor(id: i64, caps: &[&str]) -> Actor {
        Actor {
            id,
            username: format!("user{id}"),
            fullname: format!("User {id}"),
            siteadmin: false,
            capabilities: caps.iter().map(|c| c.to_string()).collect::<HashSet<_>>(),
        }
    }
}
