use url::form_urlencoded;

use crate::report::{PagingState, SortDirection};

pub const MAX_PER_PAGE: u64 = 1000;

/// Raw report request parameters, as they arrive in a query string or on
/// the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    pub report: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub sort: Option<String>,
    pub dir: Option<String>,
}

fn non_empty(v: &str) -> Option<String> {
    let v = v.trim();
    if v.is_empty() {
        None
    } else {
        Some(v.to_string())
    }
}

impl RequestParams {
    /// Parse `report=..&page=..&perpage=..&sort=..&dir=..`. Unknown keys and
    /// unparseable numbers are ignored.
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            match key.as_ref() {
                "report" => params.report = non_empty(&value),
                "page" => params.page = value.trim().parse().ok(),
                "perpage" => params.per_page = value.trim().parse().ok(),
                "sort" => params.sort = non_empty(&value),
                "dir" => params.dir = non_empty(&value),
                _ => {}
            }
        }
        params
    }

    /// Values set in `overrides` win.
    pub fn merge(self, overrides: RequestParams) -> Self {
        Self {
            report: overrides.report.or(self.report),
            page: overrides.page.or(self.page),
            per_page: overrides.per_page.or(self.per_page),
            sort: overrides.sort.or(self.sort),
            dir: overrides.dir.or(self.dir),
        }
    }

    pub fn report_name(&self) -> Option<&str> {
        self.report.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn paging(&self, default_per_page: u64) -> PagingState {
        let per_page = self
            .per_page
            .unwrap_or(default_per_page)
            .clamp(1, MAX_PER_PAGE);
        PagingState {
            page: self.page.unwrap_or(0),
            per_page,
            sort_key: self.sort.clone(),
            direction: self
                .dir
                .as_deref()
                .map(SortDirection::parse)
                .unwrap_or(SortDirection::Asc),
        }
    }
}

/// Query string that reproduces `paging` for `report`.
pub fn report_query(report: &str, paging: &PagingState) -> String {
    let mut ser = form_urlencoded::Serializer::new(String::new());
    ser.append_pair("report", report);
    ser.append_pair("page", &paging.page.to_string());
    ser.append_pair("perpage", &paging.per_page.to_string());
    if let Some(sort) = &paging.sort_key {
        ser.append_pair("sort", sort);
        ser.append_pair("dir", paging.direction.param());
    }
    ser.finish()
}
