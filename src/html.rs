//! HTML rendering for report pages and the report selector.

use crate::fmt::html_escape;
use crate::registry::ReportView;
use crate::report::{last_page, PagingState, ReportDescriptor, SortDirection};
use crate::request::report_query;

/// Pages shown either side of the current one in the paging bar.
const PAGING_WINDOW: u64 = 4;

/// Wraps an HTML fragment into a full page.
pub trait PageShell {
    fn wrap(&self, title: &str, body: &str) -> String;
}

pub struct StandardShell {
    pub site_name: String,
}

impl Default for StandardShell {
    fn default() -> Self {
        Self {
            site_name: "Plugins directory".to_string(),
        }
    }
}

impl PageShell for StandardShell {
    fn wrap(&self, title: &str, body: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} | {site}</title>
</head>
<body>
<h1>{title}</h1>
{body}
</body>
</html>
"#,
            title = html_escape(title),
            site = html_escape(&self.site_name),
        )
    }
}

fn link(query: &str, label: &str) -> String {
    format!("<a href=\"?{}\">{}</a>", html_escape(query), label)
}

fn paging_bar(name: &str, paging: &PagingState, total: u64) -> String {
    if total <= paging.per_page {
        return String::new();
    }
    let last = last_page(total, paging.per_page);
    let current = paging.page;
    let goto = |page: u64, label: &str| {
        let target = PagingState {
            page,
            ..paging.clone()
        };
        link(&report_query(name, &target), label)
    };

    let mut parts: Vec<String> = Vec::new();
    if current > 0 {
        parts.push(goto(current - 1, "&laquo; Previous"));
    }
    let from = current.saturating_sub(PAGING_WINDOW);
    let to = current.saturating_add(PAGING_WINDOW).min(last);
    if from > 0 {
        parts.push(goto(0, "1"));
        if from > 1 {
            parts.push("&hellip;".to_string());
        }
    }
    for page in from..=to {
        if page == current {
            parts.push(format!("<strong>{}</strong>", page.saturating_add(1)));
        } else {
            parts.push(goto(page, &page.saturating_add(1).to_string()));
        }
    }
    if to < last {
        if to + 1 < last {
            parts.push("&hellip;".to_string());
        }
        parts.push(goto(last, &(last + 1).to_string()));
    }
    if current < last {
        parts.push(goto(current + 1, "Next &raquo;"));
    }
    format!("<nav class=\"paging\">{}</nav>\n", parts.join(" "))
}

pub fn render_report(view: &ReportView) -> String {
    let name = view.descriptor.name;
    let paging = &view.page.paging;
    let bar = paging_bar(name, paging, view.page.total);

    let mut out = String::new();
    out.push_str(&format!(
        "<p class=\"description\">{}</p>\n",
        html_escape(view.descriptor.description)
    ));
    out.push_str(&bar);
    out.push_str("<table class=\"report\">\n<thead>\n<tr>");
    for col in &view.columns {
        let label = html_escape(col.label);
        if !col.is_sortable() {
            out.push_str(&format!("<th>{label}</th>"));
            continue;
        }
        let active = paging.sort_key.as_deref() == Some(col.key);
        let direction = if active { paging.direction.toggled() } else { SortDirection::Asc };
        let target = PagingState {
            page: 0,
            per_page: paging.per_page,
            sort_key: Some(col.key.to_string()),
            direction,
        };
        let marker = match (active, paging.direction) {
            (true, SortDirection::Asc) => " &#9650;",
            (true, SortDirection::Desc) => " &#9660;",
            (false, _) => "",
        };
        out.push_str(&format!("<th>{}{marker}</th>", link(&report_query(name, &target), &label)));
    }
    out.push_str("</tr>\n</thead>\n<tbody>\n");
    if view.page.rows.is_empty() {
        out.push_str(&format!(
            "<tr><td colspan=\"{}\">Nothing to display</td></tr>\n",
            view.columns.len()
        ));
    }
    for row in &view.page.rows {
        out.push_str("<tr>");
        for col in &view.columns {
            let cell = row.get(col.key).map(|c| c.to_html()).unwrap_or_default();
            out.push_str(&format!("<td>{cell}</td>"));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n");
    out.push_str(&bar);
    out
}

pub fn render_selector(reports: &[ReportDescriptor]) -> String {
    if reports.is_empty() {
        return "<p>There are no reports available to you.</p>\n".to_string();
    }
    let mut out = String::from("<ul class=\"reports\">\n");
    for d in reports {
        let star = if d.quick_access { " <span class=\"quick\">&#9733;</span>" } else { "" };
        out.push_str(&format!(
            "<li>{}{star}<br><small>{}</small></li>\n",
            link(&format!("report={}", d.name), &html_escape(d.title)),
            html_escape(d.description)
        ));
    }
    out.push_str("</ul>\n");
    out
}

pub fn render_denied(message: &str) -> String {
    format!("<div class=\"error\">{}</div>\n", html_escape(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Cell, Column, Page, ResultRow};

    fn view(total: u64, page: u64, per_page: u64, sort: Option<&str>) -> ReportView {
        ReportView {
            descriptor: ReportDescriptor {
                name: "unapproved",
                title: "Plugins pending approval",
                description: "Waiting <soon>",
                can_view: true,
                quick_access: true,
            },
            columns: vec![
                Column::sortable("plugin", "Plugin", &["p.name"]),
                Column::fixed("note", "Note & more"),
            ],
            page: Page {
                paging: PagingState {
                    page,
                    per_page,
                    sort_key: sort.map(str::to_string),
                    direction: SortDirection::Asc,
                },
                rows: vec![ResultRow::new()
                    .with(
                        "plugin",
                        Cell::Link {
                            href: "https://x.test/mod_a".to_string(),
                            label: "A".to_string(),
                        },
                    )
                    .with("note", Cell::text("<script>"))],
                total,
            },
        }
    }

    #[test]
    fn test_table_escapes_and_builds_header() {
        let html = render_report(&view(1, 0, 10, None));
        assert!(html.contains("Waiting &lt;soon&gt;"));
        assert!(html.contains("<th>Note &amp; more</th>"));
        assert!(html.contains("<td>&lt;script&gt;</td>"));
        assert!(html.contains("<td><a href=\"https://x.test/mod_a\">A</a></td>"));
        assert!(html.contains(
            "?report=unapproved&amp;page=0&amp;perpage=10&amp;sort=plugin&amp;dir=asc"
        ));
    }

    #[test]
    fn test_active_sort_header_toggles_direction() {
        let html = render_report(&view(1, 0, 10, Some("plugin")));
        assert!(html.contains("sort=plugin&amp;dir=desc"));
        assert!(html.contains("&#9650;"));
    }

    #[test]
    fn test_paging_bar_only_when_needed() {
        let html = render_report(&view(10, 0, 10, None));
        assert!(!html.contains("class=\"paging\""));
        let html = render_report(&view(25, 1, 10, None));
        assert_eq!(html.matches("<nav class=\"paging\">").count(), 2);
        assert!(html.contains("<strong>2</strong>"));
        assert!(html.contains("Next &raquo;"));
        assert!(html.contains("&laquo; Previous"));
    }

    #[test]
    fn test_paging_bar_window() {
        let bar = paging_bar("reviews", &PagingState::new(1).page(50), 100);
        assert!(bar.contains(">1</a> &hellip;"));
        assert!(bar.contains("<strong>51</strong>"));
        assert!(bar.contains("&hellip; <a href=\"?report=reviews&amp;page=99"));
        assert!(!bar.contains(">40</a>"));
    }

    #[test]
    fn test_paging_bar_at_extreme_pages() {
        let bar = paging_bar("reviews", &PagingState::new(1).page(u64::MAX - 1), u64::MAX);
        assert!(bar.contains(&format!("<strong>{}</strong>", u64::MAX)));
        assert!(!bar.contains("Next &raquo;"));

        let unclamped = paging_bar("reviews", &PagingState::new(1).page(u64::MAX), 3);
        assert!(unclamped.contains("&laquo; Previous"));
        assert!(!unclamped.contains("<strong>"));
    }

    #[test]
    fn test_selector_and_shell() {
        let list = vec![view(0, 0, 1, None).descriptor];
        let html = StandardShell::default().wrap("Reports", &render_selector(&list));
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Reports | Plugins directory</title>"));
        assert!(html.contains("<a href=\"?report=unapproved\">Plugins pending approval</a>"));
        assert!(render_selector(&[]).contains("no reports available"));
        assert!(render_denied("No <way>").contains("No &lt;way&gt;"));
    }
}
