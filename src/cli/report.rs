use colored::Colorize;
use comfy_table::{Cell as TableCell, Table};
use serde_json::{json, Value};

use crate::cli::{open_db, resolve_username, OutputFormat};
use crate::context::{load_actor, RequestContext};
use crate::error::{ReportError, Result};
use crate::html::{render_denied, render_report, render_selector, PageShell, StandardShell};
use crate::registry::{dispatch, Dispatch, Registry, ReportView};
use crate::report::{Cell, ReportDescriptor, SortDirection};
use crate::request::RequestParams;
use crate::settings::load_settings;

pub struct ReportArgs {
    pub name: Option<String>,
    pub as_user: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub sort: Option<String>,
    pub dir: Option<String>,
    pub query: Option<String>,
    pub format: OutputFormat,
}

pub fn show(args: ReportArgs) -> Result<()> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    let actor = load_actor(&conn, &resolve_username(args.as_user, &settings)?)?;
    let ctx = RequestContext::new(&conn, actor, &settings);
    let registry = Registry::builtin()?;

    let params = args
        .query
        .as_deref()
        .map(RequestParams::from_query)
        .unwrap_or_default()
        .merge(RequestParams {
            report: args.name,
            page: args.page,
            per_page: args.per_page,
            sort: args.sort,
            dir: args.dir,
        });

    let shell = StandardShell::default();
    match dispatch(&registry, &ctx, &params) {
        Ok(Dispatch::Selector(list)) => print_selector(&list, args.format, &shell),
        Ok(Dispatch::Report(view)) => print_view(&view, args.format, &shell),
        Err(e @ ReportError::PermissionDenied(_)) => {
            if args.format == OutputFormat::Html {
                println!("{}", shell.wrap("Permission denied", &render_denied(&e.to_string())));
            }
            Err(e)
        }
        Err(e) => Err(e),
    }
}

pub fn list(as_user: Option<String>, quick: bool, format: OutputFormat) -> Result<()> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    let actor = load_actor(&conn, &resolve_username(as_user, &settings)?)?;
    let ctx = RequestContext::new(&conn, actor, &settings);
    let registry = Registry::builtin()?;
    let reports = if quick {
        registry.quick_access(&ctx)
    } else {
        registry.viewable(&ctx)
    };
    print_selector(&reports, format, &StandardShell::default())
}

fn print_selector(
    reports: &[ReportDescriptor],
    format: OutputFormat,
    shell: &dyn PageShell,
) -> Result<()> {
    match format {
        OutputFormat::Html => println!("{}", shell.wrap("Reports", &render_selector(reports))),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(reports)?),
        OutputFormat::Table => {
            if reports.is_empty() {
                println!("There are no reports available to you.");
                return Ok(());
            }
            let mut table = Table::new();
            table.set_header(vec!["Report", "Title", "Description", "Quick access"]);
            for d in reports {
                table.add_row(vec![
                    TableCell::new(d.name),
                    TableCell::new(d.title),
                    TableCell::new(d.description),
                    TableCell::new(if d.quick_access { "yes" } else { "" }),
                ]);
            }
            println!("Reports\n{table}");
        }
    }
    Ok(())
}

fn cell_json(cell: &Cell) -> Value {
    match cell {
        Cell::Text(s) => Value::String(s.clone()),
        Cell::Link { href, label } => json!({ "label": label, "href": href }),
    }
}

pub(crate) fn view_json(view: &ReportView) -> Value {
    let paging = &view.page.paging;
    let columns: Vec<Value> = view
        .columns
        .iter()
        .map(|c| json!({ "key": c.key, "label": c.label, "sortable": c.is_sortable() }))
        .collect();
    let rows: Vec<Value> = view
        .page
        .rows
        .iter()
        .map(|row| {
            let fields = view
                .columns
                .iter()
                .map(|c| (c.key.to_string(), row.get(c.key).map(cell_json).unwrap_or(Value::Null)))
                .collect::<serde_json::Map<_, _>>();
            Value::Object(fields)
        })
        .collect();
    json!({
        "report": view.descriptor,
        "columns": columns,
        "paging": {
            "page": paging.page,
            "per_page": paging.per_page,
            "sort": paging.sort_key,
            "dir": paging.direction,
        },
        "total": view.page.total,
        "pages": view.page.page_count(),
        "rows": rows,
    })
}

fn print_view(view: &ReportView, format: OutputFormat, shell: &dyn PageShell) -> Result<()> {
    match format {
        OutputFormat::Html => {
            println!("{}", shell.wrap(view.descriptor.title, &render_report(view)))
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view_json(view))?),
        OutputFormat::Table => {
            let paging = &view.page.paging;
            let mut table = Table::new();
            table.set_header(
                view.columns
                    .iter()
                    .map(|c| match (paging.sort_key.as_deref() == Some(c.key), paging.direction) {
                        (true, SortDirection::Asc) => format!("{} \u{25b2}", c.label),
                        (true, SortDirection::Desc) => format!("{} \u{25bc}", c.label),
                        (false, _) => c.label.to_string(),
                    })
                    .collect::<Vec<_>>(),
            );
            for row in &view.page.rows {
                table.add_row(
                    view.columns
                        .iter()
                        .map(|c| TableCell::new(row.text(c.key)))
                        .collect::<Vec<_>>(),
                );
            }
            println!("{}", view.descriptor.title.bold());
            println!("{table}");
            println!(
                "Page {} of {} ({} rows)",
                paging.page.saturating_add(1),
                view.page.page_count(),
                view.page.total
            );
        }
    }
    Ok(())
}
