use std::sync::OnceLock;

use regex::Regex;

use crate::context::RequestContext;
use crate::error::{ReportError, Result};
use crate::report::{builtin, Column, Page, Report, ReportDefinition, ReportDescriptor};
use crate::request::RequestParams;

pub type ReportFactory = fn() -> ReportDefinition;

fn report_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9_]+$").expect("static regex"))
}

pub fn is_valid_report_name(name: &str) -> bool {
    report_name_re().is_match(name)
}

/// Report name to factory, in registration order.
#[derive(Default)]
pub struct Registry {
    entries: Vec<(&'static str, ReportFactory)>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Result<Self> {
        let mut registry = Self::new();
        registry.register(builtin::unapproved)?;
        registry.register(builtin::needs_work)?;
        registry.register(builtin::reviews)?;
        registry.register(builtin::recent_releases)?;
        registry.register(builtin::downloads)?;
        registry.register(builtin::my_plugins)?;
        Ok(registry)
    }

    pub fn register(&mut self, factory: ReportFactory) -> Result<()> {
        let def = factory();
        def.validate()?;
        if !is_valid_report_name(def.name) {
            return Err(ReportError::InvalidDefinition {
                name: def.name.to_string(),
                reason: "name must match [a-z0-9_]+".to_string(),
            });
        }
        if self.entries.iter().any(|(name, _)| *name == def.name) {
            return Err(ReportError::InvalidDefinition {
                name: def.name.to_string(),
                reason: "already registered".to_string(),
            });
        }
        self.entries.push((def.name, factory));
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }

    /// A fresh definition for `name`.
    pub fn resolve(&self, name: &str) -> Option<ReportDefinition> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, factory)| factory())
    }

    /// Descriptors of every report the actor may view.
    pub fn viewable(&self, ctx: &RequestContext<'_>) -> Vec<ReportDescriptor> {
        self.entries
            .iter()
            .map(|(_, factory)| factory().descriptor(&ctx.actor))
            .filter(|d| d.can_view)
            .collect()
    }

    /// The navigation shortlist: viewable reports flagged quick-access.
    pub fn quick_access(&self, ctx: &RequestContext<'_>) -> Vec<ReportDescriptor> {
        self.viewable(ctx).into_iter().filter(|d| d.quick_access).collect()
    }
}

/// A rendered report page.
#[derive(Debug, Clone)]
pub struct ReportView {
    pub descriptor: ReportDescriptor,
    pub columns: Vec<Column>,
    pub page: Page,
}

#[derive(Debug, Clone)]
pub enum Dispatch {
    Selector(Vec<ReportDescriptor>),
    Report(ReportView),
}

/// Resolve the requested report, enforce access and produce the page.
pub fn dispatch(
    registry: &Registry,
    ctx: &RequestContext<'_>,
    params: &RequestParams,
) -> Result<Dispatch> {
    let Some(name) = params.report_name() else {
        return Ok(Dispatch::Selector(registry.viewable(ctx)));
    };
    let def = match is_valid_report_name(name).then(|| registry.resolve(name)).flatten() {
        Some(def) => def,
        None => {
            tracing::warn!(report = name, "unknown report, showing selector");
            return Ok(Dispatch::Selector(registry.viewable(ctx)));
        }
    };

    let report = Report::open(&def, ctx)?;
    let page = report.page(params.paging(ctx.settings.per_page))?;
    Ok(Dispatch::Report(ReportView {
        descriptor: def.descriptor(&ctx.actor),
        columns: report.columns().to_vec(),
        page,
    }))
}
