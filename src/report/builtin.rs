use crate::fmt::{count, fullname};
use crate::models::{
    maintainer_role_label, ApprovalStatus, CAP_APPROVE_PLUGIN, CAP_EDIT_OWN_PLUGINS,
    CAP_VIEW_REPORTS,
};
use crate::store::Record;

use super::{Cell, Column, Filter, Formatter, QuerySource, ReportDefinition, ResultRow};

const DAY: i64 = 86_400;

/// Joins the first lead maintainer of `p` as `u`.
macro_rules! lead_maintainer_join {
    () => {
        "LEFT JOIN contributors lm ON lm.id = ( \
         SELECT MIN(c2.id) FROM contributors c2 WHERE c2.pluginid = p.id AND c2.maintainer = 1) \
         LEFT JOIN users u ON u.id = lm.userid"
    };
}

fn or_dash(s: String) -> String {
    if s.trim().is_empty() {
        "-".to_string()
    } else {
        s
    }
}

// ---------------------------------------------------------------------------
// Approval queues
// ---------------------------------------------------------------------------

const QUEUE_COLUMNS: &[Column] = &[
    Column::sortable("plugin", "Plugin", &["p.name"]),
    Column::sortable("category", "Category", &["c.name"]),
    Column::sortable("leadmaintainer", "Lead maintainer", &["u.lastname", "u.firstname"]),
    Column::sortable("timequeued", "Time queued", &["p.timequeued"]),
];

fn queue_row(r: &Record, fmt: &Formatter<'_>) -> ResultRow {
    ResultRow::new()
        .with("plugin", fmt.plugin_link(&r.text(0), &r.text(1)))
        .with("category", Cell::text(or_dash(r.text(2))))
        .with("leadmaintainer", Cell::text(fullname(&r.text(3), &r.text(4))))
        .with("timequeued", fmt.date(r.int(5)))
}

fn approval_queue(
    name: &'static str,
    title: &'static str,
    description: &'static str,
    status: ApprovalStatus,
    quick_access: bool,
) -> ReportDefinition {
    ReportDefinition {
        name,
        title,
        description,
        capability: CAP_APPROVE_PLUGIN,
        quick_access,
        columns: QUEUE_COLUMNS.to_vec(),
        source: QuerySource {
            select: "p.frankenstyle, p.name, c.name, u.firstname, u.lastname, p.timequeued",
            from: concat!(
                "plugins p LEFT JOIN categories c ON c.id = p.categoryid ",
                lead_maintainer_join!()
            ),
            base_where: None,
            group_by: None,
        },
        filter: Filter::Approval(status),
        default_order: &["p.timequeued DESC", "p.id DESC"],
        transform: queue_row,
    }
}

pub fn unapproved() -> ReportDefinition {
    approval_queue(
        "unapproved",
        "Plugins pending approval",
        "Plugins submitted to the directory and waiting for an approval decision.",
        ApprovalStatus::Pending,
        true,
    )
}

pub fn needs_work() -> ReportDefinition {
    approval_queue(
        "needswork",
        "Plugins needing more work",
        "Plugins sent back to their maintainers before they can be approved.",
        ApprovalStatus::NeedsWork,
        false,
    )
}

// ---------------------------------------------------------------------------
// Reviews
// ---------------------------------------------------------------------------

fn review_row(r: &Record, fmt: &Formatter<'_>) -> ResultRow {
    let release = r.text(5);
    let version = if release.is_empty() {
        r.text(4)
    } else {
        format!("{release} ({})", r.int(4))
    };
    ResultRow::new()
        .with("plugin", fmt.plugin_link(&r.text(0), &r.text(1)))
        .with("reviewer", Cell::text(fullname(&r.text(2), &r.text(3))))
        .with("version", Cell::text(version))
        .with("timereviewed", fmt.date(r.int(6)))
}

/// Most recent review per plugin and reviewer.
pub fn reviews() -> ReportDefinition {
    ReportDefinition {
        name: "reviews",
        title: "Latest plugin reviews",
        description: "The most recent review each reviewer has written for each plugin.",
        capability: CAP_VIEW_REPORTS,
        quick_access: true,
        columns: vec![
            Column::sortable("plugin", "Plugin", &["p.name"]),
            Column::sortable("reviewer", "Reviewer", &["u.lastname", "u.firstname"]),
            Column::sortable("version", "Version", &["v.version"]),
            Column::sortable("timereviewed", "Reviewed", &["r.timereviewed"]),
        ],
        source: QuerySource {
            select: "p.frankenstyle, p.name, u.firstname, u.lastname, \
                     v.version, v.releasename, r.timereviewed",
            from: "reviews r JOIN versions v ON v.id = r.versionid \
                   JOIN plugins p ON p.id = v.pluginid \
                   JOIN users u ON u.id = r.userid",
            base_where: Some(
                "r.id = (SELECT r2.id FROM reviews r2 JOIN versions v2 ON v2.id = r2.versionid \
                 WHERE v2.pluginid = v.pluginid AND r2.userid = r.userid \
                 ORDER BY r2.timereviewed DESC, r2.id DESC LIMIT 1)",
            ),
            group_by: None,
        },
        filter: Filter::All,
        default_order: &["r.timereviewed DESC", "r.id DESC"],
        transform: review_row,
    }
}

// ---------------------------------------------------------------------------
// Recent releases
// ---------------------------------------------------------------------------

fn release_row(r: &Record, fmt: &Formatter<'_>) -> ResultRow {
    ResultRow::new()
        .with("plugin", fmt.plugin_link(&r.text(0), &r.text(1)))
        .with("release", Cell::text(or_dash(r.text(3))))
        .with("version", Cell::text(r.text(2)))
        .with("leadmaintainer", Cell::text(fullname(&r.text(5), &r.text(6))))
        .with("timereleased", fmt.date(r.int(4)))
}

pub fn recent_releases() -> ReportDefinition {
    ReportDefinition {
        name: "recentreleases",
        title: "Recently released versions",
        description: "Versions of approved plugins released during the last 30 days.",
        capability: CAP_VIEW_REPORTS,
        quick_access: false,
        columns: vec![
            Column::sortable("plugin", "Plugin", &["p.name"]),
            Column::sortable("release", "Release", &["v.releasename", "v.version"]),
            Column::sortable("version", "Version", &["v.version"]),
            Column::sortable("leadmaintainer", "Lead maintainer", &["u.lastname", "u.firstname"]),
            Column::sortable("timereleased", "Released", &["v.timecreated"]),
        ],
        source: QuerySource {
            select: "p.frankenstyle, p.name, v.version, v.releasename, v.timecreated, \
                     u.firstname, u.lastname",
            from: concat!(
                "versions v JOIN plugins p ON p.id = v.pluginid ",
                lead_maintainer_join!()
            ),
            base_where: Some("p.approved = 1"),
            group_by: None,
        },
        filter: Filter::Since {
            column: "v.timecreated",
            window_secs: 30 * DAY,
        },
        default_order: &["v.timecreated DESC", "v.id DESC"],
        transform: release_row,
    }
}

// ---------------------------------------------------------------------------
// Downloads
// ---------------------------------------------------------------------------

fn downloads_row(r: &Record, fmt: &Formatter<'_>) -> ResultRow {
    ResultRow::new()
        .with("plugin", fmt.plugin_link(&r.text(0), &r.text(1)))
        .with("category", Cell::text(or_dash(r.text(2))))
        .with("downloads", Cell::text(count(r.int(3))))
}

pub fn downloads() -> ReportDefinition {
    ReportDefinition {
        name: "downloads",
        title: "Most downloaded plugins",
        description: "Download totals per plugin over the last 90 days.",
        capability: CAP_VIEW_REPORTS,
        quick_access: false,
        columns: vec![
            Column::sortable("plugin", "Plugin", &["p.name"]),
            Column::sortable("category", "Category", &["c.name"]),
            Column::sortable("downloads", "Downloads", &["SUM(s.downloads)"]),
        ],
        source: QuerySource {
            select: "p.frankenstyle, p.name, c.name, SUM(s.downloads)",
            from: "plugin_stats s JOIN plugins p ON p.id = s.pluginid \
                   LEFT JOIN categories c ON c.id = p.categoryid",
            base_where: None,
            group_by: Some("p.id, p.frankenstyle, p.name, c.name"),
        },
        filter: Filter::Since {
            column: "s.timeperiod",
            window_secs: 90 * DAY,
        },
        default_order: &["SUM(s.downloads) DESC", "p.id ASC"],
        transform: downloads_row,
    }
}

// ---------------------------------------------------------------------------
// My plugins
// ---------------------------------------------------------------------------

fn my_plugin_row(r: &Record, fmt: &Formatter<'_>) -> ResultRow {
    let status = ApprovalStatus::from_code(r.int(2))
        .map(ApprovalStatus::label)
        .unwrap_or("Unknown");
    ResultRow::new()
        .with("plugin", fmt.plugin_link(&r.text(0), &r.text(1)))
        .with("status", Cell::text(status))
        .with("role", Cell::text(maintainer_role_label(r.int(3))))
        .with("timelastreleased", fmt.date(r.int(4)))
}

pub fn my_plugins() -> ReportDefinition {
    ReportDefinition {
        name: "myplugins",
        title: "My plugins",
        description: "Plugins you maintain or contribute to.",
        capability: CAP_EDIT_OWN_PLUGINS,
        quick_access: true,
        columns: vec![
            Column::sortable("plugin", "Plugin", &["p.name"]),
            Column::sortable("status", "Status", &["p.approved"]),
            Column::fixed("role", "Role"),
            Column::sortable("timelastreleased", "Last release", &["p.timelastreleased"]),
        ],
        source: QuerySource {
            select: "p.frankenstyle, p.name, p.approved, mc.maintainer, p.timelastreleased",
            from: "contributors mc JOIN plugins p ON p.id = mc.pluginid",
            base_where: None,
            group_by: None,
        },
        filter: Filter::ActorIs { column: "mc.userid" },
        default_order: &["p.name ASC", "p.id ASC"],
        transform: my_plugin_row,
    }
}
