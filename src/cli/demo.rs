use rusqlite::{params, Connection};

use crate::cli::open_db;
use crate::db::init_db;
use crate::error::Result;
use crate::models::{CAP_APPROVE_PLUGIN, CAP_EDIT_OWN_PLUGINS, CAP_VIEW_REPORTS};
use crate::settings::load_settings;

const DAY: i64 = 86_400;

struct DemoUser {
    username: &'static str,
    firstname: &'static str,
    lastname: &'static str,
    siteadmin: bool,
    capabilities: &'static [&'static str],
}

const USERS: &[DemoUser] = &[
    DemoUser {
        username: "admin",
        firstname: "Site",
        lastname: "Admin",
        siteadmin: true,
        capabilities: &[],
    },
    DemoUser {
        username: "approver",
        firstname: "Petra",
        lastname: "Approver",
        siteadmin: false,
        capabilities: &[CAP_APPROVE_PLUGIN, CAP_VIEW_REPORTS],
    },
    DemoUser {
        username: "reviewer",
        firstname: "Rolf",
        lastname: "Reviewer",
        siteadmin: false,
        capabilities: &[CAP_VIEW_REPORTS],
    },
    DemoUser {
        username: "dana",
        firstname: "Dana",
        lastname: "Developer",
        siteadmin: false,
        capabilities: &[CAP_EDIT_OWN_PLUGINS],
    },
    DemoUser {
        username: "marco",
        firstname: "Marco",
        lastname: "Maintainer",
        siteadmin: false,
        capabilities: &[CAP_EDIT_OWN_PLUGINS],
    },
];

struct DemoPlugin {
    frankenstyle: &'static str,
    name: &'static str,
    category: &'static str,
    approved: i64,
    queued_days_ago: i64,
    lead: &'static str,
    /// Days ago each version was released, oldest first.
    releases: &'static [i64],
}

const PLUGINS: &[DemoPlugin] = &[
    DemoPlugin {
        frankenstyle: "mod_quizgame",
        name: "Quiz game",
        category: "Activities",
        approved: 1,
        queued_days_ago: 400,
        lead: "dana",
        releases: &[300, 120, 12],
    },
    DemoPlugin {
        frankenstyle: "block_progress",
        name: "Progress bar",
        category: "Blocks",
        approved: 1,
        queued_days_ago: 800,
        lead: "marco",
        releases: &[700, 45, 3],
    },
    DemoPlugin {
        frankenstyle: "filter_codehighlight",
        name: "Code highlighter",
        category: "Filters",
        approved: 1,
        queued_days_ago: 200,
        lead: "dana",
        releases: &[180, 20],
    },
    DemoPlugin {
        frankenstyle: "theme_lagoon",
        name: "Lagoon",
        category: "Themes",
        approved: 1,
        queued_days_ago: 90,
        lead: "marco",
        releases: &[80],
    },
    DemoPlugin {
        frankenstyle: "auth_magiclink",
        name: "Magic link login",
        category: "Authentication",
        approved: -1,
        queued_days_ago: 2,
        lead: "dana",
        releases: &[2],
    },
    DemoPlugin {
        frankenstyle: "report_engagement",
        name: "Engagement report",
        category: "Reports",
        approved: -1,
        queued_days_ago: 5,
        lead: "marco",
        releases: &[5],
    },
    DemoPlugin {
        frankenstyle: "local_sync",
        name: "Sync helper",
        category: "Local plugins",
        approved: -1,
        queued_days_ago: 9,
        lead: "marco",
        releases: &[9],
    },
    DemoPlugin {
        frankenstyle: "block_weather",
        name: "Weather",
        category: "Blocks",
        approved: -1,
        queued_days_ago: 14,
        lead: "dana",
        releases: &[14],
    },
    DemoPlugin {
        frankenstyle: "mod_flashcards",
        name: "Flashcards",
        category: "Activities",
        approved: -1,
        queued_days_ago: 21,
        lead: "marco",
        releases: &[21],
    },
    DemoPlugin {
        frankenstyle: "filter_emoji",
        name: "Emoji filter",
        category: "Filters",
        approved: 0,
        queued_days_ago: 30,
        lead: "dana",
        releases: &[30],
    },
    DemoPlugin {
        frankenstyle: "local_tweaks",
        name: "Site tweaks",
        category: "Local plugins",
        approved: 0,
        queued_days_ago: 60,
        lead: "marco",
        releases: &[60],
    },
];

pub struct DemoSummary {
    pub users: usize,
    pub plugins: usize,
    pub versions: usize,
    pub reviews: usize,
}

fn user_id(conn: &Connection, username: &str) -> Result<i64> {
    Ok(conn.query_row("SELECT id FROM users WHERE username = ?1", [username], |r| r.get(0))?)
}

fn insert_demo_data(conn: &mut Connection, now: i64) -> Result<DemoSummary> {
    let tx = conn.transaction()?;
    let mut versions = 0;
    let mut reviews = 0;

    for u in USERS {
        tx.execute(
            "INSERT INTO users (username, firstname, lastname, siteadmin) VALUES (?1, ?2, ?3, ?4)",
            params![u.username, u.firstname, u.lastname, u.siteadmin],
        )?;
        let id = tx.last_insert_rowid();
        for cap in u.capabilities {
            tx.execute(
                "INSERT INTO user_capabilities (userid, capability) VALUES (?1, ?2)",
                params![id, cap],
            )?;
        }
    }
    let reviewer = user_id(&tx, "reviewer")?;
    let approver = user_id(&tx, "approver")?;

    for (i, p) in PLUGINS.iter().enumerate() {
        let category: i64 =
            tx.query_row("SELECT id FROM categories WHERE name = ?1", [p.category], |r| r.get(0))?;
        let queued = now - p.queued_days_ago * DAY;
        let last_release = p.releases.last().map(|d| now - d * DAY).unwrap_or(0);
        tx.execute(
            "INSERT INTO plugins (frankenstyle, name, categoryid, approved, \
             timecreated, timequeued, timelastreleased) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?6)",
            params![p.frankenstyle, p.name, category, p.approved, queued, last_release],
        )?;
        let plugin_id = tx.last_insert_rowid();

        let lead = user_id(&tx, p.lead)?;
        tx.execute(
            "INSERT INTO contributors (pluginid, userid, maintainer) VALUES (?1, ?2, 1)",
            params![plugin_id, lead],
        )?;
        // Every third plugin gets the other developer as a contributor.
        if i % 3 == 0 {
            let other = user_id(&tx, if p.lead == "dana" { "marco" } else { "dana" })?;
            tx.execute(
                "INSERT INTO contributors (pluginid, userid, maintainer) VALUES (?1, ?2, 0)",
                params![plugin_id, other],
            )?;
        }

        for (n, days_ago) in p.releases.iter().enumerate() {
            let released = now - days_ago * DAY;
            let version = 2024_01_01_00 + (n as i64) * 100 + i as i64;
            tx.execute(
                "INSERT INTO versions (pluginid, version, releasename, timecreated) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![plugin_id, version, format!("{}.{}", n + 1, i % 4), released],
            )?;
            let version_id = tx.last_insert_rowid();
            versions += 1;

            // The reviewer looks at every release of approved plugins; the
            // approver only at the latest.
            if p.approved == 1 {
                tx.execute(
                    "INSERT INTO reviews (versionid, userid, timereviewed, status) \
                     VALUES (?1, ?2, ?3, 1)",
                    params![version_id, reviewer, released + DAY],
                )?;
                reviews += 1;
                if n + 1 == p.releases.len() {
                    tx.execute(
                        "INSERT INTO reviews (versionid, userid, timereviewed, status) \
                         VALUES (?1, ?2, ?3, 1)",
                        params![version_id, approver, released + 2 * DAY],
                    )?;
                    reviews += 1;
                }
            }
        }

        if p.approved == 1 {
            for month in 0..6i64 {
                let downloads = 150 * (PLUGINS.len() - i) as i64 + month * 17;
                tx.execute(
                    "INSERT INTO plugin_stats (pluginid, timeperiod, downloads) \
                     VALUES (?1, ?2, ?3)",
                    params![plugin_id, now - month * 30 * DAY, downloads],
                )?;
            }
        }
    }
    tx.commit()?;

    Ok(DemoSummary {
        users: USERS.len(),
        plugins: PLUGINS.len(),
        versions,
        reviews,
    })
}

pub fn run() -> Result<()> {
    let settings = load_settings();
    let mut conn = open_db(&settings)?;
    init_db(&conn)?;

    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM plugins WHERE frankenstyle = ?1)",
        [PLUGINS[0].frankenstyle],
        |r| r.get(0),
    )?;
    if exists {
        println!("Demo data already loaded (plugin '{}' exists).", PLUGINS[0].frankenstyle);
        return Ok(());
    }

    let summary = insert_demo_data(&mut conn, chrono::Utc::now().timestamp())?;

    println!("Demo data loaded!");
    println!("  Users:     {}", summary.users);
    println!("  Plugins:   {}", summary.plugins);
    println!("  Versions:  {}", summary.versions);
    println!("  Reviews:   {}", summary.reviews);
    println!();
    println!("Try these next:");
    println!("  plugreport reports --as approver");
    println!("  plugreport report unapproved --as approver --per-page 2");
    println!("  plugreport report reviews --as reviewer --sort plugin --dir desc");
    println!("  plugreport report myplugins --as dana --format html");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{load_actor, RequestContext};
    use crate::db::fixtures::test_db;
    use crate::registry::{dispatch, Dispatch, Registry};
    use crate::request::RequestParams;
    use crate::settings::Settings;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_demo_creates_data() {
        let (_dir, mut conn) = test_db();
        let summary = insert_demo_data(&mut conn, NOW).unwrap();
        let count = |table: &str| -> i64 {
            conn.query_row(&format!("SELECT count(*) FROM {table}"), [], |r| r.get(0))
                .unwrap()
        };
        let plugins = count("plugins");
        let reviews = count("reviews");
        assert_eq!(plugins as usize, PLUGINS.len());
        assert_eq!(reviews as usize, summary.reviews);
        assert_eq!(summary.users, USERS.len());
    }

    #[test]
    fn test_every_report_has_demo_rows() {
        let (_dir, mut conn) = test_db();
        insert_demo_data(&mut conn, NOW).unwrap();
        let settings = Settings::default();
        let registry = Registry::builtin().unwrap();
        let cases = [
            ("unapproved", "approver", 5),
            ("needswork", "approver", 2),
            ("recentreleases", "reviewer", 3),
            ("downloads", "reviewer", 4),
            ("myplugins", "dana", 7),
        ];
        for (report, username, expected) in cases {
            let actor = load_actor(&conn, username).unwrap();
            let ctx = RequestContext::new(&conn, actor, &settings).at(NOW);
            let params = RequestParams::from_query(&format!("report={report}"));
            let Dispatch::Report(view) = dispatch(&registry, &ctx, &params).unwrap() else {
                panic!("{report} should render for {username}");
            };
            assert_eq!(view.page.total, expected, "{report}");
        }
    }

    #[test]
    fn test_reviews_collapse_in_demo() {
        let (_dir, mut conn) = test_db();
        insert_demo_data(&mut conn, NOW).unwrap();
        let settings = Settings::default();
        let registry = Registry::builtin().unwrap();
        let actor = load_actor(&conn, "reviewer").unwrap();
        let ctx = RequestContext::new(&conn, actor, &settings).at(NOW);
        let Dispatch::Report(view) =
            dispatch(&registry, &ctx, &RequestParams::from_query("report=reviews")).unwrap()
        else {
            panic!("reviews should render");
        };
        // 4 approved plugins, each reviewed by the reviewer and the approver.
        assert_eq!(view.page.total, 8);
    }
}
