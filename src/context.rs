use std::collections::HashSet;

use rusqlite::{Connection, OptionalExtension};

use crate::error::{ReportError, Result};
use crate::fmt::fullname;
use crate::models::Actor;
use crate::settings::Settings;
use crate::store::RecordStore;

/// Everything one report request needs, passed explicitly.
pub struct RequestContext<'a> {
    pub store: &'a dyn RecordStore,
    pub actor: Actor,
    pub settings: &'a Settings,
    /// Fixed for the whole request so count and fetch see the same window.
    pub now: i64,
}

impl<'a> RequestContext<'a> {
    pub fn new(store: &'a dyn RecordStore, actor: Actor, settings: &'a Settings) -> Self {
        Self {
            store,
            actor,
            settings,
            now: chrono::Utc::now().timestamp(),
        }
    }

    pub fn at(mut self, now: i64) -> Self {
        self.now = now;
        self
    }
}

pub fn load_actor(conn: &Connection, username: &str) -> Result<Actor> {
    let row: Option<(i64, String, String, String, bool)> = conn
        .query_row(
            "SELECT id, username, firstname, lastname, siteadmin FROM users WHERE username = ?1",
            [username],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
        )
        .optional()?;
    let Some((id, username, first, last, siteadmin)) = row else {
        return Err(ReportError::UnknownUser(username.to_string()));
    };

    let mut stmt = conn.prepare("SELECT capability FROM user_capabilities WHERE userid = ?1")?;
    let capabilities: HashSet<String> = stmt
        .query_map([id], |r| r.get(0))?
        .collect::<std::result::Result<_, _>>()?;

    tracing::debug!(username = %username, caps = capabilities.len(), siteadmin, "loaded actor");
    Ok(Actor {
        id,
        username,
        fullname: fullname(&first, &last),
        siteadmin,
        capabilities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures::{admin, test_db, user};
    use crate::models::{CapabilityCheck, CAP_APPROVE_PLUGIN, CAP_VIEW_REPORTS};

    #[test]
    fn test_load_actor_with_capabilities() {
        let (_dir, conn) = test_db();
        user(&conn, "rae", "Rae", "Viewer", &[CAP_VIEW_REPORTS]);
        let actor = load_actor(&conn, "rae").unwrap();
        assert_eq!(actor.fullname, "Rae Viewer");
        assert!(actor.has_capability(CAP_VIEW_REPORTS));
        assert!(!actor.has_capability(CAP_APPROVE_PLUGIN));
    }

    #[test]
    fn test_load_siteadmin() {
        let (_dir, conn) = test_db();
        admin(&conn, "root");
        let actor = load_actor(&conn, "root").unwrap();
        assert!(actor.siteadmin);
        assert!(actor.has_capability(CAP_APPROVE_PLUGIN));
    }

    #[test]
    fn test_unknown_user() {
        let (_dir, conn) = test_db();
        let err = load_actor(&conn, "ghost").unwrap_err();
        assert!(matches!(err, ReportError::UnknownUser(ref u) if u == "ghost"));
    }
}
