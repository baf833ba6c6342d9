use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    firstname TEXT NOT NULL DEFAULT '',
    lastname TEXT NOT NULL DEFAULT '',
    siteadmin INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS user_capabilities (
    id INTEGER PRIMARY KEY,
    userid INTEGER NOT NULL,
    capability TEXT NOT NULL,
    UNIQUE (userid, capability),
    FOREIGN KEY (userid) REFERENCES users(id)
);

CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS plugins (
    id INTEGER PRIMARY KEY,
    frankenstyle TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    categoryid INTEGER,
    approved INTEGER NOT NULL DEFAULT -1,
    timecreated INTEGER NOT NULL DEFAULT 0,
    timequeued INTEGER NOT NULL DEFAULT 0,
    timelastreleased INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (categoryid) REFERENCES categories(id)
);

CREATE TABLE IF NOT EXISTS contributors (
    id INTEGER PRIMARY KEY,
    pluginid INTEGER NOT NULL,
    userid INTEGER NOT NULL,
    maintainer INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (pluginid) REFERENCES plugins(id),
    FOREIGN KEY (userid) REFERENCES users(id)
);

CREATE TABLE IF NOT EXISTS versions (
    id INTEGER PRIMARY KEY,
    pluginid INTEGER NOT NULL,
    version INTEGER NOT NULL,
    releasename TEXT,
    timecreated INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (pluginid) REFERENCES plugins(id)
);

CREATE TABLE IF NOT EXISTS reviews (
    id INTEGER PRIMARY KEY,
    versionid INTEGER NOT NULL,
    userid INTEGER NOT NULL,
    timereviewed INTEGER NOT NULL DEFAULT 0,
    status INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (versionid) REFERENCES versions(id),
    FOREIGN KEY (userid) REFERENCES users(id)
);

CREATE TABLE IF NOT EXISTS plugin_stats (
    id INTEGER PRIMARY KEY,
    pluginid INTEGER NOT NULL,
    timeperiod INTEGER NOT NULL,
    downloads INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (pluginid) REFERENCES plugins(id)
);

CREATE TABLE IF NOT EXISTS partner_ads (
    id INTEGER PRIMARY KEY,
    partnerid TEXT NOT NULL,
    name TEXT NOT NULL,
    imageurl TEXT,
    url TEXT NOT NULL,
    country TEXT,
    timesynced INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS plugins_approved_idx ON plugins (approved);
CREATE INDEX IF NOT EXISTS contributors_user_idx ON contributors (userid);
CREATE INDEX IF NOT EXISTS reviews_version_idx ON reviews (versionid);
";

const DEFAULT_CATEGORIES: &[&str] = &[
    "Activities",
    "Blocks",
    "Filters",
    "Themes",
    "Authentication",
    "Reports",
    "Local plugins",
    "Other",
];

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    let count: i64 = conn.query_row("SELECT count(*) FROM categories", [], |row| row.get(0))?;
    if count == 0 {
        for name in DEFAULT_CATEGORIES {
            conn.execute("INSERT INTO categories (name) VALUES (?1)", [name])?;
        }
    }
    Ok(())
}
