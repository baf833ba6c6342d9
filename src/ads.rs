//! Partner-ads sync: pull the partner list from a JSON feed and replace the
//! `partner_ads` table with it.

use std::path::PathBuf;
use std::time::Duration;

use rusqlite::Connection;

use crate::error::{ReportError, Result};
use crate::models::PartnerAd;

pub trait AdSource {
    fn describe(&self) -> String;
    fn fetch(&self) -> Result<Vec<PartnerAd>>;
}

pub struct HttpSource {
    pub url: String,
    pub timeout: Duration,
}

impl AdSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn fetch(&self) -> Result<Vec<PartnerAd>> {
        let client = reqwest::blocking::Client::builder().timeout(self.timeout).build()?;
        let ads = client
            .get(&self.url)
            .send()?
            .error_for_status()?
            .json::<Vec<PartnerAd>>()?;
        Ok(ads)
    }
}

pub struct FileSource {
    pub path: PathBuf,
}

impl AdSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<Vec<PartnerAd>> {
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Pick a source for a `--source` value or the configured one.
pub fn source_for(location: &str, timeout_secs: u64) -> Result<Box<dyn AdSource>> {
    let location = location.trim();
    if location.is_empty() {
        return Err(ReportError::Settings(
            "no partner-ads source configured (set ads_source or pass --source)".to_string(),
        ));
    }
    if location.starts_with("http://") || location.starts_with("https://") {
        Ok(Box::new(HttpSource {
            url: location.to_string(),
            timeout: Duration::from_secs(timeout_secs),
        }))
    } else {
        Ok(Box::new(FileSource {
            path: PathBuf::from(crate::settings::shellexpand_path(location)),
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSummary {
    pub inserted: usize,
    pub skipped: usize,
    pub removed: usize,
}

/// Replace all partner ads with what `source` returns. A failed fetch leaves
/// the table untouched; the delete and inserts commit together.
pub fn sync_partner_ads(
    conn: &mut Connection,
    source: &dyn AdSource,
    now: i64,
) -> Result<SyncSummary> {
    let ads = source.fetch()?;
    tracing::info!(source = %source.describe(), fetched = ads.len(), "fetched partner ads");

    let tx = conn.transaction()?;
    let removed = tx.execute("DELETE FROM partner_ads", [])?;
    let mut inserted = 0;
    let mut skipped = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO partner_ads (partnerid, name, imageurl, url, country, timesynced) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for ad in &ads {
            if ad.partnerid.trim().is_empty() || ad.url.trim().is_empty() {
                tracing::warn!(name = %ad.name, "skipping partner ad without id or url");
                skipped += 1;
                continue;
            }
            stmt.execute(rusqlite::params![
                ad.partnerid,
                ad.name,
                ad.imageurl,
                ad.url,
                ad.country,
                now
            ])?;
            inserted += 1;
        }
    }
    tx.commit()?;

    Ok(SyncSummary {
        inserted,
        skipped,
        removed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures::test_db;

    struct StaticSource(Vec<PartnerAd>);

    impl AdSource for StaticSource {
        fn describe(&self) -> String {
            "static".to_string()
        }

        fn fetch(&self) -> Result<Vec<PartnerAd>> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    impl AdSource for FailingSource {
        fn describe(&self) -> String {
            "failing".to_string()
        }

        fn fetch(&self) -> Result<Vec<PartnerAd>> {
            Err(ReportError::Io(std::io::Error::other("feed unavailable")))
        }
    }

    fn ad(id: &str, url: &str) -> PartnerAd {
        PartnerAd {
            partnerid: id.to_string(),
            name: format!("Partner {id}"),
            imageurl: None,
            url: url.to_string(),
            country: Some("AU".to_string()),
        }
    }

    fn partner_ids(conn: &Connection) -> Vec<String> {
        conn.prepare("SELECT partnerid FROM partner_ads ORDER BY partnerid")
            .unwrap()
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_sync_replaces_table() {
        let (_dir, mut conn) = test_db();
        let first = StaticSource(vec![ad("a", "https://a.test"), ad("b", "https://b.test")]);
        let summary = sync_partner_ads(&mut conn, &first, 100).unwrap();
        assert_eq!(summary, SyncSummary { inserted: 2, skipped: 0, removed: 0 });

        let second = StaticSource(vec![
            ad("c", "https://c.test"),
            ad("", "https://x.test"),
            ad("d", " "),
        ]);
        let summary = sync_partner_ads(&mut conn, &second, 200).unwrap();
        assert_eq!(summary, SyncSummary { inserted: 1, skipped: 2, removed: 2 });
        assert_eq!(partner_ids(&conn), vec!["c"]);
        let synced: i64 = conn
            .query_row("SELECT timesynced FROM partner_ads", [], |r| r.get(0))
            .unwrap();
        assert_eq!(synced, 200);
    }

    #[test]
    fn test_failed_fetch_leaves_table_untouched() {
        let (_dir, mut conn) = test_db();
        sync_partner_ads(&mut conn, &StaticSource(vec![ad("a", "https://a.test")]), 1).unwrap();
        let err = sync_partner_ads(&mut conn, &FailingSource, 2).unwrap_err();
        assert!(err.to_string().contains("feed unavailable"));
        assert_eq!(partner_ids(&conn), vec!["a"]);
    }

    #[test]
    fn test_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ads.json");
        std::fs::write(
            &path,
            r#"[{"partnerid": "p1", "name": "One", "url": "https://one.test", "country": "NZ"}]"#,
        )
        .unwrap();
        let source = source_for(path.to_str().unwrap(), 5).unwrap();
        let ads = source.fetch().unwrap();
        assert_eq!(ads.len(), 1);
        assert_eq!(ads[0].country.as_deref(), Some("NZ"));

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(source.fetch(), Err(ReportError::Json(_))));
    }

    #[test]
    fn test_source_selection() {
        assert!(source_for("  ", 5).is_err());
        assert_eq!(
            source_for("https://feed.test/ads.json", 5).unwrap().describe(),
            "https://feed.test/ads.json"
        );
    }
}
