use crate::ads::{source_for, sync_partner_ads};
use crate::cli::open_db;
use crate::error::Result;
use crate::settings::load_settings;

pub fn run(source: Option<String>) -> Result<()> {
    let settings = load_settings();
    let mut conn = open_db(&settings)?;
    let location = source.unwrap_or_else(|| settings.ads_source.clone());
    let source = source_for(&location, settings.http_timeout_secs)?;

    let summary = sync_partner_ads(&mut conn, source.as_ref(), chrono::Utc::now().timestamp())?;
    println!(
        "Synced partner ads from {}: {} inserted, {} removed, {} skipped",
        source.describe(),
        summary.inserted,
        summary.removed,
        summary.skipped
    );
    Ok(())
}
