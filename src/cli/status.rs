use crate::db::get_connection;
use crate::error::Result;
use crate::models::ApprovalStatus;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();

    println!(
        "Default user: {}",
        if settings.default_user.is_empty() { "(not set)" } else { &settings.default_user }
    );
    println!("Data dir:     {}", settings.data_dir);
    println!("Database:     {}", db_path.display());
    println!("Page size:    {}", settings.per_page);
    println!(
        "Ads source:   {}",
        if settings.ads_source.is_empty() { "(not set)" } else { &settings.ads_source }
    );

    if !db_path.exists() {
        println!();
        println!("Database not found. Run `plugreport init` to set up.");
        return Ok(());
    }

    let conn = get_connection(&db_path)?;
    let users: i64 = conn.query_row("SELECT count(*) FROM users", [], |r| r.get(0))?;
    let plugins: i64 = conn.query_row("SELECT count(*) FROM plugins", [], |r| r.get(0))?;
    let pending: i64 = conn.query_row(
        "SELECT count(*) FROM plugins WHERE approved = ?1",
        [ApprovalStatus::Pending.code()],
        |r| r.get(0),
    )?;
    let reviews: i64 = conn.query_row("SELECT count(*) FROM reviews", [], |r| r.get(0))?;
    let ads: i64 = conn.query_row("SELECT count(*) FROM partner_ads", [], |r| r.get(0))?;

    println!();
    println!("Users:        {users}");
    println!("Plugins:      {plugins}");
    println!("Pending:      {pending}");
    println!("Reviews:      {reviews}");
    println!("Partner ads:  {ads}");
    Ok(())
}
