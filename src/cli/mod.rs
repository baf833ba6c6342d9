pub mod demo;
pub mod init;
pub mod report;
pub mod status;
pub mod sync;

use clap::{Parser, Subcommand, ValueEnum};
use rusqlite::Connection;

use crate::db::get_connection;
use crate::error::{ReportError, Result};
use crate::settings::Settings;

#[derive(Parser)]
#[command(name = "plugreport", about = "Reports over a plugins directory database.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Html,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the settings file and the database.
    Init {
        /// Path for plugreport data (default: ~/.local/share/plugreport)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Username used when --as is not given
        #[arg(long = "default-user")]
        default_user: Option<String>,
    },
    /// Load sample users, plugins, versions, reviews and download stats.
    Demo,
    /// List the reports you can view.
    Reports {
        /// Username to act as
        #[arg(long = "as")]
        as_user: Option<String>,
        /// Only reports marked for quick access
        #[arg(long)]
        quick: bool,
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Show one page of a report. Without a name, lists available reports.
    Report {
        /// Report name, e.g. unapproved
        name: Option<String>,
        /// Username to act as
        #[arg(long = "as")]
        as_user: Option<String>,
        /// Page number, starting at 0
        #[arg(long)]
        page: Option<u64>,
        /// Rows per page
        #[arg(long = "per-page")]
        per_page: Option<u64>,
        /// Column key to sort by
        #[arg(long)]
        sort: Option<String>,
        /// Sort direction: asc or desc
        #[arg(long)]
        dir: Option<String>,
        /// Request query string, e.g. "report=reviews&page=1&sort=plugin&dir=desc"
        #[arg(long)]
        query: Option<String>,
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Replace the partner ads with the contents of the partner feed.
    SyncAds {
        /// Feed URL or JSON file (default: ads_source setting)
        #[arg(long)]
        source: Option<String>,
    },
    /// Show settings and database summary.
    Status,
}

pub(crate) fn open_db(settings: &Settings) -> Result<Connection> {
    let path = settings.db_path();
    if !path.exists() {
        return Err(ReportError::Settings(format!(
            "No database found at {}\nRun `plugreport init` to create one.",
            path.display()
        )));
    }
    get_connection(&path)
}

pub(crate) fn resolve_username(as_user: Option<String>, settings: &Settings) -> Result<String> {
    match as_user {
        Some(u) if !u.trim().is_empty() => Ok(u.trim().to_string()),
        _ if !settings.default_user.is_empty() => Ok(settings.default_user.clone()),
        _ => Err(ReportError::Settings(
            "No user given. Pass --as <username> or set default_user.".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_username() {
        let mut settings = Settings::default();
        assert!(resolve_username(None, &settings).is_err());
        settings.default_user = "admin".to_string();
        assert_eq!(resolve_username(None, &settings).unwrap(), "admin");
        assert_eq!(resolve_username(Some(" rae ".to_string()), &settings).unwrap(), "rae");
        assert_eq!(resolve_username(Some("".to_string()), &settings).unwrap(), "admin");
    }

    #[test]
    fn test_cli_parses_report_command() {
        let cli = Cli::try_parse_from([
            "plugreport",
            "report",
            "unapproved",
            "--as",
            "admin",
            "--page",
            "2",
            "--format",
            "html",
        ])
        .unwrap();
        match cli.command {
            Commands::Report { name, as_user, page, format, .. } => {
                assert_eq!(name.as_deref(), Some("unapproved"));
                assert_eq!(as_user.as_deref(), Some("admin"));
                assert_eq!(page, Some(2));
                assert_eq!(format, OutputFormat::Html);
            }
            _ => panic!("expected report command"),
        }
    }
}
