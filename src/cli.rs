use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};

use crate::commands::{self, CommandReport, MetadataOptions};
use crate::scripta::metadata::DocumentMetadata;
use crate::scripta::query::FieldUpdates;

#[derive(Parser, Debug)]
#[command(
    name = "scripta",
    version,
    about = "Content-addressed personal document archive"
)]
pub struct Cli {
    /// Print the command report as JSON.
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one ingestion pass over the staging directory.
    Scan(ScanArgs),
    /// Ingest a single file from anywhere on disk.
    Add(AddArgs),
    /// Repeat ingestion passes until stopped.
    Watch(WatchArgs),
    /// Ask a running watch to exit after its current pass.
    Stop,
    List,
    Search(SearchArgs),
    Edit(EditArgs),
    Open(IndexArgs),
    Stats,
    Backup(BackupArgs),
    /// Suggest a description for a stored document.
    Suggest(SuggestArgs),
    Status,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FieldArgs {
    #[arg(long, default_value = "")]
    pub description: String,

    /// Declared date, YYYY-MM-DD.
    #[arg(long, default_value = "")]
    pub date: String,

    #[arg(long, default_value = "")]
    pub author: String,

    #[arg(long, default_value = "")]
    pub recipient: String,

    #[arg(long, default_value = "")]
    pub refnum: String,
}

impl FieldArgs {
    fn metadata(&self) -> DocumentMetadata {
        DocumentMetadata {
            description: self.description.clone(),
            date: self.date.clone(),
            author: self.author.clone(),
            recipient: self.recipient.clone(),
            refnum: self.refnum.clone(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Prompt for each document's fields instead of using the flags.
    #[arg(long, default_value_t = false)]
    pub interactive: bool,

    #[command(flatten)]
    pub fields: FieldArgs,
}

impl ScanArgs {
    fn metadata_options(&self) -> MetadataOptions {
        MetadataOptions {
            interactive: self.interactive,
            fields: self.fields.metadata(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    pub file: PathBuf,

    #[command(flatten)]
    pub fields: FieldArgs,
}

#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    #[command(flatten)]
    pub scan: ScanArgs,

    /// Seconds between passes; overrides config.
    #[arg(long)]
    pub interval_secs: Option<u64>,

    #[arg(long)]
    pub max_passes: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    pub query: String,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    pub index: u64,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub date: Option<String>,

    #[arg(long)]
    pub author: Option<String>,

    #[arg(long)]
    pub recipient: Option<String>,

    #[arg(long)]
    pub refnum: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct IndexArgs {
    pub index: u64,
}

#[derive(Args, Debug, Clone)]
pub struct BackupArgs {
    /// Zip destination; defaults to <SCRIPTA_HOME>/backup.zip.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct SuggestArgs {
    pub index: u64,

    /// Store the suggestion as the record's description.
    #[arg(long, default_value_t = false)]
    pub apply: bool,
}

fn render_text(report: &CommandReport) -> String {
    let mut out = format!(
        "{}: {}\n",
        report.command,
        if report.ok { "ok" } else { "failed" }
    );
    for detail in &report.details {
        out.push_str(&format!("  {detail}\n"));
    }
    if !report.issues.is_empty() {
        out.push_str("issues:\n");
        for issue in &report.issues {
            out.push_str(&format!("  - {issue}\n"));
        }
    }
    out
}

fn print_report(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", render_text(report));
    }
    if !report.ok {
        bail!(
            "{} finished with {} issue(s)",
            report.command,
            report.issues.len()
        );
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let report = match cli.command {
        Commands::Scan(args) => commands::scan::run(&commands::scan::ScanOptions {
            metadata: args.metadata_options(),
        })?,
        Commands::Add(args) => commands::add::run(&commands::add::AddOptions {
            file: args.file,
            metadata: args.fields.metadata(),
        })?,
        Commands::Watch(args) => commands::watch::run(&commands::watch::WatchCommandOptions {
            metadata: args.scan.metadata_options(),
            interval_secs: args.interval_secs,
            max_passes: args.max_passes,
        })?,
        Commands::Stop => commands::stop::run()?,
        Commands::List => commands::list::run()?,
        Commands::Search(args) => {
            commands::search::run(&commands::search::SearchOptions { query: args.query })?
        }
        Commands::Edit(args) => commands::edit::run(&commands::edit::EditOptions {
            index: args.index,
            updates: FieldUpdates {
                description: args.description,
                date: args.date,
                author: args.author,
                recipient: args.recipient,
                refnum: args.refnum,
            },
        })?,
        Commands::Open(args) => {
            commands::open::run(&commands::open::OpenOptions { index: args.index })?
        }
        Commands::Stats => commands::stats::run()?,
        Commands::Backup(args) => {
            commands::backup::run(&commands::backup::BackupOptions {
                output: args.output,
            })?
        }
        Commands::Suggest(args) => commands::suggest::run(&commands::suggest::SuggestOptions {
            index: args.index,
            apply: args.apply,
        })?,
        Commands::Status => commands::status::run()?,
    };

    print_report(&report, cli.json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn watch_accepts_metadata_flags() {
        let cli = Cli::try_parse_from([
            "scripta",
            "watch",
            "--date",
            "2024-01-05",
            "--max-passes",
            "2",
            "--json",
        ])
        .expect("parse");
        assert!(cli.json);
        let Commands::Watch(args) = cli.command else {
            panic!("expected watch");
        };
        assert_eq!(args.scan.fields.date, "2024-01-05");
        assert_eq!(args.max_passes, Some(2));
    }

    #[test]
    fn text_report_lists_issues_last() {
        let mut report = CommandReport::new("scan");
        report.detail("discovered=1");
        report.issue("failed file=a code=INVALID_DATE error=x");
        let text = render_text(&report);
        assert_eq!(
            text,
            "scan: failed\n  discovered=1\nissues:\n  - failed file=a code=INVALID_DATE error=x\n"
        );
    }
}
