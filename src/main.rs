//! CLI entry point for `billdrop`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use billdrop::export::{export_pdf_attachments, preview_pdf_attachments};
use billdrop::host::fs::FsDrive;
use billdrop::host::mbox::MboxMailbox;
use billdrop::model::bill::BillLayout;
use billdrop::search::Query;

#[derive(Parser)]
#[command(
    name = "billdrop",
    version,
    about = "Export PDF bill attachments from MBOX mail archives and scan billing data out of the PDFs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Export PDF attachments from matching threads into a new folder
    Export {
        /// MBOX archive to search
        mbox: PathBuf,
        /// Search query (default from config), e.g. 'from:"JPS" has:attachment'
        #[arg(short, long)]
        query: Option<String>,
        /// Directory the destination folder is created under
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Display name of the destination folder
        #[arg(long)]
        folder_name: Option<String>,
    },
    /// List the attachments an export would copy, without copying
    Preview {
        /// MBOX archive to search
        mbox: PathBuf,
        /// Search query (default from config)
        #[arg(short, long)]
        query: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Scan bill fields out of exported PDFs
    Scan {
        /// Folder containing the exported PDFs
        dir: PathBuf,
        /// Invoice template layout: legacy or current
        #[arg(long)]
        layout: Option<String>,
        /// CSV output path (default: <DIR>/bills.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print bills as JSON to stdout instead of writing CSV
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = billdrop::config::load_config();

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Export {
            mbox,
            query,
            output,
            folder_name,
        } => cmd_export(
            &mbox,
            query.as_deref().unwrap_or(&config.search.query),
            output
                .or(config.export.output_dir.clone())
                .unwrap_or_else(|| PathBuf::from(".")),
            folder_name.as_deref().unwrap_or(&config.export.folder_name),
        ),
        Commands::Preview { mbox, query, json } => cmd_preview(
            &mbox,
            query.as_deref().unwrap_or(&config.search.query),
            json,
        ),
        Commands::Scan {
            dir,
            layout,
            output,
            json,
        } => cmd_scan(
            &dir,
            layout.as_deref().unwrap_or(&config.scan.layout),
            output,
            json,
        ),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &billdrop::config::Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    // Try to set up file logging
    let log_dir = billdrop::config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "billdrop.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Export PDF attachments into a freshly created folder.
fn cmd_export(
    mbox: &Path,
    query: &str,
    output_root: PathBuf,
    folder_name: &str,
) -> anyhow::Result<()> {
    if !mbox.exists() {
        anyhow::bail!("Mailbox not found: {}", mbox.display());
    }

    let mailbox = MboxMailbox::open(mbox)?;
    let drive = FsDrive::new(output_root)?;
    let parsed_query = Query::parse(query);

    let pb = ProgressBar::new(mailbox.thread_count() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Exporting [{bar:40.cyan/blue}] {pos}/{len} threads")
            .expect("valid template")
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let report = export_pdf_attachments(
        &mailbox,
        &drive,
        &parsed_query,
        folder_name,
        &|current, total| {
            pb.set_length(total as u64);
            pb.set_position(current as u64);
        },
    )?;
    pb.finish_and_clear();

    use humansize::{format_size, BINARY};
    println!();
    println!("  Export complete in {:.1?}:", start.elapsed());
    println!("  {:<25} {}", "Matching threads", report.threads);
    println!("  {:<25} {}", "Messages walked", report.messages);
    println!("  {:<25} {}", "Attachments inspected", report.attachments);
    println!("  {:<25} {}", "PDFs copied", report.copied.len());
    println!("  {:<25} {}", "Skipped (not PDF)", report.skipped);
    println!(
        "  {:<25} {}",
        "Bytes written",
        format_size(report.bytes, BINARY)
    );
    println!("  {:<25} {}", "Destination folder", report.folder);
    println!();

    Ok(())
}

/// List what an export would copy.
fn cmd_preview(mbox: &Path, query: &str, json: bool) -> anyhow::Result<()> {
    if !mbox.exists() {
        anyhow::bail!("Mailbox not found: {}", mbox.display());
    }

    let mailbox = MboxMailbox::open(mbox)?;
    let planned = preview_pdf_attachments(&mailbox, &Query::parse(query))?;

    if json {
        serde_json::to_writer_pretty(std::io::stdout(), &planned)?;
        println!();
        return Ok(());
    }

    if planned.is_empty() {
        println!("  No PDF attachments match the query.");
        return Ok(());
    }

    use humansize::{format_size, BINARY};
    println!("  {} PDF attachment(s) would be copied:", planned.len());
    println!();
    for copy in &planned {
        println!(
            "  {:<40} {:>10}  {}  {}",
            copy.filename,
            format_size(copy.size, BINARY),
            copy.date.format("%Y-%m-%d"),
            copy.sender,
        );
    }
    println!();

    Ok(())
}

/// Scan bill fields out of a folder of exported PDFs.
fn cmd_scan(dir: &Path, layout: &str, output: Option<PathBuf>, json: bool) -> anyhow::Result<()> {
    let layout = BillLayout::from_name(layout)
        .ok_or_else(|| anyhow::anyhow!("Unknown layout '{}'. Supported: legacy, current", layout))?;

    let pb = ProgressBar::new_spinner();
    pb.set_message("Scanning PDFs...");

    let bills = billdrop::scan::scan_folder(dir, layout)?;
    pb.finish_and_clear();

    if json {
        serde_json::to_writer_pretty(std::io::stdout(), &bills)?;
        println!();
        return Ok(());
    }

    if bills.is_empty() {
        println!("  No readable PDF bills found in {}", dir.display());
        return Ok(());
    }

    let csv_path = output.unwrap_or_else(|| dir.join("bills.csv"));
    billdrop::scan::write_csv(&bills, &csv_path)?;
    println!("  Scanned {} bill(s) to {}", bills.len(), csv_path.display());

    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "billdrop", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}
