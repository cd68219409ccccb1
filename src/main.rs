//! CLI entry point for `mailtriage`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use mailtriage::config::Config;
use mailtriage::fetch::{DetailErrorPolicy, FetchOptions, FetchOutcome, FetchProgress};
use mailtriage::pipeline::{self, RunOptions};
use mailtriage::remote::gmail::DeleteMode;
use mailtriage::review::ReviewOptions;
use mailtriage::{auth, i18n, query};

#[derive(Parser)]
#[command(name = "mailtriage", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Access token file (JSON with an `access_token` field)
    #[arg(long, global = true, value_name = "FILE")]
    token: Option<PathBuf>,

    /// Full search query, replacing the configured one
    #[arg(long, global = true, value_name = "QUERY")]
    query: Option<String>,

    /// Only messages after this date (YYYY-MM-DD)
    #[arg(long, global = true, value_name = "DATE", value_parser = parse_date_arg)]
    after: Option<NaiveDate>,

    /// Report what would be deleted without deleting anything
    #[arg(long, global = true)]
    dry_run: bool,

    /// Move messages to the trash instead of deleting them permanently
    #[arg(long, global = true)]
    trash: bool,

    /// Skip messages that cannot be fetched instead of aborting
    #[arg(long, global = true)]
    skip_failed: bool,

    /// Also print the server snippet of each message
    #[arg(long, global = true)]
    snippet: bool,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Language (en, es). Defaults to system locale.
    #[arg(long, value_name = "LANG")]
    lang: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, rank and review messages
    Review,
    /// Fetch and rank messages without reviewing them
    List {
        #[arg(long)]
        json: bool,
        /// Show only the N largest messages
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Print the effective search query
    Query,
    /// List the mailbox labels
    Labels,
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn parse_date_arg(value: &str) -> Result<NaiveDate, String> {
    query::parse_after(value).ok_or_else(|| format!("'{value}' is not a YYYY-MM-DD date"))
}

/// Detect language early from --lang arg or system env, before clap processes --help.
fn detect_lang_early() -> i18n::Lang {
    let args: Vec<String> = std::env::args().collect();
    for (i, arg) in args.iter().enumerate() {
        if arg == "--lang" {
            if let Some(lang) = args.get(i + 1).and_then(|c| i18n::Lang::from_code(c)) {
                return lang;
            }
        }
        if let Some(lang) = arg.strip_prefix("--lang=").and_then(i18n::Lang::from_code) {
            return lang;
        }
    }
    i18n::detect_system_lang()
}

/// Build a localized clap Command using i18n strings.
fn build_localized_command() -> clap::Command {
    let mut cmd = Cli::command()
        .about(i18n::app_about())
        .long_about(i18n::app_long_about())
        .after_help(i18n::app_after_help());

    for (name, about) in [
        ("review", i18n::help_cmd_review()),
        ("list", i18n::help_cmd_list()),
        ("query", i18n::help_cmd_query()),
        ("labels", i18n::help_cmd_labels()),
        ("completions", i18n::help_cmd_completions()),
        ("manpage", i18n::help_cmd_manpage()),
    ] {
        cmd = cmd.mut_subcommand(name, |s| s.about(about));
    }
    cmd
}

fn main() -> anyhow::Result<()> {
    let lang = detect_lang_early();
    i18n::set_lang(lang);

    let matches = build_localized_command().get_matches();
    let cli = Cli::from_arg_matches(&matches)?;

    let mut config = mailtriage::config::load_config();
    apply_overrides(&cli, &mut config);

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    let query = effective_query(&cli, &config);

    match &cli.command {
        None | Some(Commands::Review) => cmd_review(&cli, &config, &query),
        Some(Commands::List { json, limit }) => cmd_list(&cli, &config, &query, *json, *limit),
        Some(Commands::Query) => {
            println!("{query}");
            Ok(())
        }
        Some(Commands::Labels) => cmd_labels(&cli, &config),
        Some(Commands::Completions { shell }) => cmd_completions(*shell),
        Some(Commands::Manpage) => cmd_manpage(),
    }
}

/// Fold command-line flags into the loaded configuration.
fn apply_overrides(cli: &Cli, config: &mut Config) {
    if let Some(after) = cli.after {
        config.query.after = after;
    }
    if cli.dry_run {
        config.review.dry_run = true;
    }
    if cli.trash {
        config.review.delete_mode = DeleteMode::Trash;
    }
    if cli.skip_failed {
        config.fetch.on_detail_error = DetailErrorPolicy::Skip;
    }
    if cli.snippet {
        config.review.show_snippet = true;
    }
}

fn effective_query(cli: &Cli, config: &Config) -> String {
    cli.query
        .clone()
        .unwrap_or_else(|| config.query.to_query().to_string())
}

/// Send tracing output to stderr, and to `mailtriage.log` in the cache
/// directory when that directory can be created.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let log_dir = mailtriage::config::cache_dir(config);
    let file_layer = match std::fs::create_dir_all(&log_dir) {
        Ok(()) => Some(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(tracing_appender::rolling::never(&log_dir, "mailtriage.log")),
        ),
        // stderr only
        Err(_) => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
}

/// Spinner shown on stderr while messages are fetched.
struct FetchSpinner(ProgressBar);

impl FetchSpinner {
    fn new() -> anyhow::Result<Self> {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template(&format!(
            "{{spinner:.green}} {} {{pos}} {{msg}}",
            i18n::msg_fetching()
        ))?);
        pb.set_message(i18n::msg_messages().to_lowercase());
        pb.enable_steady_tick(std::time::Duration::from_millis(120));
        Ok(Self(pb))
    }
}

impl FetchProgress for FetchSpinner {
    fn fetched(&self, count: usize) {
        self.0.set_position(count as u64);
    }

    fn finished(&self, _outcome: &FetchOutcome) {
        self.0.finish_and_clear();
    }
}

/// Run the interactive review against stdin/stdout.
fn cmd_review(cli: &Cli, config: &Config, query: &str) -> anyhow::Result<()> {
    let channel = auth::obtain_channel(config, cli.token.as_deref())?;
    let spinner = FetchSpinner::new()?;

    let options = RunOptions {
        fetch: FetchOptions {
            on_detail_error: config.fetch.on_detail_error,
        },
        review: ReviewOptions {
            web_url: config.api.web_url.clone(),
            show_snippet: config.review.show_snippet,
            dry_run: config.review.dry_run,
        },
    };

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let report = pipeline::run(
        &channel,
        query,
        &options,
        &mut stdin.lock(),
        &mut stdout.lock(),
        Some(&spinner),
    );
    spinner.0.finish_and_clear();
    let report = report?;

    if !report.skipped.is_empty() {
        eprintln!(
            "  {}: {} ({})",
            i18n::msg_skipped(),
            report.skipped.len(),
            report.skipped.join(", ")
        );
    }
    Ok(())
}

/// Fetch and rank, then print the result without reviewing.
fn cmd_list(
    cli: &Cli,
    config: &Config,
    query: &str,
    json: bool,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    use humansize::{format_size, BINARY};

    let channel = auth::obtain_channel(config, cli.token.as_deref())?;
    let spinner = FetchSpinner::new()?;
    let options = FetchOptions {
        on_detail_error: config.fetch.on_detail_error,
    };
    let ranked = pipeline::fetch_ranked(&channel, query, &options, Some(&spinner));
    spinner.0.finish_and_clear();
    let ranked = ranked?;

    let shown = &ranked.records[..limit.unwrap_or(usize::MAX).min(ranked.records.len())];

    if json {
        let output = serde_json::json!({
            "query": query,
            "message_count": ranked.records.len(),
            "total_size": ranked.total_size,
            "skipped": ranked.skipped,
            "messages": shown.iter().map(|r| serde_json::json!({
                "id": r.remote_id(),
                "size": r.size(),
                "date": r.date(),
                "snippet": r.snippet(),
                "url": r.web_url(&config.api.web_url),
            })).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!();
    println!("  {:<20} {}", i18n::msg_query(), query);
    println!("  {:<20} {}", i18n::msg_messages(), ranked.records.len());
    println!(
        "  {:<20} {}",
        i18n::msg_total_size(),
        format_size(ranked.total_size, BINARY)
    );
    if !ranked.skipped.is_empty() {
        println!("  {:<20} {}", i18n::msg_skipped(), ranked.skipped.len());
    }
    println!();

    if shown.is_empty() {
        println!("  {}", i18n::msg_no_messages());
        println!();
        return Ok(());
    }

    println!(
        "  {:<4} {:>10} {:<32} {:<18} {}",
        "#",
        i18n::review_size(),
        i18n::review_date(),
        "ID",
        i18n::review_snippet()
    );
    println!("  {}", "-".repeat(110));
    for (i, record) in shown.iter().enumerate() {
        let date: String = record.date().chars().take(31).collect();
        let snippet: String = record.snippet().chars().take(40).collect();
        println!(
            "  {:<4} {:>10} {:<32} {:<18} {}",
            i + 1,
            format_size(record.size(), BINARY),
            date,
            record.remote_id(),
            snippet
        );
    }
    println!();
    Ok(())
}

/// Print the mailbox labels, system labels first.
fn cmd_labels(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    let channel = auth::obtain_channel(config, cli.token.as_deref())?;
    let mut labels = channel
        .policy()
        .run("labels", || channel.get_ref().list_labels())?;

    if labels.is_empty() {
        println!("{}", i18n::msg_no_labels());
        return Ok(());
    }
    labels.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.name.cmp(&b.name)));

    println!("{}:", i18n::msg_labels());
    for label in &labels {
        println!("  {:<32} {:<8} {}", label.name, label.kind, label.id);
    }
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "mailtriage", &mut std::io::stdout());
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
