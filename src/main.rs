use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use console::{Emoji, Term};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use podstore::feed::fetch_feed;
use podstore::persist::GpgEncryptor;
use podstore::vcs::{self, Scope};
use podstore::{
    Config, Constraint, Decision, DecisionSource, DownloadTarget, EpisodeFilter,
    EpisodeNumberFilter, GitCli, InitOptions, NewPodcast, NoopReporter, PodcastFilter,
    ProgressEvent, ProgressReporter, ReqwestClient, SharedProgressReporter, Store, TagAction,
    Tagger, VersionControl, download_episodes, listing, refresh_podcasts,
};

// Emoji with fallback for terminals without Unicode support
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static DOWNLOAD: Emoji<'_, '_> = Emoji("📥 ", "[v] ");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static FAILURE: Emoji<'_, '_> = Emoji("❌ ", "[!] ");
static PARTY: Emoji<'_, '_> = Emoji("🎉 ", "[*] ");
static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "x ");

/// Track podcasts and their episodes in a single, optionally encrypted, store
#[derive(Parser, Debug)]
#[command(name = "podstore")]
#[command(version)]
struct Cli {
    /// Log more (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Directory holding the store file
    #[arg(long, env = "POD_STORE_PATH", global = true)]
    store_path: Option<PathBuf>,

    /// Name of the store file inside the store directory
    #[arg(long, env = "POD_STORE_FILE_NAME", global = true)]
    store_file_name: Option<String>,

    /// Directory episodes are downloaded into
    #[arg(long, env = "POD_STORE_PODCAST_DOWNLOADS_PATH", global = true)]
    downloads_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Selection options shared by commands that act on many items
#[derive(Args, Debug, Clone, Default)]
struct FilterArgs {
    /// Only the podcast with this title
    #[arg(short, long)]
    podcast: Option<String>,

    /// Only items carrying this tag (repeatable)
    #[arg(short = 't', long = "tag")]
    with_tags: Vec<String>,

    /// Select items WITHOUT the --tag tags instead
    #[arg(long, requires = "with_tags")]
    untagged: bool,

    /// When selecting episodes, only those of podcasts carrying this tag
    #[arg(long = "podcast-tag")]
    podcast_tags: Vec<String>,

    /// Exact field match or tag check, e.g. `title=Intro` or `favorite=false`
    #[arg(short = 'w', long = "where", value_name = "KEY=VALUE")]
    constraints: Vec<String>,
}

impl FilterArgs {
    fn podcast_filter(&self) -> Result<PodcastFilter> {
        let mut filter = PodcastFilter::new().title_opt(self.podcast.clone());
        for tag in self.with_tags.iter().chain(&self.podcast_tags) {
            filter = if self.untagged && self.with_tags.contains(tag) {
                filter.untagged(tag.as_str())
            } else {
                filter.tagged(tag.as_str())
            };
        }
        for constraint in &self.constraints {
            filter = filter.constraint(Constraint::parse(constraint)?);
        }
        Ok(filter)
    }

    fn episode_filter(&self, episode: Option<EpisodeNumberFilter>) -> Result<EpisodeFilter> {
        let mut filter = EpisodeFilter::new()
            .podcast_opt(self.podcast.clone())
            .episode_number_opt(episode);
        for tag in &self.podcast_tags {
            filter = filter.podcast_tagged(tag.as_str());
        }
        for tag in &self.with_tags {
            filter = if self.untagged {
                filter.untagged(tag.as_str())
            } else {
                filter.tagged(tag.as_str())
            };
        }
        for constraint in &self.constraints {
            filter = filter.constraint(Constraint::parse(constraint)?);
        }
        Ok(filter)
    }

    fn scope(&self) -> Scope<'_> {
        Scope {
            podcast: self.podcast.as_deref(),
            tags: &self.with_tags,
            tagged: !self.untagged,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Set up the store
    Init {
        /// Do not track store changes with git
        #[arg(long)]
        no_git: bool,

        /// Remote URL for the git repo
        #[arg(short = 'u', long)]
        git_url: Option<String>,

        /// GPG id to encrypt the store file for
        #[arg(short, long)]
        gpg_id: Option<String>,
    },

    /// Add a podcast and fetch its episodes
    Add {
        /// Title used to track the podcast in the store
        title: String,

        /// RSS feed URL (or local file path)
        feed: String,

        /// Number episodes from the top of the feed instead of the bottom
        #[arg(long)]
        reverse_episode_order: bool,

        /// Tag the podcast right away (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },

    /// Refresh podcast episodes from their feeds
    Refresh {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// List podcasts with new episodes, or episodes
    Ls {
        /// Include podcasts and episodes without new episodes
        #[arg(short, long)]
        all: bool,

        /// List episodes instead of podcasts
        #[arg(short, long)]
        episodes: bool,

        /// Show every field
        #[arg(short = 'l', long = "long")]
        long: bool,

        /// List each podcast's newest episodes first
        #[arg(long)]
        newest_first: bool,

        /// Episode number or range, e.g. `12`, `3-7`, `10-`
        #[arg(short = 'n', long)]
        episode: Option<EpisodeNumberFilter>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Download new episodes
    Download {
        /// Episode number or range, e.g. `12`, `3-7`, `10-`
        #[arg(short = 'n', long)]
        episode: Option<EpisodeNumberFilter>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Rename a podcast
    Mv { old: String, new: String },

    /// Remove a podcast and its episodes from the store
    Rm {
        title: String,

        /// Do not ask for confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// Tag podcasts or episodes
    Tag(TagArgs),

    /// Remove tags from podcasts or episodes
    Untag(TagArgs),

    /// Mark episodes as seen
    Mark(MarkArgs),

    /// Mark episodes as new again
    MarkAsNew(MarkArgs),

    /// Encrypt the store file for a GPG id
    EncryptStore {
        gpg_id: String,

        /// Do not ask for confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// Store the store file as plain JSON again
    UnencryptStore {
        /// Do not ask for confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// Run a git command in the store directory
    Git {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

#[derive(Args, Debug)]
struct TagArgs {
    /// Tags to apply or remove
    #[arg(required = true)]
    tags: Vec<String>,

    /// Tag episodes instead of podcasts
    #[arg(short, long)]
    episodes: bool,

    /// Ask before each item
    #[arg(short, long)]
    interactive: bool,

    /// Episode number or range, e.g. `12`, `3-7`, `10-`
    #[arg(short = 'n', long)]
    episode: Option<EpisodeNumberFilter>,

    #[command(flatten)]
    filter: FilterArgs,
}

#[derive(Args, Debug)]
struct MarkArgs {
    /// Ask before each episode
    #[arg(short, long)]
    interactive: bool,

    /// Episode number or range, e.g. `12`, `3-7`, `10-`
    #[arg(short = 'n', long)]
    episode: Option<EpisodeNumberFilter>,

    #[command(flatten)]
    filter: FilterArgs,
}

/// Progress reporter using indicatif for terminal output
struct IndicatifReporter {
    multi: MultiProgress,
    main_bar: ProgressBar,
    download_bar: Mutex<Option<ProgressBar>>,
}

impl IndicatifReporter {
    fn new() -> Self {
        let multi = MultiProgress::new();

        let main_bar = multi.add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {wide_msg}") {
            main_bar.set_style(style);
        }
        main_bar.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            multi,
            main_bar,
            download_bar: Mutex::new(None),
        }
    }

    fn start_download_bar(&self, length: Option<u64>) -> ProgressBar {
        let bar = self.multi.add(ProgressBar::new(length.unwrap_or(0)));
        if let Ok(style) = ProgressStyle::default_bar().template(&format!(
            "  {DOWNLOAD}[{{bar:30.cyan/blue}}] {{bytes}}/{{total_bytes}} {{wide_msg}}"
        )) {
            bar.set_style(style.progress_chars("█▓░"));
        }

        if let Ok(mut slot) = self.download_bar.lock() {
            if let Some(previous) = slot.replace(bar.clone()) {
                previous.finish_and_clear();
            }
        }
        bar
    }

    fn with_download_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(slot) = self.download_bar.lock()
            && let Some(bar) = slot.as_ref()
        {
            f(bar);
        }
    }

    fn finish_download_bar(&self) {
        if let Ok(mut slot) = self.download_bar.lock()
            && let Some(bar) = slot.take()
        {
            bar.finish_and_clear();
        }
    }
}

impl ProgressReporter for IndicatifReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::RefreshStarting {
                podcast_title,
                feed,
                podcast_index,
                total_podcasts,
            } => {
                self.main_bar.set_message(format!(
                    "{SEARCH}[{}/{}] Refreshing {} from {}",
                    (podcast_index + 1).to_string().cyan(),
                    total_podcasts.to_string().cyan(),
                    podcast_title.bold(),
                    feed.dimmed()
                ));
            }

            ProgressEvent::RefreshCompleted {
                podcast_title,
                added,
                updated,
                removed,
            } => {
                self.main_bar.println(format!(
                    "{SUCCESS}{} • {} new, {} updated, {} removed",
                    podcast_title.bold().green(),
                    added.to_string().yellow(),
                    updated.to_string().cyan(),
                    removed.to_string().dimmed()
                ));
            }

            ProgressEvent::RefreshFailed {
                podcast_title,
                error,
            } => {
                self.main_bar.println(format!(
                    "{FAILURE}{} - {}",
                    podcast_title.red(),
                    error.red()
                ));
            }

            ProgressEvent::DownloadStarting {
                podcast_title,
                episode_title,
                episode_index,
                total_to_download,
                content_length,
            } => {
                self.main_bar.set_message(format!(
                    "Downloading {} of {} episodes",
                    (episode_index + 1).to_string().cyan(),
                    total_to_download.to_string().cyan()
                ));
                let bar = self.start_download_bar(content_length);
                bar.set_message(format!(
                    "{} -> {}",
                    truncate_title(&podcast_title, 20).bold(),
                    truncate_title(&episode_title, 40)
                ));
            }

            ProgressEvent::DownloadProgress {
                bytes_downloaded,
                total_bytes,
                ..
            } => {
                self.with_download_bar(|bar| {
                    if let Some(total) = total_bytes {
                        bar.set_length(total);
                    }
                    bar.set_position(bytes_downloaded);
                });
            }

            ProgressEvent::Finalizing { episode_title } => {
                self.with_download_bar(|bar| {
                    bar.set_message(format!("Finalizing {}", truncate_title(&episode_title, 40)));
                });
            }

            ProgressEvent::DownloadCompleted { episode_title, .. } => {
                self.finish_download_bar();
                self.main_bar.println(format!(
                    "{SUCCESS}{}",
                    truncate_title(&episode_title, 60).green()
                ));
            }

            ProgressEvent::DownloadFailed {
                episode_title,
                error,
            } => {
                self.finish_download_bar();
                self.main_bar.println(format!(
                    "{FAILURE}{} - {}",
                    truncate_title(&episode_title, 40).red(),
                    error.red()
                ));
            }

            ProgressEvent::DownloadsFinished {
                downloaded_count,
                failed_count,
            } => {
                self.main_bar.finish_and_clear();
                println!(
                    "\n{PARTY}{} {} downloaded, {} failed",
                    "Downloads complete:".bold().green(),
                    downloaded_count.to_string().green().bold(),
                    if failed_count > 0 {
                        failed_count.to_string().red().bold()
                    } else {
                        failed_count.to_string().green()
                    }
                );
            }
        }
    }
}

impl Drop for IndicatifReporter {
    fn drop(&mut self) {
        self.main_bar.finish_and_clear();
    }
}

/// Interactive decisions read from the terminal
struct TerminalDecisions {
    term: Term,
}

impl DecisionSource for TerminalDecisions {
    fn decide(&mut self, prompt: &str, help: &str) -> Decision {
        loop {
            let _ = self.term.write_line("");
            let _ = self.term.write_str(&format!("{prompt} [h/y/n/b/q]: "));
            let Ok(answer) = self.term.read_line() else {
                return Decision::Cancelled;
            };

            match answer.trim().to_lowercase().as_str() {
                "y" => return Decision::Apply,
                "n" => return Decision::Skip,
                "b" => return Decision::SwitchToBulk,
                "q" => return Decision::Cancelled,
                "h" => {
                    let _ = self.term.write_line(help);
                }
                _ => {
                    let _ = self
                        .term
                        .write_line(&"Please answer h, y, n, b or q.".yellow().to_string());
                }
            }
        }
    }
}

fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() <= max_len {
        title.to_string()
    } else {
        let kept: String = title.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("podstore={level}")));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn reporter(quiet: bool) -> SharedProgressReporter {
    if quiet {
        NoopReporter::shared()
    } else {
        Arc::new(IndicatifReporter::new())
    }
}

fn open_store(config: &Config) -> Result<Store> {
    Store::open(config).context("Failed to open store")
}

/// Commit the store directory if it is tracked by git
fn commit(config: &Config, message: &str) -> Result<()> {
    let git = GitCli::new(&config.store_path);
    if git.is_tracked() {
        let committed = git
            .commit_all(message)
            .context("Failed to commit store changes")?;
        debug!(committed, commit_message = message, "git commit");
    }
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    let term = Term::stdout();
    term.write_str(&format!("{question} [y/N] "))?;
    let answer = term.read_line()?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::new(
        cli.store_path.clone(),
        cli.store_file_name.clone(),
        cli.downloads_path.clone(),
    );

    match cli.command {
        Command::Init {
            no_git,
            git_url,
            gpg_id,
        } => init(&config, no_git, git_url, gpg_id),
        Command::Add {
            title,
            feed,
            reverse_episode_order,
            tags,
        } => {
            let podcast = NewPodcast {
                title,
                feed,
                tags,
                reverse_episode_order,
            };
            add(&config, podcast).await
        }
        Command::Refresh { filter } => refresh(&config, &filter, cli.quiet).await,
        Command::Ls {
            all,
            episodes,
            long,
            newest_first,
            episode,
            filter,
        } => ls(&config, &filter, episode, !all, episodes, long, newest_first),
        Command::Download { episode, filter } => {
            download(&config, &filter, episode, cli.quiet).await
        }
        Command::Mv { old, new } => {
            let mut store = open_store(&config)?;
            store.podcasts.rename(&old, &new)?;
            store.save()?;
            println!("{SUCCESS}Renamed {} -> {}", old.bold(), new.bold().green());
            commit(&config, &vcs::renamed_message(&old, &new))
        }
        Command::Rm { title, force } => {
            let mut store = open_store(&config)?;
            if !force && !confirm(&format!("Are you sure you want to delete {title}?"))? {
                println!("Aborted.");
                return Ok(());
            }
            store.podcasts.delete(&title)?;
            store.save()?;
            println!("{SUCCESS}Removed {}", title.bold());
            commit(&config, &vcs::removed_message(&title))
        }
        Command::Tag(args) => tag(&config, Tagger::new(args.tags.clone(), TagAction::Apply), &args),
        Command::Untag(args) => {
            tag(&config, Tagger::new(args.tags.clone(), TagAction::Remove), &args)
        }
        Command::Mark(args) => mark(&config, Tagger::mark_seen(), &args),
        Command::MarkAsNew(args) => mark(&config, Tagger::mark_new(), &args),
        Command::EncryptStore { gpg_id, force } => {
            let mut store = open_store(&config)?;
            if !force && !confirm("Are you sure you want to encrypt the pod store?")? {
                println!("Aborted.");
                return Ok(());
            }
            store
                .encrypt(&gpg_id, GpgEncryptor::new())
                .context("Failed to encrypt store")?;
            println!("{SUCCESS}Store encrypted with GPG ID.");
            commit(&config, &vcs::encrypted_message())
        }
        Command::UnencryptStore { force } => {
            let mut store = open_store(&config)?;
            if !force && !confirm("Are you sure you want to unencrypt the pod store?")? {
                println!("Aborted.");
                return Ok(());
            }
            store.unencrypt().context("Failed to unencrypt store")?;
            println!("{SUCCESS}Store was unencrypted.");
            commit(&config, &vcs::unencrypted_message())
        }
        Command::Git { args } => {
            let output = GitCli::new(&config.store_path).run(&args)?;
            print!("{output}");
            Ok(())
        }
    }
}

fn init(
    config: &Config,
    no_git: bool,
    git_url: Option<String>,
    gpg_id: Option<String>,
) -> Result<()> {
    let options = InitOptions {
        git: !no_git,
        git_url,
        gpg_id,
    };
    let git = GitCli::new(&config.store_path);
    Store::init(config, &options, GpgEncryptor::new(), &git)
        .context("Failed to initialize store")?;

    println!(
        "{SUCCESS}Store created: {}",
        config.store_path.display().to_string().cyan()
    );
    println!(
        "{FOLDER}Podcast episodes will be downloaded to {}",
        config.downloads_path.display().to_string().cyan()
    );
    if options.git || options.git_url.is_some() {
        let remote = options
            .git_url
            .as_deref()
            .unwrap_or("no remote repo specified. You can manually add one later.");
        println!("Git tracking enabled: {remote}");
    }
    if options.gpg_id.is_some() {
        println!("GPG ID set for store encryption.");
    }
    Ok(())
}

async fn add(config: &Config, podcast: NewPodcast) -> Result<()> {
    let mut store = open_store(config)?;
    let client = ReqwestClient::new();

    let feed = fetch_feed(&client, &podcast.feed)
        .await
        .with_context(|| format!("Failed to fetch feed for {}", podcast.title))?;
    let title = podcast.title.clone();
    let summary = store.podcasts.add(podcast, &feed.entries)?;
    store.save()?;

    println!(
        "{SUCCESS}Added {} with {} episodes",
        title.bold().green(),
        summary.added.to_string().cyan()
    );
    commit(config, &vcs::added_message(&title))
}

async fn refresh(config: &Config, filter: &FilterArgs, quiet: bool) -> Result<()> {
    let mut store = open_store(config)?;
    let client = ReqwestClient::new();

    let titles: Vec<String> = filter
        .podcast_filter()?
        .apply(&store.podcasts)?
        .into_iter()
        .map(|p| p.title.clone())
        .collect();

    let report = {
        let reporter = reporter(quiet);
        refresh_podcasts(&client, &mut store.podcasts, &titles, &reporter).await?
    };
    store.save()?;

    if !quiet && !report.failed.is_empty() {
        println!("\n{}", "Failed podcasts:".red().bold());
        for (title, error) in &report.failed {
            println!("  {CROSS}{} - {}", title.yellow(), error.dimmed());
        }
    }

    commit(config, &vcs::refreshed_message(&filter.scope()))?;

    if report.refreshed.is_empty() && !report.failed.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

fn ls(
    config: &Config,
    filter: &FilterArgs,
    episode: Option<EpisodeNumberFilter>,
    new_only: bool,
    episodes: bool,
    long: bool,
    newest_first: bool,
) -> Result<()> {
    let store = open_store(config)?;

    let list_episodes = episodes || filter.podcast.is_some() || episode.is_some();
    let lines = if list_episodes {
        let mut episode_filter = filter.episode_filter(episode)?.new_episodes(new_only);
        if newest_first {
            episode_filter = episode_filter.newest_first();
        }
        listing::list_episodes(
            &store.podcasts,
            &episode_filter,
            long,
            listing::terminal_width(),
        )?
    } else {
        let podcast_filter = filter.podcast_filter()?.new_episodes(new_only);
        listing::list_podcasts(&store.podcasts, &podcast_filter, long)?
    };

    for line in lines {
        println!("{line}");
    }
    Ok(())
}

async fn download(
    config: &Config,
    filter: &FilterArgs,
    episode: Option<EpisodeNumberFilter>,
    quiet: bool,
) -> Result<()> {
    let mut store = open_store(config)?;
    let client = ReqwestClient::new();

    let targets: Vec<DownloadTarget> = filter
        .episode_filter(episode)?
        .new_episodes(true)
        .apply(&store.podcasts)?
        .into_iter()
        .map(|m| DownloadTarget {
            podcast_title: m.podcast.title.clone(),
            episode_id: m.episode.id.clone(),
        })
        .collect();

    let report = {
        let reporter = reporter(quiet);
        download_episodes(&client, &mut store.podcasts, &targets, config, &reporter).await?
    };
    store.save()?;

    if !quiet && !report.failed.is_empty() {
        println!("\n{}", "Failed episodes:".red().bold());
        for (title, error) in &report.failed {
            println!("  {CROSS}{} - {}", title.yellow(), error.dimmed());
        }
    }
    if !quiet {
        println!(
            "\n{FOLDER}Output: {}\n",
            config.downloads_path.display().to_string().cyan()
        );
    }

    commit(config, &vcs::downloaded_message(&filter.scope()))?;

    if !report.failed.is_empty() && report.downloaded.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

fn run_tagger(
    config: &Config,
    tagger: &Tagger,
    filter: &FilterArgs,
    episode: Option<EpisodeNumberFilter>,
    episodes: bool,
    interactive: bool,
) -> Result<()> {
    let mut store = open_store(config)?;
    let mut terminal = TerminalDecisions {
        term: Term::stdout(),
    };

    if interactive {
        let help = if episodes {
            tagger.episode_help()
        } else {
            tagger.podcast_help()
        };
        println!("{help}");
    }
    let decisions: Option<&mut dyn DecisionSource> = if interactive {
        Some(&mut terminal)
    } else {
        None
    };

    let outcome = if episodes {
        tagger.tag_episodes(&mut store.podcasts, &filter.episode_filter(episode)?, decisions)?
    } else {
        tagger.tag_podcasts(&mut store.podcasts, &filter.podcast_filter()?, decisions)?
    };

    for message in &outcome.messages {
        println!("{message}");
    }
    if outcome.cancelled {
        println!("{}", "Stopped; changes made so far are kept.".yellow());
    }

    store.save()?;
    let verbs = tagger.verbs();
    commit(
        config,
        &vcs::tagged_message(
            &verbs.performed,
            &verbs.listing,
            filter.podcast.as_deref(),
            episodes,
            interactive,
        ),
    )
}

fn tag(config: &Config, tagger: Tagger, args: &TagArgs) -> Result<()> {
    let episodes = args.episodes || args.episode.is_some();
    run_tagger(
        config,
        &tagger,
        &args.filter,
        args.episode,
        episodes,
        args.interactive,
    )
}

fn mark(config: &Config, tagger: Tagger, args: &MarkArgs) -> Result<()> {
    run_tagger(
        config,
        &tagger,
        &args.filter,
        args.episode,
        true,
        args.interactive,
    )
}
