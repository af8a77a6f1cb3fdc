use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use syngrep::api::{self, FindOptions};
use syngrep::config;
use syngrep::output::{self, OutputFormat};
use syngrep::search::{CancellationToken, NestedMatches, PageRequest, SearchConfig, SearchOutcome};
use syngrep::{DumpFormat, FileSelector, GrammarRegistry, MatchRecord};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "syngrep")]
#[command(about = "Structural code search with ast-grep style patterns and YAML rules", long_about = None)]
#[command(version)]
struct Cli {
    /// Project config file (sgconfig.yaml); defaults to $SYNGREP_CONFIG
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the syntax tree of a snippet, or how a pattern is parsed
    Dump {
        /// Language of the code
        #[arg(short, long)]
        lang: String,

        /// Tree format: cst, ast or pattern
        #[arg(short, long, default_value = "cst")]
        format: DumpFormat,

        /// Code to dump (read from stdin when omitted)
        code: Option<String>,
    },

    /// Test a YAML rule against a snippet
    TestRule {
        #[command(flatten)]
        rule: RuleSource,

        /// Language to parse the code as, overriding the rule's own
        #[arg(short, long)]
        lang: Option<String>,

        /// Code to test (read from stdin when omitted)
        code: Option<String>,

        #[command(flatten)]
        search: SearchArgs,
    },

    /// Search files for a code pattern
    Run {
        /// Pattern to search for, e.g. 'foo($$$ARGS)'
        #[arg(short, long)]
        pattern: String,

        /// Language of the pattern and of the files searched
        #[arg(short, long)]
        lang: String,

        /// Files or directories to search
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        search: SearchArgs,
    },

    /// Search files with a YAML rule
    Scan {
        #[command(flatten)]
        rule: RuleSource,

        /// Files or directories to search
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        search: SearchArgs,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct RuleSource {
    /// Rule file to load
    #[arg(short, long)]
    rule: Option<PathBuf>,

    /// Rule document given inline
    #[arg(long)]
    inline_rules: Option<String>,
}

impl RuleSource {
    fn read(&self) -> Result<String> {
        match (&self.rule, &self.inline_rules) {
            (_, Some(inline)) => Ok(inline.clone()),
            (Some(path), None) => {
                fs::read_to_string(path).with_context(|| format!("cannot read rule file {}", path.display()))
            }
            (None, None) => anyhow::bail!("either --rule or --inline-rules is required"),
        }
    }
}

#[derive(Args)]
struct SearchArgs {
    /// Stop after this many matches (0 = unlimited)
    #[arg(long)]
    max_results: Option<usize>,

    /// Print matches as JSON
    #[arg(long)]
    json: bool,

    /// Skip this many matches (pagination)
    #[arg(long)]
    offset: Option<usize>,

    /// Print at most this many matches after --offset (pagination)
    #[arg(long)]
    limit: Option<usize>,

    /// Do not report matches nested inside another match
    #[arg(long)]
    skip_nested: bool,

    /// Worker threads (default: config `threads`, else one per core)
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Give up on files not yet searched after this many seconds
    #[arg(long)]
    timeout: Option<u64>,
}

impl SearchArgs {
    fn format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }

    fn config(&self, default_threads: usize) -> SearchConfig {
        let nested = if self.skip_nested {
            NestedMatches::Skip
        } else {
            NestedMatches::All
        };
        SearchConfig::default()
            .with_max_results(self.max_results)
            .with_output_format(self.format())
            .with_nested(nested)
            .with_threads(self.threads.unwrap_or(default_threads))
    }

    fn page_request(&self) -> Result<Option<PageRequest>> {
        if self.offset.is_none() && self.limit.is_none() {
            return Ok(None);
        }
        Ok(Some(PageRequest::new(self.offset.unwrap_or(0), self.limit)?))
    }

    fn cancel(&self) -> CancellationToken {
        match self.timeout {
            Some(secs) => CancellationToken::with_deadline(Instant::now() + Duration::from_secs(secs)),
            None => CancellationToken::new(),
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let registry = GrammarRegistry::builtin();

    match cli.command {
        Commands::Dump { lang, format, code } => cmd_dump(&registry, &lang, format, code),

        Commands::TestRule {
            rule,
            lang,
            code,
            search,
        } => cmd_test_rule(&registry, &rule, lang.as_deref(), code, &search),

        Commands::Run {
            pattern,
            lang,
            paths,
            search,
        } => {
            let options = find_options(&registry, cli.config.as_deref(), &search)?;
            let outcome = api::find_code(&registry, &paths, &lang, &pattern, &options)?;
            print_outcome(outcome, &search)
        }

        Commands::Scan { rule, paths, search } => {
            let options = find_options(&registry, cli.config.as_deref(), &search)?;
            let outcome = api::find_code_by_rule(&registry, &paths, &rule.read()?, &options)?;
            print_outcome(outcome, &search)
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("syngrep=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .init();
}

fn read_code(code: Option<String>) -> Result<String> {
    match code {
        Some(code) => Ok(code),
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("cannot read code from stdin")?;
            Ok(input)
        }
    }
}

fn find_options(registry: &GrammarRegistry, config_path: Option<&Path>, search: &SearchArgs) -> Result<FindOptions> {
    let project = config::load(config_path, registry)?;
    let selector = FileSelector::from_config(&project, registry)?;
    Ok(FindOptions::new(search.config(project.threads))
        .with_selector(selector)
        .with_cancel(search.cancel()))
}

fn cmd_dump(registry: &GrammarRegistry, lang: &str, format: DumpFormat, code: Option<String>) -> Result<()> {
    let code = read_code(code)?;
    let rendered = api::render_tree(registry, &code, lang, format)?;
    print!("{rendered}");
    Ok(())
}

fn cmd_test_rule(
    registry: &GrammarRegistry,
    rule: &RuleSource,
    lang: Option<&str>,
    code: Option<String>,
    search: &SearchArgs,
) -> Result<()> {
    let rule = rule.read()?;
    let code = read_code(code)?;
    let matches = api::test_rule(registry, &code, &rule, lang, &search.config(0))?;

    if matches.is_empty() && !search.json {
        eprintln!(
            "{}",
            "hint: relational rules only look at direct neighbours by default; try `stopBy: end` in inside/has"
                .dimmed()
        );
    }
    let total = matches.len();
    print_matches(matches, total, search)
}

fn print_outcome(outcome: SearchOutcome, search: &SearchArgs) -> Result<()> {
    for diagnostic in &outcome.diagnostics {
        eprintln!(
            "{} {}: {}",
            "warning:".yellow().bold(),
            diagnostic.path.display(),
            diagnostic.message
        );
    }
    if outcome.cancelled {
        eprintln!(
            "{} search timed out after {} of the files; results are incomplete",
            "warning:".yellow().bold(),
            outcome.files_searched
        );
    }
    let total = outcome.total_matches;
    print_matches(outcome.matches, total, search)
}

fn print_matches(matches: Vec<MatchRecord>, total: usize, search: &SearchArgs) -> Result<()> {
    let rendered = match search.page_request()? {
        Some(request) => {
            let page = syngrep::search::paginate(matches, request);
            match search.format() {
                OutputFormat::Json => output::format_json(&page)?,
                OutputFormat::Text => output::format_text(&page.results, page.metadata.total_matches),
            }
        }
        None => output::render(&matches, total, search.format())?,
    };
    println!("{rendered}");
    Ok(())
}
