use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use futures_util::StreamExt;
use patharg::OutputArg;
use scorecard_client::{GitHub, QueryLimits};
use serde_jsonlines::JsonLinesWriter;
use std::io::Write;
use std::num::NonZeroUsize;
use std::time::Instant;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Query GitHub issue & pull request data for a team scorecard
#[derive(Clone, Debug, Eq, Parser, PartialEq)]
struct Arguments {
    /// GitHub access token.  If not given, a token is looked up via the `gh`
    /// configuration.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).  Default is warn.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, Eq, PartialEq, Subcommand)]
enum Command {
    /// Show the number of issues & pull requests matching a search query
    Count {
        /// A search query in GitHub's issue search syntax
        query: String,
    },

    /// Fetch all issues & pull requests matching a search query and output
    /// them as JSON Lines
    Search {
        /// Write the results to the given file [default: stdout]
        #[arg(short, long, default_value_t)]
        outfile: OutputArg,

        /// Number of issues to request per page of results
        #[arg(short = 'P', long, default_value_t = QueryLimits::DEFAULT_PAGE_SIZE)]
        page_size: NonZeroUsize,

        /// Number of labels to request per issue
        #[arg(long, default_value_t = QueryLimits::DEFAULT_LABEL_PAGE_SIZE)]
        label_page_size: NonZeroUsize,

        /// Number of participants to request per issue
        #[arg(long, default_value_t = QueryLimits::DEFAULT_PARTICIPANT_PAGE_SIZE)]
        participant_page_size: NonZeroUsize,

        /// A search query in GitHub's issue search syntax
        query: String,
    },

    /// List the users that can be assigned to issues in a repository
    AssignableUsers {
        /// The repository's owner
        owner: String,

        /// The repository's name
        repo: String,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Arguments::parse();
    init_tracing(args.verbose);
    let github = match args.token {
        Some(ref token) => GitHub::new(token),
        None => GitHub::new_with_local_token(),
    }
    .context("failed to construct GitHub client")?;
    match args.command {
        Command::Count { query } => {
            let count = github
                .search_issue_count(&query)
                .await
                .context("failed to count issues")?;
            println!("{count}");
        }
        Command::Search {
            outfile,
            page_size,
            label_page_size,
            participant_page_size,
            query,
        } => {
            let limits = QueryLimits {
                page_size,
                label_page_size,
                participant_page_size,
            };
            let fp = outfile.create().context("failed to open output file")?;
            let mut writer = JsonLinesWriter::new(fp);
            let start = Instant::now();
            let mut qty: usize = 0;
            let mut stream = github.search_issues_with_limits(&query, limits);
            while let Some(issue) = stream.next().await {
                let issue = issue.context("failed to fetch issues")?;
                writer.write(&issue).context("failed to write issue")?;
                qty += 1;
            }
            writer.flush().context("failed to flush output")?;
            tracing::info!("Fetched {qty} issues in {:?}", start.elapsed());
        }
        Command::AssignableUsers { owner, repo } => {
            let users = github
                .assignable_users(&owner, &repo)
                .await
                .context("failed to fetch assignable users")?;
            let mut out = std::io::stdout().lock();
            for login in users {
                writeln!(out, "{login}").context("failed to write to stdout")?;
            }
            out.flush().context("failed to flush stdout")?;
        }
    }
    Ok(())
}
