mod client;
mod config;
mod error;
mod logging;
mod merge;
mod models;
mod state;
mod tui;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use client::{ApiClient, DEFAULT_API_URL};
use config::Config;
use merge::{candidates_heading, is_ranked, merge_candidates};
use models::{JobDescription, MergedCandidate, NewJobDescription};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tui::{short_id, truncate};

const WRAP_WIDTH: usize = 78;

#[derive(Parser)]
#[command(name = "scout")]
#[command(about = "Manage job descriptions and the candidates sourced for them")]
struct Cli {
    /// Backend API root
    #[arg(long, global = true, env = "SCOUT_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "SCOUT_TIMEOUT_SECS", default_value = "300")]
    timeout_secs: u64,

    /// Log file (defaults to the platform data directory)
    #[arg(long, global = true, env = "SCOUT_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Log to stderr instead of the log file
    #[arg(long, global = true)]
    log_stderr: bool,

    /// Print raw JSON instead of formatted output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive dashboard (default)
    Browse,

    /// List job descriptions
    List,

    /// Show a job and its candidates
    Show {
        /// Job ID
        id: String,
    },

    /// Parse and store a new job description
    Add {
        /// Job title
        #[arg(short, long)]
        title: String,

        /// Job description text
        #[arg(short, long, conflicts_with = "file", required_unless_present = "file")]
        description: Option<String>,

        /// Read the job description from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Search candidates for a job
    Fetch {
        /// Job ID
        id: String,
    },

    /// Rank the fetched candidates for a job
    Rank {
        /// Job ID
        id: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        api_url: cli.api_url,
        timeout: Duration::from_secs(cli.timeout_secs),
        log_file: cli.log_file.unwrap_or_else(Config::default_log_path),
        log_stderr: cli.log_stderr,
    };
    logging::init(&config)?;

    let client = config.client()?;
    info!(api_url = %client.base_url(), "starting");
    let json = cli.json;

    match cli.command.unwrap_or(Commands::Browse) {
        Commands::Browse => tui::run_browse(client)?,

        Commands::List => {
            let jobs = client.list_jobs()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&jobs)?);
            } else if jobs.is_empty() {
                println!("No job descriptions yet. Add one with 'scout add'.");
            } else {
                println!(
                    "{:<30} {:<15} {:>10} {:<8} {:<8}",
                    "JOB TITLE", "JOB ID", "CANDIDATES", "FETCHED", "RANKED"
                );
                println!("{}", "-".repeat(75));
                for job in &jobs {
                    let [fetched, ranked] = job.badges();
                    println!(
                        "{:<30} {:<15} {:>10} {:<8} {:<8}",
                        truncate(job.title(), 28),
                        short_id(&job.job_id),
                        job.candidate_count(),
                        fetched.text(),
                        ranked.text()
                    );
                }
                println!("\nTotal Jobs: {}", jobs.len());
            }
        }

        Commands::Show { id } => match client.get_job(&id) {
            Ok(job) => print_job(&job, json)?,
            Err(e) if e.is_not_found() => println!("Job {} not found.", id),
            Err(e) => return Err(e.into()),
        },

        Commands::Add {
            title,
            description,
            file,
        } => {
            let description = match (description, file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read job description file: {}", path.display()))?,
                (None, None) => return Err(anyhow!("Provide --description or --file")),
            };
            let resp = client.parse_job_description(&NewJobDescription {
                job_title: title,
                job_description: description,
            })?;
            if json {
                println!("{}", serde_json::to_string_pretty(&resp)?);
            } else {
                println!("{}", resp.message);
                if let Some(job_id) = resp.job_id {
                    println!("Job ID: {}", job_id);
                }
            }
        }

        Commands::Fetch { id } => {
            println!("Fetching candidates from GitHub...");
            let job = fetch_or_rank(&client, &id, Action::Fetch)?;
            print_job(&job, json)?;
        }

        Commands::Rank { id } => {
            println!("Ranking candidates based on job requirements...");
            let job = fetch_or_rank(&client, &id, Action::Rank)?;
            print_job(&job, json)?;
        }
    }

    Ok(())
}

enum Action {
    Fetch,
    Rank,
}

/// Run the action, refusing the same way the dashboard's disabled buttons do.
fn fetch_or_rank(client: &ApiClient, id: &str, action: Action) -> Result<JobDescription> {
    let current = client.get_job(id)?;
    match action {
        Action::Fetch => {
            if current.candidates_fetched {
                println!("Candidates already fetched.");
                return Ok(current);
            }
            Ok(client.search_candidates(id)?)
        }
        Action::Rank => {
            if !current.candidates_fetched {
                return Err(anyhow!("Fetch candidates first: scout fetch {}", id));
            }
            if current.candidates_ranked {
                println!("Candidates already ranked.");
                return Ok(current);
            }
            Ok(client.rank_candidates(id)?)
        }
    }
}

fn print_job(job: &JobDescription, json: bool) -> Result<()> {
    let merged = merge_candidates(job);
    if json {
        println!("{}", serde_json::to_string_pretty(&merged)?);
        return Ok(());
    }

    println!("{}", job.title());
    println!("{}", job.company());
    let [fetched, ranked] = job.badges();
    println!("{}: {}  {}: {}", fetched.label, fetched.text(), ranked.label, ranked.text());

    if let Some(description) = job.description.as_deref().filter(|d| !d.is_empty()) {
        println!("\n--- Job Description ---\n{}", textwrap::fill(description, WRAP_WIDTH));
    }

    let show_rank = is_ranked(job);
    println!("\n--- {} ---", candidates_heading(show_rank, merged.len()));
    if let Some(summary) = job.summary.as_deref().filter(|s| !s.is_empty()) {
        println!("{}", textwrap::fill(summary, WRAP_WIDTH));
    }

    if merged.is_empty() {
        println!("No candidates found yet. Run 'scout fetch <id>' to begin searching.");
    }
    for candidate in &merged {
        println!("\n{}", format_candidate(candidate, show_rank));
    }
    Ok(())
}

fn format_candidate(c: &MergedCandidate, show_rank: bool) -> String {
    let mut out = String::new();

    match c.rank.filter(|_| show_rank) {
        Some(rank) => out.push_str(&format!("#{} {} (@{})\n", rank, c.display_name(), c.username)),
        None => out.push_str(&format!("{} (@{})\n", c.display_name(), c.username)),
    }
    out.push_str(&format!("  {}\n", c.bio_or_placeholder()));
    if let Some(url) = &c.github_url {
        out.push_str(&format!("  GitHub: {}\n", url));
    }
    if let Some(email) = &c.email {
        out.push_str(&format!("  Email: {}\n", email));
    }
    if let Some(score) = c.score {
        out.push_str(&format!("  Score: {:.2}\n", score));
    }
    for (label, text) in [("Reasoning", &c.reasoning), ("Summary", &c.summary)] {
        if let Some(text) = text {
            let body = textwrap::fill(&format!("{}: {}", label, text), WRAP_WIDTH - 2);
            for line in body.lines() {
                out.push_str(&format!("  {}\n", line));
            }
        }
    }
    if !c.skills.is_empty() {
        let skills: Vec<&str> = c.skills.iter().take(10).map(String::as_str).collect();
        out.push_str(&format!("  Skills: {}\n", skills.join(", ")));
    }
    for repo in c.top_repos.iter().take(3) {
        out.push_str(&format!(
            "  * {} ({} stars) {}\n",
            repo.name,
            repo.stars,
            repo.url.as_deref().unwrap_or("")
        ));
    }

    out.trim_end().to_string()
}
