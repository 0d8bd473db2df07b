use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use taxodist::aggregate::NO_EVIDENCE_DISTANCE;
use taxodist::app::{App, CacheMode, ScoreOptions};
use taxodist::cache::IntervalPacer;
use taxodist::distance::DEFAULT_BRANCH_PENALTY;
use taxodist::entrez::EntrezHttpClient;
use taxodist::error::TaxoError;
use taxodist::output::JsonOutput;
use taxodist::reactions::ReactionTaxonMap;

#[derive(Parser)]
#[command(name = "taxodist")]
#[command(about = "Score taxonomic plausibility of metabolic reactions for a query organism")]
#[command(version, author)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Score reactions by taxonomic distance to an organism")]
    Score(ScoreArgs),
    #[command(about = "Resolve every candidate taxon and persist the cache without scoring")]
    Cache(CacheArgs),
    #[command(about = "Show the candidate taxon labels of selected reactions")]
    Taxa(TaxaArgs),
}

#[derive(Args)]
struct ScoreArgs {
    #[arg(long, help = "Scientific name of the query organism")]
    organism: String,

    #[arg(long, help = "Contact e-mail sent to NCBI with every request")]
    email: String,

    #[arg(long, help = "Reaction-to-taxa JSON exported from the reference database")]
    reactions: String,

    #[arg(long, conflicts_with = "to_cache", help = "Reuse a previously persisted taxon cache")]
    from_cache: Option<String>,

    #[arg(long, help = "Persist the resolved taxa to this cache file")]
    to_cache: Option<String>,

    #[arg(long, default_value_t = DEFAULT_BRANCH_PENALTY, help = "Per-step cost of changing branch in the taxonomy tree")]
    penalty: u32,

    #[arg(long, default_value_t = NO_EVIDENCE_DISTANCE, help = "Distance reported when no candidate taxon resolves")]
    sentinel: u32,

    #[arg(long, help = "Write the reaction distances here instead of stdout")]
    output: Option<String>,
}

#[derive(Args)]
struct CacheArgs {
    #[arg(long, help = "Contact e-mail sent to NCBI with every request")]
    email: String,

    #[arg(long, help = "Reaction-to-taxa JSON exported from the reference database")]
    reactions: String,

    #[arg(long, help = "Persist the resolved taxa to this cache file")]
    to_cache: String,
}

#[derive(Args)]
struct TaxaArgs {
    #[arg(long, help = "Reaction-to-taxa JSON exported from the reference database")]
    reactions: String,

    #[arg(required = true, help = "Reaction identifiers to look up")]
    reaction_ids: Vec<String>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<TaxoError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &TaxoError) -> u8 {
    match error {
        TaxoError::CacheRead(_)
        | TaxoError::CacheSchema(_)
        | TaxoError::InputRead(_)
        | TaxoError::InputParse(_) => 2,
        TaxoError::NotFound(_) | TaxoError::EntrezHttp(_) | TaxoError::EntrezStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Commands::Score(args) => run_score(args),
        Commands::Cache(args) => run_cache(args),
        Commands::Taxa(args) => run_taxa(args),
    }
}

fn run_score(args: ScoreArgs) -> miette::Result<()> {
    let reactions =
        ReactionTaxonMap::load(&Utf8PathBuf::from(args.reactions)).into_diagnostic()?;

    let cache_mode = if let Some(path) = args.from_cache {
        CacheMode::Load(Utf8PathBuf::from(path))
    } else if let Some(path) = args.to_cache {
        CacheMode::Persist(Utf8PathBuf::from(path))
    } else {
        CacheMode::Ephemeral
    };
    let options = ScoreOptions {
        penalty: args.penalty,
        sentinel: args.sentinel,
    };

    let client = EntrezHttpClient::new(&args.email).into_diagnostic()?;
    let mut app = App::new(client, IntervalPacer::default());
    let report = app
        .score(&args.organism, &reactions, cache_mode, options)
        .into_diagnostic()?;

    match args.output {
        Some(path) => JsonOutput::write_reaction_distances(
            &report.reaction_distances,
            &Utf8PathBuf::from(path),
        )
        .into_diagnostic()?,
        None => {
            JsonOutput::print_reaction_distances(&report.reaction_distances).into_diagnostic()?
        }
    }
    Ok(())
}

fn run_cache(args: CacheArgs) -> miette::Result<()> {
    let reactions =
        ReactionTaxonMap::load(&Utf8PathBuf::from(args.reactions)).into_diagnostic()?;

    let client = EntrezHttpClient::new(&args.email).into_diagnostic()?;
    let mut app = App::new(client, IntervalPacer::default());
    app.build_cache(&reactions, &Utf8PathBuf::from(args.to_cache))
        .into_diagnostic()?;
    Ok(())
}

fn run_taxa(args: TaxaArgs) -> miette::Result<()> {
    let reactions =
        ReactionTaxonMap::load(&Utf8PathBuf::from(args.reactions)).into_diagnostic()?;

    for reaction in &args.reaction_ids {
        match reactions.labels_for(reaction) {
            Some(labels) => {
                let labels: Vec<&str> = labels.iter().map(|label| label.as_str()).collect();
                println!("{reaction}: {}", labels.join(", "));
            }
            None => println!("{reaction}: no associated pathway"),
        }
    }
    Ok(())
}
