//! Command-line front end: import edge lists, inspect snapshots, run matches.
#![forbid(unsafe_code)]

use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{ArgMatches, Args, CommandFactory, FromArgMatches, Parser, Subcommand, ValueEnum};
use graphflow::cli::generate::{write_edge_csv, GraphGenerator};
use graphflow::cli::import::{load_edge_csv, EdgeCsvConfig};
use graphflow::cli::pattern::{parse_edge, parse_query};
use graphflow::cli::CliError;
use graphflow::query::{
    CountingSink, DeltaGenericJoinExecutor, GenericJoinExecutor, JoinOptions, QueryGraph,
    DEFAULT_BATCH_SIZE,
};
use graphflow::storage::{GraphOptions, GraphSnapshot, VersionedGraph};
use graphflow::types::{GraphVersion, Tuple};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "graphflow",
    version,
    about = "Subgraph matching over versioned in-memory graphs",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for results"
    )]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a seeded random edge list as CSV
    Generate(GenerateArgs),
    /// Load a CSV edge list and write it as a JSON snapshot
    Import(ImportArgs),
    /// Summarize a snapshot
    Stats(StatsArgs),
    /// Run a MATCH pattern against a snapshot
    Match(MatchArgs),
    /// Report how a MATCH pattern changes under a batch of edits
    Delta(DeltaArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[arg(long, help = "CSV file to write")]
    out: PathBuf,
    #[arg(long, default_value_t = 1_000)]
    vertices: u32,
    #[arg(long, default_value_t = 10_000)]
    edges: usize,
    #[arg(long, default_value_t = 1, help = "Number of distinct edge types")]
    edge_types: i16,
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Args, Debug)]
struct ImportArgs {
    #[arg(long, help = "CSV file with one edge per row")]
    edges: PathBuf,
    #[arg(long, help = "Snapshot file to write")]
    out: PathBuf,
    #[arg(long, default_value = "from", help = "Column holding source vertex ids")]
    from_column: String,
    #[arg(long, default_value = "to", help = "Column holding destination vertex ids")]
    to_column: String,
    #[arg(long, help = "Column holding numeric edge types")]
    type_column: Option<String>,
    #[arg(long, help = "Vertex count bound (defaults to highest id + 1)")]
    vertex_count: Option<usize>,
    #[arg(long, default_value_t = ',', help = "Field delimiter")]
    delimiter: char,
}

#[derive(Args, Debug)]
struct StatsArgs {
    #[arg(long, help = "Snapshot file")]
    snapshot: PathBuf,
}

#[derive(Args, Debug)]
struct PatternArgs {
    #[arg(long, help = "Snapshot file")]
    snapshot: PathBuf,
    #[arg(
        long = "edge",
        required = true,
        value_name = "A:B[:TYPE]",
        help = "Pattern edge between two variables, repeatable"
    )]
    edges: Vec<String>,
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE, help = "Prefixes per extension batch")]
    batch_size: usize,
}

#[derive(Args, Debug)]
struct MatchArgs {
    #[command(flatten)]
    pattern: PatternArgs,
    #[arg(long, help = "Only print the number of matches")]
    count: bool,
}

#[derive(Args, Debug)]
struct DeltaArgs {
    #[command(flatten)]
    pattern: PatternArgs,
    #[arg(
        long = "add",
        value_name = "FROM:TO[:TYPE]",
        help = "Edge to add, repeatable; edits apply in command-line order"
    )]
    add: Vec<String>,
    #[arg(
        long = "delete",
        value_name = "FROM:TO[:TYPE]",
        help = "Edge to delete, repeatable; edits apply in command-line order"
    )]
    delete: Vec<String>,
    #[arg(long, help = "Write the committed graph back to the snapshot file")]
    commit: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run() -> Result<(), Box<dyn Error>> {
    let matches = Cli::command().get_matches();
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(err) => err.exit(),
    };
    match cli.command {
        Command::Generate(args) => cmd_generate(args, cli.format),
        Command::Import(args) => cmd_import(args, cli.format),
        Command::Stats(args) => cmd_stats(args, cli.format),
        Command::Match(args) => cmd_match(args, cli.format),
        Command::Delta(args) => {
            let edits = ordered_edits(&args, matches.subcommand_matches("delta"));
            cmd_delta(&args, &edits, cli.format)
        }
    }
}

fn cmd_generate(args: GenerateArgs, format: OutputFormat) -> Result<(), Box<dyn Error>> {
    let edges = GraphGenerator::new(args.seed).edges(args.vertices, args.edges, args.edge_types);
    write_edge_csv(&args.out, &edges)?;
    match format {
        OutputFormat::Text => println!("wrote {} edges -> {}", edges.len(), args.out.display()),
        OutputFormat::Json => println!(
            "{}",
            json!({ "edges": edges.len(), "out": args.out.display().to_string() })
        ),
    }
    Ok(())
}

fn cmd_import(args: ImportArgs, format: OutputFormat) -> Result<(), Box<dyn Error>> {
    let delimiter = u8::try_from(args.delimiter)
        .map_err(|_| CliError::Message("delimiter must be a single-byte character".into()))?;
    let cfg = EdgeCsvConfig {
        path: args.edges,
        from_column: args.from_column,
        to_column: args.to_column,
        type_column: args.type_column,
        vertex_count: args.vertex_count,
        delimiter,
    };
    let (graph, summary) = load_edge_csv(&cfg, GraphOptions::default())?;
    graph.snapshot().save(&args.out)?;
    match format {
        OutputFormat::Text => println!(
            "imported {} rows: {} edges over {} vertices -> {}",
            summary.rows,
            summary.edges,
            summary.vertex_count,
            args.out.display()
        ),
        OutputFormat::Json => println!(
            "{}",
            json!({
                "rows": summary.rows,
                "edges": summary.edges,
                "vertices": summary.vertex_count,
                "snapshot": args.out.display().to_string(),
            })
        ),
    }
    Ok(())
}

fn cmd_stats(args: StatsArgs, format: OutputFormat) -> Result<(), Box<dyn Error>> {
    let graph = open_snapshot(&args.snapshot)?;
    let vertices = graph.vertex_count(GraphVersion::Permanent);
    let edges = graph.edge_count();
    let mut types: Vec<i16> = graph.snapshot().edges.iter().map(|e| e.ty.0).collect();
    types.sort_unstable();
    types.dedup();
    match format {
        OutputFormat::Text => {
            println!("vertices: {vertices}");
            println!("edges: {edges}");
            println!("edge types: {types:?}");
        }
        OutputFormat::Json => println!(
            "{}",
            json!({ "vertices": vertices, "edges": edges, "edge_types": types })
        ),
    }
    Ok(())
}

fn cmd_match(args: MatchArgs, format: OutputFormat) -> Result<(), Box<dyn Error>> {
    let graph = open_snapshot(&args.pattern.snapshot)?;
    let query = parse_query(&args.pattern.edges)?;
    let ordered = query.default_plan()?;
    let options = JoinOptions::new().batch_size(args.pattern.batch_size);

    if args.count {
        let mut executor = GenericJoinExecutor::new(&ordered.plan, &graph, CountingSink::default())
            .with_options(options);
        executor.execute()?;
        let count = executor.sink().tuples;
        match format {
            OutputFormat::Text => println!("{count}"),
            OutputFormat::Json => println!("{}", json!({ "count": count })),
        }
        return Ok(());
    }

    let mut rows: Vec<Tuple> = Vec::new();
    GenericJoinExecutor::new(&ordered.plan, &graph, &mut rows)
        .with_options(options)
        .execute()?;
    let mut rows: Vec<Tuple> = rows
        .iter()
        .map(|tuple| ordered.to_declaration_order(tuple))
        .collect();
    rows.sort_unstable();
    print_tuples(&query, "matches", &rows, format);
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EditKind {
    Add,
    Delete,
}

/// Interleaves `--add` and `--delete` values by their command-line position.
fn ordered_edits<'a>(
    args: &'a DeltaArgs,
    matches: Option<&ArgMatches>,
) -> Vec<(EditKind, &'a str)> {
    let positions = |id: &str| -> Vec<usize> {
        matches
            .and_then(|m| m.indices_of(id))
            .map(Iterator::collect)
            .unwrap_or_default()
    };
    let (add_at, delete_at) = (positions("add"), positions("delete"));
    let mut edits: Vec<(usize, EditKind, &str)> = Vec::new();
    for (i, spec) in args.add.iter().enumerate() {
        edits.push((add_at.get(i).copied().unwrap_or(i), EditKind::Add, spec.as_str()));
    }
    for (i, spec) in args.delete.iter().enumerate() {
        let at = delete_at.get(i).copied().unwrap_or(args.add.len() + i);
        edits.push((at, EditKind::Delete, spec.as_str()));
    }
    edits.sort_by_key(|(at, _, _)| *at);
    edits.into_iter().map(|(_, kind, spec)| (kind, spec)).collect()
}

fn cmd_delta(
    args: &DeltaArgs,
    edits: &[(EditKind, &str)],
    format: OutputFormat,
) -> Result<(), Box<dyn Error>> {
    let mut graph = open_snapshot(&args.pattern.snapshot)?;
    let query = parse_query(&args.pattern.edges)?;
    for &(kind, spec) in edits {
        let edge = parse_edge(spec)?;
        match kind {
            EditKind::Add => graph.add_edge_temporarily_typed(edge.from, edge.to, edge.ty)?,
            EditKind::Delete => graph.delete_edge_temporarily_typed(edge.from, edge.to, edge.ty)?,
        };
    }
    let delta = DeltaGenericJoinExecutor::new(&query, &graph)
        .with_options(JoinOptions::new().batch_size(args.pattern.batch_size))
        .execute_collect()?;
    match format {
        OutputFormat::Text => {
            print_tuples(&query, "emerged", &delta.emerged, format);
            print_tuples(&query, "deleted", &delta.deleted, format);
        }
        OutputFormat::Json => println!(
            "{}",
            json!({
                "vars": query.vars(),
                "emerged": raw_rows(&delta.emerged),
                "deleted": raw_rows(&delta.deleted),
            })
        ),
    }
    if args.commit {
        graph.finalize_changes();
        graph.snapshot().save(&args.pattern.snapshot)?;
    }
    Ok(())
}

fn open_snapshot(path: &Path) -> Result<VersionedGraph, CliError> {
    let snapshot = GraphSnapshot::load(path)?;
    Ok(VersionedGraph::restore(&snapshot, GraphOptions::default())?)
}

fn raw_rows(rows: &[Tuple]) -> Vec<Vec<u32>> {
    rows.iter()
        .map(|tuple| tuple.iter().map(|v| v.0).collect())
        .collect()
}

fn print_tuples(query: &QueryGraph, label: &str, rows: &[Tuple], format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            println!("{label} ({}): {}", rows.len(), query.vars().join(", "));
            for row in rows {
                let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
                println!("{}", cells.join("\t"));
            }
        }
        OutputFormat::Json => println!(
            "{}",
            json!({ "vars": query.vars(), label: raw_rows(rows) })
        ),
    }
}
