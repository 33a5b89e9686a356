//! Build a binary size tree from a symbol feed and print it
//!
//! ```text
//! symtree size-info.ndjson --group-by component --types tdr --depth 2
//! zcat size-info.ndjson.gz | symtree - --method-count --json
//! ```

use clap::Parser;
use futures::StreamExt;
use std::{fmt::Write as _, io::Write as _, path::PathBuf, process::ExitCode, time::Duration};
use symtree::{
    BuildCoordinator, BuildOptions, GroupBy, IngestConfig, NodeSnapshot, Result, Snapshot,
    TypeFilter,
    source::{file_source, reader_source},
};
use tracing::{error, info, warn};

/// Build a binary size tree from a symbol feed
#[derive(Debug, Parser)]
#[command(name = "symtree", version, about)]
struct Args {
    /// NDJSON feed: a metadata line, then one line per source file (`-` for stdin)
    input: PathBuf,

    /// Grouping key: `source_path` or `component`
    #[arg(long, default_value = "source_path")]
    group_by: String,

    /// Count dex methods instead of summing sizes
    #[arg(long)]
    method_count: bool,

    /// Type codes to include, e.g. `tdr`; defaults to every type
    #[arg(long)]
    types: Option<String>,

    /// Path separator override
    #[arg(long)]
    sep: Option<String>,

    /// Merge single-child chains such as `java/com/google`
    #[arg(long)]
    collapse: bool,

    /// Mark containers with a single child for expansion in the JSON output
    #[arg(long)]
    expand: bool,

    /// Milliseconds between progress reports
    #[arg(long, default_value_t = 5000)]
    interval_ms: u64,

    /// Levels of the tree to print
    #[arg(long, default_value_t = 3)]
    depth: usize,

    /// Print the final snapshot as JSON instead of an indented listing
    #[arg(long)]
    json: bool,
}

impl Args {
    fn build_options(&self) -> BuildOptions {
        BuildOptions {
            group_by: GroupBy::parse(&self.group_by),
            method_count: self.method_count,
            types: self.types.as_deref().map(TypeFilter::from_codes),
            separator: self.sep.clone(),
            collapse: self.collapse,
            expand: self.expand,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<()> {
    let config =
        IngestConfig::default().with_snapshot_interval(Duration::from_millis(args.interval_ms));
    let (coordinator, mut snapshots) = BuildCoordinator::new(config)?;

    let options = args.build_options();
    let source = if args.input.as_os_str() == "-" {
        reader_source(tokio::io::stdin()).boxed()
    } else {
        file_source(args.input.clone()).boxed()
    };
    let build = coordinator.start(&options, source)?;
    // the running build holds the only sender left, so the loop ends with it
    drop(coordinator);

    let mut last: Option<Snapshot> = None;
    while let Some(snapshot) = snapshots.recv_current().await {
        let done = snapshot.is_final();
        if !done {
            info!(
                percent = %format!("{:.0}%", snapshot.percent * 100.0),
                size = snapshot.root.size,
                "progress"
            );
        }
        last = Some(snapshot);
        if done {
            break;
        }
    }

    let result = build.join().await;
    if let Some(snapshot) = &last {
        if snapshot.is_error() {
            warn!("showing partial tree");
        }
        print_snapshot(snapshot, args)?;
    }
    let tree = result?;
    info!(nodes = tree.len(), size = tree.root_node().size(), "done");
    Ok(())
}

fn print_snapshot(snapshot: &Snapshot, args: &Args) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    if args.json {
        serde_json::to_writer_pretty(&mut stdout, &snapshot.root).map_err(std::io::Error::from)?;
        writeln!(stdout)?;
    } else {
        let mut out = String::new();
        render(&snapshot.root, 0, args.depth, &mut out);
        stdout.write_all(out.as_bytes())?;
    }
    Ok(())
}

fn render(node: &NodeSnapshot, level: usize, max_depth: usize, out: &mut String) {
    let _ = writeln!(
        out,
        "{:indent$}{:>12.0}  {:<3} {}",
        "",
        node.size,
        node.node_type.to_string(),
        node.short_name,
        indent = level * 2
    );
    if level < max_depth {
        for child in &node.children {
            render(child, level + 1, max_depth, out);
        }
    }
}
