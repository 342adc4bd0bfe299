use anyhow::Context;
use clap::Parser;
use nearcount::telemetry::{debug_channel, FullPolicy};
use nearcount::{CounterConfig, Group, Preprocessor, SplitPolicy};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::sync::Once;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn init_parallelism(threads: usize) {
    static START: Once = Once::new();
    START.call_once(|| {
        let _ = rayon::ThreadPoolBuilder::new().num_threads(threads).build_global();
    });
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("NEARCOUNT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

#[derive(Parser, Debug)]
#[command(name = "nearcount", version, about = "Count near-duplicate lines")]
struct Cli {
    /// Input files (`-` for stdin). May be repeated.
    #[arg(required = false)]
    input: Vec<String>,

    /// JSON config file; flags below override its values
    #[arg(long = "config")]
    config: Option<String>,

    /// Chunk width of the prefix tree
    #[arg(long = "step")]
    step: Option<usize>,
    /// Similarity a line must exceed to join an existing group (0..=1)
    #[arg(long = "threshold")]
    threshold: Option<f64>,
    /// Split a node only after it holds more than this many entries
    #[arg(long = "leaf-limit")]
    leaf_limit: Option<usize>,
    /// Removal regex applied before matching. May be repeated.
    #[arg(long = "ignore")]
    ignore: Vec<String>,
    /// Regex that drops a line when it matches the masked text. May be repeated.
    #[arg(long = "reject")]
    reject: Vec<String>,
    /// Strip timestamps, ids, addresses and numbers before any --ignore patterns
    #[arg(long = "log-masks", default_value_t = false)]
    log_masks: bool,

    /// Read this field from JSON lines instead of using the raw line
    #[arg(long = "json-field")]
    json_field: Option<String>,

    /// Number of parallel shards (defaults to CPU count)
    #[arg(long = "shards")]
    shards: Option<usize>,

    #[arg(long = "top")] top: Option<usize>,
    #[arg(long = "min-count")] min_count: Option<u64>,
    /// Output format: json | table
    #[arg(long = "format", default_value = "json")] format: String,
    /// Stream per-line match decisions to stderr as JSON lines
    #[arg(long = "debug", default_value_t = false)] debug: bool,
}

fn read_all_lines(paths: &[String], json_field: Option<&str>) -> anyhow::Result<Vec<String>> {
    let mut out = Vec::new();
    for p in paths {
        let reader: Box<dyn BufRead> = if p == "-" {
            Box::new(io::stdin().lock())
        } else {
            let f = File::open(p).with_context(|| format!("opening {p}"))?;
            Box::new(BufReader::with_capacity(1 << 20, f))
        };
        for line in reader.lines() {
            let l = line?;
            match json_field {
                Some(field) => {
                    if let Some(v) = extract_field(&l, field) {
                        out.push(v);
                    }
                }
                None => out.push(l),
            }
        }
    }
    Ok(out)
}

fn extract_field(line: &str, field: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(line).ok()?;
    match value.get(field)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn build_config(cli: &Cli) -> anyhow::Result<CounterConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            CounterConfig::from_json(&text).with_context(|| format!("parsing {path}"))?
        }
        None => CounterConfig::default(),
    };
    if let Some(step) = cli.step { config.step = step; }
    if let Some(t) = cli.threshold { config.score_threshold = t; }
    if let Some(leaf_limit) = cli.leaf_limit { config.split = SplitPolicy::Overflow { leaf_limit }; }
    config = config.with_ignore(cli.ignore.iter().cloned()).with_reject(cli.reject.iter().cloned());
    config.validate()?;
    Ok(config)
}

fn build_preprocessor(cli: &Cli, config: &CounterConfig) -> anyhow::Result<Preprocessor> {
    let user = Preprocessor::from_config(config)?;
    if !cli.log_masks {
        return Ok(user);
    }
    Ok(Preprocessor::log_defaults().chain(user))
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let shards = cli.shards.unwrap_or_else(num_cpus::get).max(1);
    init_parallelism(shards);

    let config = build_config(&cli)?;
    let preprocessor = build_preprocessor(&cli, &config)?;

    let input_files = if cli.input.is_empty() {
        vec!["-".to_string()]
    } else {
        cli.input.clone()
    };
    let lines = read_all_lines(&input_files, cli.json_field.as_deref())?;

    let (sink, printer) = if cli.debug {
        let (sink, rx) = debug_channel(1024, FullPolicy::Block);
        let printer = std::thread::spawn(move || {
            let stderr = io::stderr();
            let mut w = stderr.lock();
            for record in rx {
                if let Ok(s) = serde_json::to_string(&record) {
                    let _ = writeln!(w, "{s}");
                }
            }
        });
        (Some(sink), Some(printer))
    } else {
        (None, None)
    };

    let started = Instant::now();
    let mut counter = nearcount::shard::count_sharded(&lines, &config, &preprocessor, shards, sink.as_ref())?;
    tracing::info!(
        lines = lines.len(),
        groups = counter.len(),
        total = counter.total(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "counting finished"
    );

    // Every sender must be gone before the printer sees the end of the stream
    counter.take_debug();
    drop(sink);
    if let Some(handle) = printer {
        let _ = handle.join();
    }

    let mut groups = counter.groups();
    if let Some(mc) = cli.min_count { groups.retain(|g| g.count >= mc); }
    if let Some(top) = cli.top { groups.truncate(top); }

    if cli.format == "table" {
        print_groups_table(&groups);
    } else {
        println!("{}", serde_json::to_string_pretty(&groups)?);
    }
    Ok(())
}

fn print_groups_table(groups: &[Group]) {
    println!("{:<8} {}", "Count", "Representative");
    for g in groups {
        println!("{:<8} {}", g.count, g.representative);
    }
}
