use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::OpenOptions;
use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::RwLock;

#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub enum VerbosityLevel {
    Silent = 0,    // Errors and final summary only
    Summary = 1,   // High-level collection progress (default)
    Detailed = 2,  // Per-round details, warnings
    Debug = 3,     // Everything
}

impl VerbosityLevel {
    /// `--quiet` wins over any `-v` count
    pub fn from_args(quiet: bool, verbose_count: u8) -> Self {
        if quiet {
            VerbosityLevel::Silent
        } else {
            Self::from_verbose_count(verbose_count)
        }
    }

    pub fn from_verbose_count(count: u8) -> Self {
        match count {
            0 => VerbosityLevel::Summary,
            1 => VerbosityLevel::Detailed,
            2.. => VerbosityLevel::Debug,
        }
    }

    /// Default `tracing` filter directive for this verbosity
    pub fn tracing_directive(&self) -> &'static str {
        match self {
            VerbosityLevel::Silent => "error",
            VerbosityLevel::Summary => "warn",
            VerbosityLevel::Detailed => "info",
            VerbosityLevel::Debug => "debug",
        }
    }
}

#[derive(Clone)]
pub struct CollectionLogger {
    verbosity: VerbosityLevel,
    progress_bar: Arc<RwLock<Option<ProgressBar>>>,
    metadata: Arc<Mutex<CollectionMetadata>>,
    log_buffer: Arc<Mutex<Vec<String>>>,
    log_file_path: Option<String>,
}

/// Counters reported in the final summary
#[derive(Default, Clone, Debug)]
pub struct CollectionMetadata {
    start_time: Option<Instant>,
    end_time: Option<Instant>,
    pub names_requested: usize,
    pub names_resolved: usize,
    pub resolution_failures: usize,
    pub frontier_lookups: usize,
    pub frontier_resolved: usize,
    pub frontier_failures: usize,
    pub rounds: u32,
    pub identifiers: usize,
    pub firm_rows: usize,
    pub relationship_rows: usize,
    pub graph_nodes: usize,
    pub graph_edges: usize,
    pub output_files: Vec<String>,
}

impl CollectionLogger {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            progress_bar: Arc::new(RwLock::new(None)),
            metadata: Arc::new(Mutex::new(CollectionMetadata::default())),
            log_buffer: Arc::new(Mutex::new(Vec::new())),
            log_file_path: None,
        }
    }

    pub fn with_log_file(verbosity: VerbosityLevel, log_file_path: String) -> Self {
        Self {
            log_file_path: Some(log_file_path),
            ..Self::new(verbosity)
        }
    }

    pub fn info(&self, message: &str) {
        if self.verbosity >= VerbosityLevel::Summary {
            self.print_message("INFO", message);
        }
    }

    pub fn warn(&self, message: &str) {
        if self.verbosity >= VerbosityLevel::Summary {
            self.print_message("WARN", message);
        }
    }

    pub fn error(&self, message: &str) {
        // Errors are shown at every verbosity
        self.print_message("ERROR", message);
    }

    pub fn detail(&self, message: &str) {
        if self.verbosity >= VerbosityLevel::Detailed {
            self.print_message("INFO", message);
        }
    }

    fn print_message(&self, level: &str, message: &str) {
        let msg = format!("[{}] {}: {}", Local::now().format("%H:%M:%S%.3f"), level, message);

        if self.log_file_path.is_some() {
            if let Ok(mut buffer) = self.log_buffer.lock() {
                buffer.push(msg.clone());
            }
        }

        // Route through a visible progress bar so it is not torn; a hidden
        // bar drops println output
        if let Ok(guard) = self.progress_bar.try_read() {
            if let Some(pb) = guard.as_ref().filter(|pb| !pb.is_hidden()) {
                pb.println(msg);
                return;
            }
        }

        eprintln!("{}", msg);
    }

    pub async fn start_progress(&self, total: u64) {
        let pb = if self.verbosity == VerbosityLevel::Silent || !io::stderr().is_terminal() {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(total)
        };

        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} firms {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );
        pb.set_message("Resolving company names...");

        *self.progress_bar.write().await = Some(pb);

        if let Ok(mut metadata) = self.metadata.lock() {
            metadata.start_time = Some(Instant::now());
        }
    }

    pub async fn update_progress(&self, message: &str) {
        if let Some(pb) = self.progress_bar.read().await.as_ref() {
            pb.set_message(message.to_string());
        }
    }

    pub async fn set_progress_position(&self, position: u64) {
        if let Some(pb) = self.progress_bar.read().await.as_ref() {
            pb.set_position(position);
        }
    }

    pub async fn finish_progress(&self, final_message: &str) {
        if let Some(pb) = self.progress_bar.write().await.take() {
            pb.finish_and_clear();
        }

        if let Ok(mut metadata) = self.metadata.lock() {
            metadata.end_time = Some(Instant::now());
        }

        self.info(final_message);
    }

    // Metadata recording

    pub fn record_resolution(&self, requested: usize, resolved: usize, failures: usize) {
        if let Ok(mut metadata) = self.metadata.lock() {
            metadata.names_requested += requested;
            metadata.names_resolved += resolved;
            metadata.resolution_failures += failures;
        }
    }

    /// Frontier identifiers passed through the name search
    pub fn record_frontier_resolution(&self, requested: usize, resolved: usize, failures: usize) {
        if let Ok(mut metadata) = self.metadata.lock() {
            metadata.frontier_lookups += requested;
            metadata.frontier_resolved += resolved;
            metadata.frontier_failures += failures;
        }
    }

    pub fn record_round(&self, round: u32, identifiers: usize) {
        if let Ok(mut metadata) = self.metadata.lock() {
            metadata.rounds = metadata.rounds.max(round);
            metadata.identifiers = identifiers;
        }
    }

    pub fn record_tables(&self, firm_rows: usize, relationship_rows: usize) {
        if let Ok(mut metadata) = self.metadata.lock() {
            metadata.firm_rows = firm_rows;
            metadata.relationship_rows = relationship_rows;
        }
    }

    pub fn record_graph(&self, nodes: usize, edges: usize) {
        if let Ok(mut metadata) = self.metadata.lock() {
            metadata.graph_nodes = nodes;
            metadata.graph_edges = edges;
        }
    }

    pub fn record_output_file(&self, path: &str) {
        if let Ok(mut metadata) = self.metadata.lock() {
            metadata.output_files.push(path.to_string());
        }
    }

    pub fn metadata(&self) -> CollectionMetadata {
        self.metadata
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    pub fn print_final_summary(&self) {
        let metadata = self.metadata();

        println!("\n=== COLLECTION SUMMARY ===");

        if let (Some(start), Some(end)) = (metadata.start_time, metadata.end_time) {
            println!("Collection Duration: {:.2}s", end.duration_since(start).as_secs_f64());
        }

        println!("Company Names Requested: {}", metadata.names_requested);
        println!("Company Names Resolved: {}", metadata.names_resolved);
        println!("Resolution Failures: {}", metadata.resolution_failures);
        if metadata.frontier_lookups > 0 {
            println!(
                "Frontier Name Lookups: {} ({} resolved, {} failed)",
                metadata.frontier_lookups, metadata.frontier_resolved, metadata.frontier_failures
            );
        }
        println!("Expansion Rounds: {}", metadata.rounds);
        println!("Identifiers Queried: {}", metadata.identifiers);
        println!("Firm Rows: {}", metadata.firm_rows);
        println!("Relationship Rows: {}", metadata.relationship_rows);
        println!("Network: {} nodes, {} edges", metadata.graph_nodes, metadata.graph_edges);

        for file in &metadata.output_files {
            println!("Exported: {}", file);
        }

        println!("==========================\n");
    }

    // Phase-specific messages

    pub fn log_round_start(&self, round: u32, frontier: usize, known: usize) {
        self.info(&format!(
            "Expansion round {}: {} frontier identifiers ({} known)",
            round, frontier, known
        ));
    }

    pub fn log_round_complete(&self, round: u32, firms: usize, relationships: usize) {
        self.detail(&format!(
            "Round {} fetched {} firm rows and {} relationships",
            round, firms, relationships
        ));
    }

    pub fn log_resolution_failure(&self, name: &str, reason: &str) {
        self.warn(&format!("Error fetching identifier for {}: {}", name, reason));
    }

    pub fn log_export_success(&self, path: &str) {
        self.record_output_file(path);
        self.info(&format!("Export completed: {}", path));
    }

    /// Write buffered log lines to the configured log file
    pub fn export_logs(&self) -> io::Result<()> {
        let Some(log_file_path) = &self.log_file_path else {
            return Ok(());
        };

        if let Some(parent) = Path::new(log_file_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)?;

        if let Ok(buffer) = self.log_buffer.lock() {
            for entry in buffer.iter() {
                writeln!(file, "{}", entry)?;
            }
        }

        file.flush()
    }

    pub fn log_file_path(&self) -> Option<&str> {
        self.log_file_path.as_deref()
    }

    pub fn is_log_export_enabled(&self) -> bool {
        self.log_file_path.is_some()
    }

    pub fn get_log_count(&self) -> usize {
        self.log_buffer.lock().map(|b| b.len()).unwrap_or(0)
    }
}
