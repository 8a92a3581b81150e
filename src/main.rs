use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use supplygraph::cli::Cli;
use supplygraph::config::{self, AppConfig};
use supplygraph::expansion::{collect, ExpansionSettings};
use supplygraph::export::{
    export_firms_csv, export_relationships_csv, print_collection_summary, FIRM_DATA_FILE,
    NETWORK_GRAPH_FILE, NETWORK_MATRIX_FILE, RELATIONSHIP_DATA_FILE,
};
use supplygraph::input::gather_company_names;
use supplygraph::logger::{CollectionLogger, VerbosityLevel};
use supplygraph::model::{deduplicate_firms, deduplicate_relationships};
use supplygraph::network::{export_adjacency_matrix, export_dot, SupplyNetwork};
use supplygraph::source::RefinitivClient;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle --init flag first (before any other processing)
    if cli.init {
        let created = match &cli.config {
            Some(path) => AppConfig::create_default_config_at(path),
            None => AppConfig::create_default_config(),
        };
        match created {
            Ok(path) => {
                println!("✅ Created default configuration file at: {}", path.display());
                println!("   Edit this file to customize settings, then run supplygraph again.");
                std::process::exit(0);
            }
            Err(e) => {
                eprintln!("❌ Failed to create configuration file: {}", e);
                std::process::exit(1);
            }
        }
    }

    let loaded = match &cli.config {
        Some(path) => AppConfig::load_from_path(path),
        None => AppConfig::load(),
    };
    let mut app_config = match loaded {
        Ok(cfg) => cfg,
        Err(config::ConfigError::FileNotFound(path)) => {
            match AppConfig::prompt_create_config(&path) {
                Ok(Some(created_path)) => {
                    println!("✅ Created default configuration file at: {}", created_path.display());
                    println!("   Edit this file to customize settings, then run supplygraph again.");
                    std::process::exit(0);
                }
                Ok(None) => {
                    eprintln!("❌ Configuration file not found at: {}", path.display());
                    eprintln!("   Run with --init to create a default configuration file.");
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("❌ Failed to create configuration file: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Err(e) => {
            eprintln!("❌ Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    cli.apply_overrides(&mut app_config);

    let verbosity = VerbosityLevel::from_args(cli.quiet, cli.verbose);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.tracing_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let logger = match &cli.log_file {
        Some(path) => CollectionLogger::with_log_file(verbosity, path.clone()),
        None => CollectionLogger::new(verbosity),
    };

    if let Err(e) = cli.validate() {
        exit_with_error(&logger, &format!("Invalid arguments: {}", e));
    }

    // Overrides are re-checked against the same bounds as the file
    if let Err(e) = app_config.validate() {
        exit_with_error(&logger, &format!("Configuration error: {}", e));
    }

    let company_names = match gather_company_names(&cli.companies, cli.input_file.as_deref()) {
        Ok(names) => names,
        Err(e) => exit_with_error(&logger, &format!("{:#}", e)),
    };

    if let Err(e) = std::fs::create_dir_all(&cli.output_dir) {
        exit_with_error(
            &logger,
            &format!("Failed to create output directory '{}': {}", cli.output_dir.display(), e),
        );
    }

    logger.info(&format!(
        "Collecting supply chain for {} companies (min confidence {}, limit {} firms, frontier mode {})",
        company_names.len(),
        app_config.analysis.min_confidence,
        app_config.analysis.max_identifiers,
        app_config.analysis.frontier_resolution
    ));

    if let Err(e) = run(&cli, &app_config, &company_names, &logger).await {
        exit_with_error(&logger, &format!("Collection failed: {:#}", e));
    }

    export_logs(&logger);
    Ok(())
}

fn export_logs(logger: &CollectionLogger) {
    if !logger.is_log_export_enabled() {
        return;
    }
    match logger.export_logs() {
        Ok(()) => {
            if let Some(path) = logger.log_file_path() {
                eprintln!("📄 Execution logs exported to: {}", path);
                eprintln!("   Total log entries: {}", logger.get_log_count());
            }
        }
        Err(e) => eprintln!("⚠️  Failed to write log file: {}", e),
    }
}

/// Report a fatal error, flush the log file and exit with status 1
fn exit_with_error(logger: &CollectionLogger, message: &str) -> ! {
    logger.error(message);
    export_logs(logger);
    std::process::exit(1);
}

async fn run(
    cli: &Cli,
    app_config: &AppConfig,
    company_names: &[String],
    logger: &CollectionLogger,
) -> Result<()> {
    let client = RefinitivClient::open(&app_config.api).context("Failed to open vendor session")?;
    let settings = ExpansionSettings::from_config(&app_config.analysis, &app_config.fields);

    logger
        .start_progress(app_config.analysis.max_identifiers as u64)
        .await;
    let collected = collect(&client, company_names, &settings, logger).await;
    logger.finish_progress("Collection complete").await;
    let state = collected?;

    if state.capped {
        logger.warn(&format!(
            "Stopped at the limit of {} identifiers; the graph is partial",
            app_config.analysis.max_identifiers
        ));
    }

    let (firms, relationships) = if app_config.analysis.deduplicate {
        let firms = deduplicate_firms(&state.firms);
        let relationships = deduplicate_relationships(&state.relationships);
        logger.detail(&format!(
            "Removed {} duplicate firm rows and {} duplicate relationship rows",
            state.firms.len() - firms.len(),
            state.relationships.len() - relationships.len()
        ));
        (firms, relationships)
    } else {
        (state.firms, state.relationships)
    };

    let output_dir: &Path = &cli.output_dir;

    let path = output_dir.join(FIRM_DATA_FILE);
    export_firms_csv(&firms, &path)?;
    logger.log_export_success(&path.display().to_string());

    let path = output_dir.join(RELATIONSHIP_DATA_FILE);
    export_relationships_csv(&relationships, &path)?;
    logger.log_export_success(&path.display().to_string());

    if !cli.no_graph {
        let network = SupplyNetwork::from_relationships(&relationships);
        if network.skipped_rows() > 0 {
            logger.warn(&format!(
                "{} relationship rows had no supplier or buyer and were left out of the graph",
                network.skipped_rows()
            ));
        }
        logger.record_graph(network.node_count(), network.edge_count());

        let path = output_dir.join(NETWORK_MATRIX_FILE);
        export_adjacency_matrix(&network, &path)?;
        logger.log_export_success(&path.display().to_string());

        let path = output_dir.join(NETWORK_GRAPH_FILE);
        export_dot(&network, &path)?;
        logger.log_export_success(&path.display().to_string());
    }

    print_collection_summary(&firms, &relationships);
    logger.print_final_summary();

    Ok(())
}
