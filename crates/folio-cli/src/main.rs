use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::ArgMatches;
use folio_agents::{HttpGateway, ModelGateway, ResilientGateway, RetryPolicy};
use folio_cli::{listing, logging, report_paths, write_report, IngestOptions, RunOptions};
use folio_core::DocumentSet;
use folio_ingest::{load_documents_from_folder, unsupported_files};
use folio_pipeline::ReportOrchestrator;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    let matches = folio_cli::command().get_matches();

    if let Err(err) = logging::init_logging(folio_cli::verbose(&matches)) {
        eprintln!("warning: {err:#}");
    }

    let outcome = match matches.subcommand() {
        Some(("run", args)) => run(args).await,
        Some(("ingest", args)) => ingest(args),
        Some(("sections", args)) => sections(args),
        _ => Ok(()),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "folio failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &ArgMatches) -> Result<()> {
    let options = RunOptions::from_matches(args)?;
    let config = listing::load_config(options.config.as_deref(), options.max_review_loops)?;

    let documents = load_documents_from_folder(&options.folder)
        .with_context(|| format!("loading documents from {}", options.folder.display()))?;
    if documents.is_empty() {
        bail!("no supported documents found in {}", options.folder.display());
    }
    for doc in &documents {
        tracing::info!(document = %doc.filename, kind = doc.kind().unwrap_or("unknown"), "document identified");
    }

    let http = HttpGateway::from_config(&config.gateway).context("building model gateway")?;
    let gateway: Arc<dyn ModelGateway> = Arc::new(ResilientGateway::new(
        http,
        RetryPolicy::from_config(&config.gateway),
    ));
    let orchestrator = ReportOrchestrator::from_config(gateway, &config);

    let cancel = orchestrator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, closing the report");
            cancel.cancel();
        }
    });

    let paths = report_paths(&options.output_dir, Local::now().naive_local());
    tracing::info!(
        path = %paths.json.display(),
        sections = config.sections.len(),
        max_review_loops = config.max_review_loops,
        "starting analysis"
    );

    let summary = write_report(
        &orchestrator,
        DocumentSet::new(documents),
        config.sections.clone(),
        &paths,
        options.html,
    )
    .await?;

    println!("Report saved to {}", paths.json.display());
    if let Some(html) = &summary.html {
        println!("HTML report saved to {}", html.display());
    }
    if summary.cancelled {
        bail!(
            "run cancelled after {} of {} sections",
            summary.written,
            summary.requested
        );
    }
    Ok(())
}

fn ingest(args: &ArgMatches) -> Result<()> {
    let options = IngestOptions::from_matches(args)?;
    let documents = load_documents_from_folder(&options.folder)
        .with_context(|| format!("loading documents from {}", options.folder.display()))?;

    if options.json {
        println!("{}", listing::documents_json(&documents)?);
        return Ok(());
    }

    println!("Documents identified for processing:");
    print!("{}", listing::document_listing(&documents));
    for path in unsupported_files(&options.folder)? {
        println!("skipped (unsupported): {}", path.display());
    }
    Ok(())
}

fn sections(args: &ArgMatches) -> Result<()> {
    let config = listing::load_config(args.get_one::<PathBuf>("config").map(PathBuf::as_path), None)?;
    print!("{}", listing::sections_toml(&config.sections)?);
    Ok(())
}
