mod bootstrap;

use std::process::ExitCode;

use anyhow::Result;
use report_core::branches::branch_codes;
use report_core::ReportError;
use report_core::settings::Settings;
use report_data::summary::SummaryBuilder;
use report_runtime::orchestrator::ReportPipeline;
use report_runtime::output::{render_summary, write_summary_csv};
use report_runtime::trigger::{CommandTrigger, ManualTrigger, ReportRequest, ReportTrigger};

/// Exit code for an unknown branch or invalid arguments.
const EXIT_INVALID_INPUT: u8 = 1;
/// Exit code when no download was detected in time.
const EXIT_DOWNLOAD_MISSING: u8 = 2;

fn main() -> Result<ExitCode> {
    let settings = Settings::load_with_last_used();

    bootstrap::setup_logging(&settings.log_level)?;
    tracing::info!("Portal report v{} starting", env!("CARGO_PKG_VERSION"));

    let branch_name = match settings.branch_name() {
        Ok(name) => name,
        Err(e) => {
            eprintln!("{}. Available: {:?}", e, branch_codes());
            return Ok(ExitCode::from(EXIT_INVALID_INPUT));
        }
    };
    if let Err(e) = settings.validate() {
        eprintln!("{}", e);
        return Ok(ExitCode::from(EXIT_INVALID_INPUT));
    }

    let credentials = bootstrap::resolve_credentials(&settings)?;
    let downloads_dir = bootstrap::absolute(&settings.resolved_downloads_dir());
    let output_path = bootstrap::absolute(&settings.output);
    let layout = settings.column_layout();

    tracing::info!(
        "Branch: {}, Period: {} to {}, Downloads: {}",
        branch_name,
        settings.start_date,
        settings.end_date,
        downloads_dir.display()
    );

    let trigger: Box<dyn ReportTrigger> = match &settings.trigger_command {
        Some(program) => Box::new(CommandTrigger::new(
            program.clone(),
            settings.trigger_args.clone(),
        )),
        None => Box::new(ManualTrigger),
    };

    let pipeline = ReportPipeline::new(
        trigger,
        &downloads_dir,
        settings.wait_download_seconds,
        SummaryBuilder::new(layout.clone()),
    );

    let request = ReportRequest {
        portal_url: settings.portal_url.clone(),
        credentials,
        branch_name: branch_name.to_string(),
        start_date: settings.start_date,
        end_date: settings.end_date,
    };

    match pipeline.run(&request)?.into_result() {
        Err(ReportError::DownloadNotFound { directory, .. }) => {
            println!("No recently downloaded spreadsheet was found in the downloads folder.");
            println!("Folder checked: {}", directory.display());
            Ok(ExitCode::from(EXIT_DOWNLOAD_MISSING))
        }
        Err(e) => Err(e.into()),
        Ok((source, rows)) => {
            write_summary_csv(&output_path, &rows, &layout)?;

            println!("\nSummary by date:");
            print!("{}", render_summary(&rows, &layout));
            println!("\nSaved to: {}", output_path.display());
            println!("Source spreadsheet: {}", source.path.display());

            Ok(ExitCode::SUCCESS)
        }
    }
}
