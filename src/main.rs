use std::process::ExitCode;

use clap::Parser;
use futures::StreamExt;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dicom_grouper::{
    Cli, DicomTagExtractor, FileList, IppSorter, ScanCoordinator, ScanEvent, ScanResult,
    ScanSummary, SeriesSorter, SliceSelection, VolumeLoader, spawn_scan,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.scan_config();
    let source = match FileList::discover(&cli.path, config.recursive) {
        Ok(source) => source,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let Some(result) = scan(ScanCoordinator::new(DicomTagExtractor, config), source).await else {
        warn!("Scan cancelled");
        return ExitCode::FAILURE;
    };

    let summary = ScanSummary::new(&result, SeriesSorter::new(Some(&IppSorter)));
    if cli.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                error!("Failed to serialize summary: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        print_summary(&summary);
    }

    if cli.load_volume {
        let selection = SliceSelection::every(cli.interval);
        match VolumeLoader::load_default(&result, Some(&IppSorter), &selection) {
            Ok(volume) => info!(dim = ?volume.dim(), spacing = ?volume.spacing, "Volume loaded"),
            Err(e) => {
                error!("Failed to load volume: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

/// Run the scan, cancelling it on Ctrl-C. Returns `None` when cancelled.
async fn scan(coordinator: ScanCoordinator<DicomTagExtractor>, source: FileList) -> Option<ScanResult> {
    let mut handle = spawn_scan(coordinator, source);
    let mut result = None;

    loop {
        tokio::select! {
            event = handle.events.next() => match event {
                Some(ScanEvent::Progress { processed, total }) => {
                    info!("Scanned {}/{} files", processed, total);
                }
                Some(ScanEvent::Result(scan_result)) => result = Some(scan_result),
                Some(ScanEvent::Finished) | None => break,
            },
            _ = tokio::signal::ctrl_c(), if !handle.cancel.is_cancelled() => {
                warn!("Cancelling scan after the current file");
                handle.cancel.cancel();
            }
        }
    }

    if let Err(e) = handle.task.await {
        error!("Scan worker failed: {}", e);
        return None;
    }
    result
}

fn print_summary(summary: &ScanSummary) {
    for patient in &summary.patients {
        println!(
            "{} [{}] ({} series, {} slices)",
            patient.patient_name,
            patient.patient_id,
            patient.series.len(),
            patient.total_slices
        );
        for series in &patient.series {
            let irregular = if series.irregular_spacing { ", irregular spacing" } else { "" };
            println!(
                "  {} #{} {} idx {}: {} slices, z spacing {:.2}{}",
                series.title,
                series.series_number,
                series.orientation,
                series.disambiguation_index,
                series.slice_count,
                series.z_spacing,
                irregular
            );
        }
    }
    if let Some(key) = &summary.default_series {
        println!("Default series: {key}");
    }
    if summary.skipped_files > 0 {
        println!("Skipped {} non-image files", summary.skipped_files);
    }
    for path in &summary.failed_files {
        println!("Could not group {}", path.display());
    }
}

fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "dicom_grouper=debug"
    } else {
        "dicom_grouper=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
