//! Submit command - upload phishing kit archives

use crate::cli::connect;
use crate::cli::error::HelpfulError;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use kitintel::config::KitConfig;
use kitintel_submit::{
    CancellationToken, DedupStatus, SubmissionObserver, SubmissionOutcome, SubmissionPipeline,
    SubmissionReport,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Debug)]
pub struct SubmitArgs {
    pub files: Vec<PathBuf>,
    pub recursive: bool,
    pub json: bool,
}

/// Byte progress bar for the archive currently uploading.
struct ProgressBarObserver {
    bar: Mutex<Option<ProgressBar>>,
    enabled: bool,
}

impl ProgressBarObserver {
    fn new(enabled: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            enabled,
        }
    }
}

impl SubmissionObserver for ProgressBarObserver {
    fn upload_started(&self, path: &Path, total: u64) {
        let bar = if self.enabled {
            ProgressBar::new(total)
        } else {
            ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::hidden())
        };
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{msg} [{elapsed_precise}] {bar:40.cyan/blue} {bytes}/{total_bytes}")
        {
            bar.set_style(style);
        }
        bar.set_message(
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
        if let Ok(mut slot) = self.bar.lock() {
            *slot = Some(bar);
        }
    }

    fn upload_progress(&self, sent: u64, _total: u64) {
        if let Ok(slot) = self.bar.lock() {
            if let Some(bar) = slot.as_ref() {
                bar.set_position(sent);
            }
        }
    }

    fn upload_finished(&self, _path: &Path) {
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(bar) = slot.take() {
                bar.finish_and_clear();
            }
        }
    }
}

/// One line per report, tab separated like the rest of the CLI output.
pub fn format_report(report: &SubmissionReport) -> String {
    let name = report
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| report.path.display().to_string());
    let sha = report
        .digest
        .map(|d| d.to_hex())
        .unwrap_or_else(|| "-".to_string());

    match &report.outcome {
        SubmissionOutcome::Submitted { attempts } => {
            let note = match &report.dedup {
                DedupStatus::PermissionRestricted => "\t- duplicate check restricted",
                DedupStatus::Unverified { .. } => "\t- duplicate check unavailable",
                _ => "",
            };
            format!(
                "OK\t- Kit submitted\t\t- sha256: {}\t- kit.kitname: {}\t- attempts: {}{}",
                sha,
                report.kit_name(),
                attempts,
                note
            )
        }
        SubmissionOutcome::Duplicate { matches } => format!(
            "OK\t- Kit already present in KIT Intel\t- sha256: {}\t- kit.kitname: {}\t- matches: {}",
            sha,
            report.kit_name(),
            matches
        ),
        SubmissionOutcome::ValidationRejected { reason } => {
            format!("ERROR\t- Rejected\t\t- Filename: {}\t- {}", name, reason)
        }
        SubmissionOutcome::RetriesExhausted {
            attempts,
            last_error,
        } => format!(
            "ERROR\t- Upload failed\t\t- Filename: {}\t- after {} attempts: {}",
            name, attempts, last_error
        ),
        SubmissionOutcome::Failed { error } => {
            format!("ERROR\t- Failed\t\t- Filename: {}\t- {}", name, error)
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct SubmitSummary {
    pub processed: usize,
    pub submitted: usize,
    pub duplicates: usize,
    pub rejected: usize,
    pub failed: usize,
}

impl SubmitSummary {
    pub fn from_reports(reports: &[SubmissionReport]) -> Self {
        reports.iter().fold(
            Self {
                processed: reports.len(),
                ..Default::default()
            },
            |mut acc, report| {
                match report.outcome {
                    SubmissionOutcome::Submitted { .. } => acc.submitted += 1,
                    SubmissionOutcome::Duplicate { .. } => acc.duplicates += 1,
                    SubmissionOutcome::ValidationRejected { .. } => acc.rejected += 1,
                    SubmissionOutcome::RetriesExhausted { .. }
                    | SubmissionOutcome::Failed { .. } => acc.failed += 1,
                }
                acc
            },
        )
    }
}

pub fn run(args: SubmitArgs, config: &KitConfig, cancel: CancellationToken) -> anyhow::Result<()> {
    if args.files.is_empty() {
        return Err(HelpfulError::new("No files or directories given")
            .with_suggestion("TRY: kitintel submit -f kit.zip")
            .into());
    }

    let client = connect(config)?;
    let observer = Arc::new(ProgressBarObserver::new(!args.json));
    let pipeline = SubmissionPipeline::new(&client, &client, config.submit.clone())
        .with_cancellation(cancel.clone())
        .with_observer(observer);

    info!(inputs = args.files.len(), recursive = args.recursive, "Starting submission");
    let reports = pipeline.submit(&args.files, args.recursive);
    let summary = SubmitSummary::from_reports(&reports);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            println!("{}", format_report(report));
        }
    }
    info!(
        processed = summary.processed,
        submitted = summary.submitted,
        duplicates = summary.duplicates,
        rejected = summary.rejected,
        failed = summary.failed,
        "Submission finished"
    );

    if cancel.is_cancelled() {
        anyhow::bail!("submission interrupted after {} file(s)", summary.processed);
    }
    if summary.failed > 0 {
        anyhow::bail!("{} of {} file(s) could not be submitted", summary.failed, summary.processed);
    }
    Ok(())
}
