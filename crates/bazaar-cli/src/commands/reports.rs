use bazaar_core::models::{Report, ReportStatus};

use crate::cli::{ReportCommands, ReportStatusArg};
use crate::commands::common::{format_report_lines, normalize_bazaar_id, AppContext};
use crate::error::CliError;

impl From<ReportStatusArg> for ReportStatus {
    fn from(status: ReportStatusArg) -> Self {
        match status {
            ReportStatusArg::Pending => Self::Pending,
            ReportStatusArg::Resolved => Self::Resolved,
            ReportStatusArg::Dismissed => Self::Dismissed,
        }
    }
}

pub async fn run_reports(command: ReportCommands, ctx: &AppContext) -> Result<(), CliError> {
    let api = ctx.reports();
    match command {
        ReportCommands::Create {
            bazaar_id,
            reason,
            details,
        } => {
            let bazaar_id = normalize_bazaar_id(&bazaar_id)?;
            if reason.trim().is_empty() {
                return Err(CliError::Rejected("Report reason cannot be empty".to_string()));
            }
            let report = api
                .create_report(&bazaar_id, &reason, &details)
                .await
                .ok_or_else(|| CliError::Rejected("Report was not accepted".to_string()))?;
            println!("Reported {} as {}", report.bazaar_id, report.id);
        }
        ReportCommands::List {
            bazaar,
            status,
            json,
        } => {
            let mut reports = match bazaar {
                Some(bazaar_id) => {
                    api.get_reports_by_bazaar(&normalize_bazaar_id(&bazaar_id)?)
                        .await
                }
                None => api.get_all_reports(status.map(ReportStatus::from)).await,
            };
            if let Some(status) = status.map(ReportStatus::from) {
                reports.retain(|report| report.status == status);
            }
            print_reports(&reports, json)?;
        }
        ReportCommands::Resolve { id } => {
            set_status(ctx, &id, ReportStatus::Resolved).await?;
        }
        ReportCommands::Dismiss { id } => {
            set_status(ctx, &id, ReportStatus::Dismissed).await?;
        }
    }
    Ok(())
}

async fn set_status(ctx: &AppContext, id: &str, status: ReportStatus) -> Result<(), CliError> {
    let report = ctx
        .reports()
        .update_report_status(id, status)
        .await
        .ok_or_else(|| CliError::Rejected(format!("Could not update report {}", id.trim())))?;
    println!("Report {} is now {}", report.id, report.status);
    Ok(())
}

fn print_reports(reports: &[Report], as_json: bool) -> Result<(), CliError> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(reports)?);
    } else if reports.is_empty() {
        println!("No reports.");
    } else {
        for line in format_report_lines(reports) {
            println!("{line}");
        }
    }
    Ok(())
}
