use serde_json::json;

use crate::models::{Report, ReportStatus};
use crate::pocketbase::{collections, Filter, ListOptions, RecordApi, ReportRecord};

/// User reports about listings, and their moderation
pub struct ReportApi<A> {
    remote: A,
}

impl<A: RecordApi> ReportApi<A> {
    pub const fn new(remote: A) -> Self {
        Self { remote }
    }

    pub async fn create_report(&self, bazaar_id: &str, reason: &str, details: &str) -> Option<Report> {
        let body = json!({
            "bazaar": bazaar_id.trim(),
            "reason": reason.trim(),
            "details": details.trim(),
            "status": ReportStatus::Pending.as_str(),
        });
        match self
            .remote
            .create::<ReportRecord>(collections::REPORTS, &body)
            .await
        {
            Ok(record) => Some(record.into()),
            Err(error) => {
                tracing::error!("Failed to create report for {bazaar_id}: {error}");
                None
            }
        }
    }

    pub async fn get_reports_by_bazaar(&self, bazaar_id: &str) -> Vec<Report> {
        self.list(Filter::all().eq("bazaar", bazaar_id.trim())).await
    }

    pub async fn update_report_status(&self, report_id: &str, status: ReportStatus) -> Option<Report> {
        let body = json!({ "status": status.as_str() });
        match self
            .remote
            .update::<ReportRecord>(collections::REPORTS, report_id.trim(), &body)
            .await
        {
            Ok(record) => Some(record.into()),
            Err(error) => {
                tracing::error!("Failed to update report {report_id}: {error}");
                None
            }
        }
    }

    /// Every report, optionally only those in `status`
    pub async fn get_all_reports(&self, status: Option<ReportStatus>) -> Vec<Report> {
        let filter = status.map_or_else(Filter::all, |status| {
            Filter::all().eq("status", status.as_str())
        });
        self.list(filter).await
    }

    async fn list(&self, filter: Filter) -> Vec<Report> {
        let options = ListOptions::new()
            .filter(filter)
            .expand("bazaar")
            .sort("-created");
        match self
            .remote
            .get_full_list::<ReportRecord>(collections::REPORTS, &options)
            .await
        {
            Ok(records) => records.into_iter().map(Report::from).collect(),
            Err(error) => {
                tracing::error!("Failed to fetch reports: {error}");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::pocketbase::fake::{FakeRecordApi, Method};

    fn seeded() -> ReportApi<FakeRecordApi> {
        let remote = FakeRecordApi::new();
        remote.seed(
            "reports",
            json!({ "id": "r1", "bazaar": "b1", "reason": "closed", "status": "pending", "created": "2025-03-01 10:00:00.000Z" }),
        );
        remote.seed(
            "reports",
            json!({ "id": "r2", "bazaar": "b1", "reason": "wrong-hours", "status": "resolved", "created": "2025-03-03 10:00:00.000Z" }),
        );
        remote.seed(
            "reports",
            json!({ "id": "r3", "bazaar": "b2", "reason": "spam", "status": "pending", "created": "2025-03-02 10:00:00.000Z" }),
        );
        ReportApi::new(remote)
    }

    #[tokio::test]
    async fn create_report_starts_pending() {
        let api = ReportApi::new(FakeRecordApi::new());
        let report = api
            .create_report("b1", "closed", " Gone since last week ")
            .await
            .unwrap();
        assert_eq!(report.bazaar_id, "b1");
        assert_eq!(report.status, ReportStatus::Pending);
        assert_eq!(report.details, "Gone since last week");
    }

    #[tokio::test]
    async fn reports_by_bazaar_are_newest_first() {
        let reports = seeded().get_reports_by_bazaar("b1").await;
        let ids: Vec<&str> = reports.iter().map(|report| report.id.as_str()).collect();
        assert_eq!(ids, vec!["r2", "r1"]);
    }

    #[tokio::test]
    async fn all_reports_filter_by_status() {
        let api = seeded();
        assert_eq!(api.get_all_reports(None).await.len(), 3);
        assert_eq!(api.get_all_reports(Some(ReportStatus::Pending)).await.len(), 2);

        let calls = api.remote.calls_to(Method::List, "reports");
        assert_eq!(calls[0].filter, None);
        assert_eq!(calls[1].filter.as_deref(), Some(r#"status = "pending""#));
    }

    #[tokio::test]
    async fn update_status_patches_record() {
        let api = seeded();
        let updated = api
            .update_report_status("r1", ReportStatus::Dismissed)
            .await
            .unwrap();
        assert_eq!(updated.status, ReportStatus::Dismissed);
        assert!(api.update_report_status("nope", ReportStatus::Resolved).await.is_none());
    }

    #[tokio::test]
    async fn failures_degrade_to_empty() {
        let api = seeded();
        api.remote.fail(Method::List, "reports", 403);
        api.remote.fail(Method::Create, "reports", 400);
        assert!(api.get_all_reports(None).await.is_empty());
        assert!(api.create_report("b1", "closed", "").await.is_none());
    }
}
