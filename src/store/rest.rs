// src/store/rest.rs
use super::{StatusLogEntry, StatusStore, StoreError};
use crate::config::Service;
use crate::health::Status;
use crate::summary::DailySummary;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const SERVICES: &str = "services";
const STATUS_LOGS: &str = "service_status_logs";
const DAILY_SUMMARY: &str = "daily_status_summary";

/// Store backed by a PostgREST endpoint (Supabase `/rest/v1`).
pub struct RestStore {
    base: Url,
    api_key: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ServiceRow {
    #[serde(deserialize_with = "id_as_string")]
    id: String,
    name: String,
    url: String,
    threshold_ms: u64,
}

#[derive(Debug, Deserialize)]
struct StatusRow {
    status: Status,
}

/// Ids may be uuids or serial integers depending on the schema.
fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "unsupported id value: {}",
            other
        ))),
    }
}

impl RestStore {
    pub fn new(mut base: Url, api_key: String, timeout: Duration) -> Result<Self, StoreError> {
        // Url::join drops the last segment unless the path ends in '/'
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base,
            api_key,
            client,
        })
    }

    fn table_url(&self, table: &str) -> Result<Url, StoreError> {
        self.base
            .join(&format!("rest/v1/{}", table))
            .map_err(|e| StoreError::Decode(format!("bad table url for {}: {}", table, e)))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, StoreError> {
        let request = self.client.get(self.table_url(table)?).query(query);
        let response = ensure_success(self.authorized(request).send().await?).await?;
        let body = response.text().await?;

        serde_json::from_str(&body)
            .map_err(|e| StoreError::Decode(format!("{} rows: {}", table, e)))
    }

    async fn insert<T: serde::Serialize + ?Sized>(
        &self,
        table: &str,
        query: &[(&str, &str)],
        prefer: &str,
        row: &T,
    ) -> Result<(), StoreError> {
        let request = self
            .client
            .post(self.table_url(table)?)
            .query(query)
            .header("Prefer", prefer)
            .json(row);
        ensure_success(self.authorized(request).send().await?).await?;
        Ok(())
    }
}

async fn ensure_success(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Rejected {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl StatusStore for RestStore {
    async fn list_services(&self) -> Result<Vec<Service>, StoreError> {
        let rows: Vec<ServiceRow> = self
            .select(
                SERVICES,
                &[
                    ("select", "id,name,url,threshold_ms".to_string()),
                    ("order", "created_at.asc".to_string()),
                ],
            )
            .await?;

        let mut services = Vec::with_capacity(rows.len());
        for row in rows {
            match Url::parse(&row.url) {
                Ok(url) => services.push(Service {
                    id: row.id,
                    name: row.name,
                    url,
                    threshold_ms: row.threshold_ms,
                }),
                Err(e) => warn!("Skipping service {} with invalid url {:?}: {}", row.id, row.url, e),
            }
        }

        debug!("Loaded {} services from store", services.len());
        Ok(services)
    }

    async fn latest_status(&self, service_id: &str) -> Result<Option<Status>, StoreError> {
        let rows: Vec<StatusRow> = self
            .select(
                STATUS_LOGS,
                &[
                    ("select", "status".to_string()),
                    ("service_id", format!("eq.{}", service_id)),
                    ("order", "timestamp.desc".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;

        Ok(rows.into_iter().next().map(|row| row.status))
    }

    async fn append_log(&self, entry: &StatusLogEntry) -> Result<(), StoreError> {
        self.insert(STATUS_LOGS, &[], "return=minimal", entry).await
    }

    async fn daily_summary(
        &self,
        service_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailySummary>, StoreError> {
        let rows: Vec<DailySummary> = self
            .select(
                DAILY_SUMMARY,
                &[
                    (
                        "select",
                        "service_id,date,status,ok_count,warn_count,error_count,avg_response_time,updated_at"
                            .to_string(),
                    ),
                    ("service_id", format!("eq.{}", service_id)),
                    ("date", format!("eq.{}", date.format("%Y-%m-%d"))),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;

        Ok(rows.into_iter().next())
    }

    async fn save_summary(&self, summary: &DailySummary) -> Result<(), StoreError> {
        self.insert(
            DAILY_SUMMARY,
            &[("on_conflict", "service_id,date")],
            "resolution=merge-duplicates,return=minimal",
            summary,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use mockito::Matcher;
    use serde_json::json;

    async fn store_for(server: &mockito::ServerGuard) -> RestStore {
        RestStore::new(
            server.url().parse().unwrap(),
            "test-key".to_string(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_list_services_skips_bad_urls() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/v1/services")
            .match_header("apikey", "test-key")
            .match_header("authorization", "Bearer test-key")
            .match_query(Matcher::UrlEncoded(
                "order".to_string(),
                "created_at.asc".to_string(),
            ))
            .with_status(200)
            .with_body(
                json!([
                    {"id": "b1d0", "name": "Blog", "url": "https://blog.example.com", "threshold_ms": 3000},
                    {"id": 7, "name": "Broken", "url": "not a url", "threshold_ms": 100}
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let services = store_for(&server).await.list_services().await.unwrap();

        mock.assert_async().await;
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].id, "b1d0");
        assert_eq!(services[0].threshold_ms, 3000);
    }

    #[tokio::test]
    async fn test_latest_status_queries_newest_row() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/v1/service_status_logs")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("service_id".to_string(), "eq.blog".to_string()),
                Matcher::UrlEncoded("order".to_string(), "timestamp.desc".to_string()),
                Matcher::UrlEncoded("limit".to_string(), "1".to_string()),
            ]))
            .with_status(200)
            .with_body(r#"[{"status":"WARN"}]"#)
            .create_async()
            .await;

        let status = store_for(&server).await.latest_status("blog").await.unwrap();

        mock.assert_async().await;
        assert_eq!(status, Some(Status::Warn));
    }

    #[tokio::test]
    async fn test_latest_status_empty_history() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/v1/service_status_logs")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let status = store_for(&server).await.latest_status("new").await.unwrap();
        assert_eq!(status, None);
    }

    #[tokio::test]
    async fn test_append_log_posts_row() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/rest/v1/service_status_logs")
            .match_header("prefer", "return=minimal")
            .match_body(Matcher::PartialJson(json!({
                "service_id": "blog",
                "status": "ERROR",
                "http_status": null,
                "message": "Connection failed"
            })))
            .with_status(201)
            .create_async()
            .await;

        let entry = StatusLogEntry {
            service_id: "blog".to_string(),
            timestamp: Utc::now(),
            status: Status::Error,
            response_time: 15,
            http_status: None,
            message: Some("Connection failed".to_string()),
        };
        store_for(&server).await.append_log(&entry).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_write_surfaces_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/rest/v1/service_status_logs")
            .with_status(401)
            .with_body(r#"{"message":"Invalid API key"}"#)
            .create_async()
            .await;

        let entry = StatusLogEntry {
            service_id: "blog".to_string(),
            timestamp: Utc::now(),
            status: Status::Ok,
            response_time: 15,
            http_status: Some(200),
            message: None,
        };
        let err = store_for(&server).await.append_log(&entry).await.unwrap_err();

        match err {
            StoreError::Rejected { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("Invalid API key"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_summary_round_trip_through_upsert() {
        let mut server = mockito::Server::new_async().await;
        let read = server
            .mock("GET", "/rest/v1/daily_status_summary")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("service_id".to_string(), "eq.blog".to_string()),
                Matcher::UrlEncoded("date".to_string(), "eq.2026-03-14".to_string()),
            ]))
            .with_status(200)
            .with_body(
                json!([{
                    "service_id": "blog",
                    "date": "2026-03-14",
                    "status": "OK",
                    "ok_count": 3,
                    "warn_count": 0,
                    "error_count": 0,
                    "avg_response_time": 200,
                    "updated_at": "2026-03-14T11:55:00+00:00"
                }])
                .to_string(),
            )
            .create_async()
            .await;
        let write = server
            .mock("POST", "/rest/v1/daily_status_summary")
            .match_query(Matcher::UrlEncoded(
                "on_conflict".to_string(),
                "service_id,date".to_string(),
            ))
            .match_header("prefer", "resolution=merge-duplicates,return=minimal")
            .match_body(Matcher::PartialJson(json!({
                "service_id": "blog",
                "date": "2026-03-14",
                "status": "WARN",
                "ok_count": 3,
                "warn_count": 1,
                "avg_response_time": 375
            })))
            .with_status(201)
            .create_async()
            .await;

        let result = crate::health::CheckResult {
            service_id: "blog".to_string(),
            status: Status::Warn,
            response_time: 900,
            http_status: Some(200),
            message: None,
        };
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap();
        let summary = store_for(&server)
            .await
            .upsert_daily_summary(&result, now)
            .await
            .unwrap();

        read.assert_async().await;
        write.assert_async().await;
        assert_eq!(summary.total(), 4);
    }
}
