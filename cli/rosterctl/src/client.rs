//! HTTP binding of the roster store.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use roster_grid::{Location, Staff};
use roster_reconcile::{DayEntryDto, RosterStore, StaffFilter, StoreError};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::config::{Config, Credentials};
use crate::error::CliError;

/// API client for the roster service.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client from config and credentials.
    pub fn new(config: &Config, credentials: Option<&Credentials>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(creds) = credentials {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", creds.token))
                    .context("Invalid token format")?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.api_url().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn day_path(date: NaiveDate) -> String {
        format!("/api/roster/days/{}", date.format("%Y-%m-%d"))
    }

    /// Make a GET request.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, CliError> {
        debug!(path, "GET");
        let response = self.client.get(self.url(path)).query(query).send().await?;

        self.handle_response(response).await
    }

    /// Make a POST request.
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, CliError> {
        debug!(path, "POST");
        let response = self.client.post(self.url(path)).json(body).send().await?;

        self.handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, CliError> {
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            self.handle_error(response).await
        }
    }

    async fn handle_error<T>(&self, response: reqwest::Response) -> Result<T, CliError> {
        let status = response.status();

        if status.as_u16() == 401 {
            return Err(CliError::NotAuthenticated);
        }

        let error_body: ApiErrorResponse =
            response.json().await.unwrap_or_else(|_| ApiErrorResponse {
                code: "unknown".to_string(),
                message: status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string(),
            });

        Err(CliError::api(
            status.as_u16(),
            error_body.code,
            error_body.message,
        ))
    }
}

#[async_trait]
impl RosterStore for ApiClient {
    async fn list_locations(&self, active_only: bool) -> Result<Vec<Location>, StoreError> {
        let query: &[(&str, &str)] = if active_only {
            &[("active", "true")]
        } else {
            &[]
        };
        Ok(self.get("/api/locations", query).await?)
    }

    async fn list_staff(&self, filter: &StaffFilter) -> Result<Vec<Staff>, StoreError> {
        let mut query = Vec::new();
        if filter.active_only {
            query.push(("active", "true"));
        }
        if let Some(q) = filter.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            query.push(("q", q));
        }
        Ok(self.get("/api/staff", &query).await?)
    }

    async fn fetch_day(&self, date: NaiveDate) -> Result<Vec<DayEntryDto>, StoreError> {
        Ok(self.get(&Self::day_path(date), &[]).await?)
    }

    async fn submit_day(
        &self,
        date: NaiveDate,
        entries: Vec<DayEntryDto>,
    ) -> Result<Vec<DayEntryDto>, StoreError> {
        Ok(self.post(&Self::day_path(date), &entries).await?)
    }
}

/// API error response structure.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    code: String,
    message: String,
}

#[cfg(test)]
mod tests {
    use roster_id::{LocationId, StaffId};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer, token: Option<&str>) -> ApiClient {
        let config = Config {
            api_url: format!("{}/", server.uri()),
            ..Config::default()
        };
        let creds = token.map(|t| Credentials::new(t.to_string()));
        ApiClient::new(&config, creds.as_ref()).unwrap()
    }

    fn tuesday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 3).unwrap()
    }

    #[tokio::test]
    async fn test_list_locations_sends_token_and_filter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/locations"))
            .and(query_param("active", "true"))
            .and(header("authorization", "Bearer t0k3n"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 1, "name": "Surgical Center", "color": "3B82F6" },
                { "id": 2, "name": "Maternity", "color": "#EF4444", "active": true },
                { "id": 3, "name": "Triage", "color": "" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let locations = client_for(&server, Some("t0k3n"))
            .list_locations(true)
            .await
            .unwrap();
        assert_eq!(locations.len(), 3);
        assert_eq!(locations[0].name, "Surgical Center");
        assert_eq!(locations[0].color.as_ref().unwrap().as_str(), "#3b82f6");
        assert!(locations[0].active);
        assert_eq!(locations[2].id, LocationId::new(3).unwrap());
        assert_eq!(locations[2].color, None);
    }

    #[tokio::test]
    async fn test_list_staff_passes_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/staff"))
            .and(query_param("active", "true"))
            .and(query_param("q", "ab"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{ "id": 1, "code": "ABC", "name": "A. B. Carter" }])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let staff = client_for(&server, None)
            .list_staff(&StaffFilter::active().with_query(" ab "))
            .await
            .unwrap();
        assert_eq!(staff.len(), 1);
        assert_eq!(staff[0].id, StaffId::new(1).unwrap());
        assert_eq!(staff[0].code, "ABC");
    }

    #[tokio::test]
    async fn test_fetch_day_reads_store_format() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/roster/days/2026-03-03"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "serverId": 40,
                "staffId": 1,
                "staffCode": "ABC",
                "date": "2026-03-03",
                "items": [{
                    "serverId": 400,
                    "locationId": 2,
                    "slotStart": "09:00:00",
                    "color": "EF4444",
                    "icon": "data:image/png;base64,iVBORw0KGgo="
                }]
            }])))
            .mount(&server)
            .await;

        let day = client_for(&server, None).fetch_day(tuesday()).await.unwrap();
        assert_eq!(day.len(), 1);
        assert_eq!(day[0].staff_code.as_deref(), Some("ABC"));
        assert_eq!(day[0].items[0].slot_start, "09:00:00");
        assert_eq!(day[0].items[0].location_id, LocationId::new(2).unwrap());
        assert!(day[0].items[0].icon.is_some());
    }

    #[tokio::test]
    async fn test_submit_day_posts_entries() {
        let server = MockServer::start().await;
        let answer = json!([{
            "serverId": 41,
            "staffId": 3,
            "date": "2026-03-03",
            "items": [{ "serverId": 410, "locationId": 1, "slotStart": "10:00:00" }]
        }]);
        Mock::given(method("POST"))
            .and(path("/api/roster/days/2026-03-03"))
            .and(body_json(json!([{
                "serverId": null,
                "staffId": 3,
                "date": "2026-03-03",
                "items": [{ "serverId": null, "locationId": 1, "slotStart": "10:00" }]
            }])))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer))
            .expect(1)
            .mount(&server)
            .await;

        let entries = vec![DayEntryDto {
            server_id: None,
            staff_id: StaffId::new(3).unwrap(),
            staff_code: None,
            date: tuesday(),
            items: vec![roster_reconcile::ItemDto {
                server_id: None,
                location_id: LocationId::new(1).unwrap(),
                slot_start: "10:00".into(),
                color: None,
                icon: None,
            }],
        }];

        let saved = client_for(&server, None)
            .submit_day(tuesday(), entries)
            .await
            .unwrap();
        assert_eq!(saved[0].server_id.map(|id| id.value()), Some(41));
    }

    #[tokio::test]
    async fn test_error_body_becomes_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/roster/days/2026-03-03"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "code": "duplicate_slot",
                "message": "slot 09:00 appears twice for staff 1"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server, None)
            .submit_day(tuesday(), vec![])
            .await
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::Rejected {
                status: 409,
                message: "slot 09:00 appears twice for staff 1".into()
            }
        );
    }

    #[tokio::test]
    async fn test_unauthorized_and_bodyless_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/locations"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/staff"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("expired"));
        let err = client.list_locations(true).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected { status: 401, .. }));

        let err = client.list_staff(&StaffFilter::active()).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected { status: 503, .. }));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/roster/days/2026-03-03"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server, None).fetch_day(tuesday()).await.unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unavailable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let config = Config {
            api_url: format!("http://{addr}"),
            ..Config::default()
        };
        let client = ApiClient::new(&config, None).unwrap();

        let err = client.fetch_day(tuesday()).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(err.is_transient());
    }
}
