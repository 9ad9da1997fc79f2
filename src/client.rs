use std::time::{Duration, Instant};

use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::models::{JobDescription, JobRef, JobSummary, NewJobDescription, ParseResponse};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Blocking client for the sourcing backend. Cheap to clone; each TUI
/// worker thread gets its own copy.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Self::with_client(base_url, client)
    }

    pub fn with_client(base_url: &str, client: Client) -> ApiResult<Self> {
        let trimmed = base_url.trim_end_matches('/');
        let base_url = Url::parse(trimmed).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", trimmed, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(trimmed.to_string()));
        }
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Append percent-encoded path segments to the base URL.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `with_client`: the base always has a path
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub fn list_jobs(&self) -> ApiResult<Vec<JobSummary>> {
        let req = self.client.get(self.url(&["list"]));
        self.send(req, "GET /list", "Failed to fetch job listings")
    }

    pub fn get_job(&self, job_id: &str) -> ApiResult<JobDescription> {
        let req = self.client.get(self.url(&["get-job", job_id]));
        self.send(req, "GET /get-job", "Failed to fetch job data")
    }

    pub fn parse_job_description(&self, job: &NewJobDescription) -> ApiResult<ParseResponse> {
        let req = self.client.post(self.url(&["parse-jd"])).json(job);
        self.send(req, "POST /parse-jd", "Failed to parse job description")
    }

    pub fn search_candidates(&self, job_id: &str) -> ApiResult<JobDescription> {
        let body = JobRef { job_id: job_id.to_string() };
        let req = self.client.post(self.url(&["search-candidates"])).json(&body);
        self.send(req, "POST /search-candidates", "Failed to fetch candidates")
    }

    pub fn rank_candidates(&self, job_id: &str) -> ApiResult<JobDescription> {
        let body = JobRef { job_id: job_id.to_string() };
        let req = self.client.post(self.url(&["rank-candidates"])).json(&body);
        self.send(req, "POST /rank-candidates", "Failed to rank candidates")
    }

    fn send<T: DeserializeOwned>(&self, req: RequestBuilder, op: &str, fallback: &str) -> ApiResult<T> {
        let started = Instant::now();
        let response = req.send().map_err(|e| {
            warn!(op, error = %e, "request failed");
            ApiError::Request(e)
        })?;

        let status = response.status();
        debug!(op, status = status.as_u16(), elapsed_ms = started.elapsed().as_millis() as u64, "response");

        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let err = ApiError::from_body(status.as_u16(), &body, fallback);
            warn!(op, status = status.as_u16(), error = %err, "backend returned an error");
            return Err(err);
        }

        let body = response.text()?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::Path,
        http::StatusCode,
        routing::{get, post},
    };
    use serde_json::{Value, json};

    fn spawn_backend(app: Router) -> String {
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().expect("runtime");
            rt.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
                tx.send(listener.local_addr().expect("local_addr")).expect("send addr");
                axum::serve(listener, app).await.expect("serve");
            });
        });
        let addr = rx.recv().expect("backend addr");
        format!("http://{}/api", addr)
    }

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = client("http://localhost:8000/api/");
        assert_eq!(client.base_url(), "http://localhost:8000/api");
    }

    #[test]
    fn test_client_rejects_invalid_url() {
        let err = ApiClient::new("not a url", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
    }

    #[test]
    fn test_job_id_is_percent_encoded() {
        let client = client("http://localhost:8000/api");
        let url = client.url(&["get-job", "team/42?x#y"]);
        assert_eq!(url.as_str(), "http://localhost:8000/api/get-job/team%2F42%3Fx%23y");
    }

    #[test]
    fn test_get_job_with_reserved_characters() {
        let app = Router::new().route(
            "/api/get-job/:id",
            get(|Path(id): Path<String>| async move { Json(json!({"job_id": id})) }),
        );
        let base = spawn_backend(app);

        let job = client(&base).get_job("team/42?x#y").unwrap();
        assert_eq!(job.job_id.as_deref(), Some("team/42?x#y"));
    }

    #[test]
    fn test_list_jobs() {
        let app = Router::new().route(
            "/api/list",
            get(|| async {
                Json(json!([
                    {"job_id": "j1", "job_title": "Rust Dev", "candidate_count": 3,
                     "candidates_fetched": true, "candidates_ranked": false},
                    {"job_id": "j2", "job_title": null, "candidate_count": 0,
                     "candidates_fetched": false, "candidates_ranked": false}
                ]))
            }),
        );
        let base = spawn_backend(app);

        let jobs = client(&base).list_jobs().unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].title(), "Rust Dev");
        assert_eq!(jobs[0].candidate_count(), 3);
        assert_eq!(jobs[1].title(), "Unknown");
    }

    #[test]
    fn test_get_job_uses_path_id() {
        let app = Router::new().route(
            "/api/get-job/:id",
            get(|Path(id): Path<String>| async move {
                Json(json!({
                    "job_id": id,
                    "title": "Backend Engineer",
                    "candidates_fetched": true,
                    "candidates": [{"username": "a", "bio": "x"}],
                    "ranked_candidates": []
                }))
            }),
        );
        let base = spawn_backend(app);

        let job = client(&base).get_job("abc123").unwrap();
        assert_eq!(job.job_id.as_deref(), Some("abc123"));
        assert_eq!(job.candidates.len(), 1);
        assert!(job.candidates_fetched);
    }

    #[test]
    fn test_get_job_not_found_detail() {
        let app = Router::new().route(
            "/api/get-job/:id",
            get(|| async {
                (StatusCode::NOT_FOUND, Json(json!({"detail": "JD not found in database"})))
            }),
        );
        let base = spawn_backend(app);

        let err = client(&base).get_job("missing").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "JD not found in database");
    }

    #[test]
    fn test_parse_jd_posts_form() {
        let app = Router::new().route(
            "/api/parse-jd",
            post(|Json(body): Json<Value>| async move {
                let title = body["job_title"].as_str().unwrap_or_default().to_string();
                let desc = body["job_description"].as_str().unwrap_or_default();
                if desc.is_empty() {
                    return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"detail": "empty"})));
                }
                (
                    StatusCode::OK,
                    Json(json!({
                        "job_id": "new1",
                        "message": format!("Job description parsed successfully for '{}'", title)
                    })),
                )
            }),
        );
        let base = spawn_backend(app);
        let client = client(&base);

        let resp = client
            .parse_job_description(&NewJobDescription {
                job_title: "SRE".to_string(),
                job_description: "Keep it running".to_string(),
            })
            .unwrap();
        assert_eq!(resp.message, "Job description parsed successfully for 'SRE'");
        assert_eq!(resp.job_id.as_deref(), Some("new1"));

        let err = client
            .parse_job_description(&NewJobDescription {
                job_title: "SRE".to_string(),
                job_description: String::new(),
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "empty");
    }

    #[test]
    fn test_search_and_rank_send_job_id() {
        let app = Router::new()
            .route(
                "/api/search-candidates",
                post(|Json(body): Json<Value>| async move {
                    Json(json!({
                        "job_id": body["job_id"],
                        "count": 2,
                        "candidates": [{"username": "a"}, {"username": "b"}],
                        "message": "Candidates fetched and stored successfully"
                    }))
                }),
            )
            .route(
                "/api/rank-candidates",
                post(|Json(body): Json<Value>| async move {
                    Json(json!({
                        "job_id": body["job_id"],
                        "candidates_fetched": true,
                        "candidates_ranked": true,
                        "candidates": [{"username": "a"}, {"username": "b"}],
                        "ranked_candidates": [{"username": "b", "score": 9.0}, {"username": "a", "score": 4.0}]
                    }))
                }),
            );
        let base = spawn_backend(app);
        let client = client(&base);

        let fetched = client.search_candidates("j9").unwrap();
        assert_eq!(fetched.job_id.as_deref(), Some("j9"));
        assert_eq!(fetched.candidates.len(), 2);
        // Partial record: flags the backend left out fall back to false
        assert!(!fetched.candidates_fetched);
        assert_eq!(fetched.title(), "Untitled job");

        let ranked = client.rank_candidates("j9").unwrap();
        assert!(ranked.candidates_ranked);
        assert_eq!(ranked.ranked_candidates[0].username, "b");
    }

    #[test]
    fn test_error_without_detail_uses_generic_message() {
        let app = Router::new().route(
            "/api/rank-candidates",
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let base = spawn_backend(app);

        let err = client(&base).rank_candidates("j1").unwrap_err();
        assert_eq!(err.status(), Some(502));
        assert_eq!(err.to_string(), "Failed to rank candidates");
    }

    #[test]
    fn test_undecodable_body_is_decode_error() {
        let app = Router::new().route("/api/list", get(|| async { "not json" }));
        let base = spawn_backend(app);

        let err = client(&base).list_jobs().unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn test_connection_refused_is_request_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let err = client(&format!("http://127.0.0.1:{}/api", port))
            .list_jobs()
            .unwrap_err();
        assert!(matches!(err, ApiError::Request(_)));
    }
}
