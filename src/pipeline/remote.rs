//! Remote HEIC → JPEG conversion through a job-based HTTP API (CloudConvert v2).
//!
//! Used only when the local codec has no HEIC decoder. One call runs the full
//! job lifecycle:
//!
//! 1. `POST {api}/jobs` with an import → convert → export task graph.
//! 2. Multipart upload of the source file to the import task's form URL.
//! 3. `GET {api}/jobs/{id}` every `poll_interval` until the job is terminal,
//!    bounded by `max_poll_wait`.
//! 4. Download the export task's first file to the requested path.
//!
//! Each network step fails fast. Retrying the whole call is the
//! orchestrator's job (see [`crate::pipeline::retry`]).

use crate::config::RemoteSettings;
use crate::error::{ConversionError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

const IMPORT_TASK: &str = "import-my-file";
const CONVERT_TASK: &str = "convert-my-file";
const EXPORT_TASK: &str = "export-my-file";

/// Converts one file remotely and stores the JPEG result at `dest`.
///
/// Implemented by [`CloudConvertClient`]; tests substitute fakes.
#[async_trait]
pub trait RemoteConverter: Send + Sync {
    async fn convert_remote(&self, input: &Path, dest: &Path) -> Result<PathBuf>;
}

/// [`RemoteConverter`] backed by the CloudConvert v2 REST API.
pub struct CloudConvertClient {
    settings: RemoteSettings,
    http: reqwest::Client,
}

impl std::fmt::Debug for CloudConvertClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudConvertClient")
            .field("settings", &self.settings)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct JobEnvelope {
    data: Job,
}

#[derive(Debug, Deserialize)]
struct Job {
    id: String,
    status: String,
    /// An array of named tasks in the live API; older payloads use a map
    /// keyed by task name. [`find_task`] accepts both.
    #[serde(default)]
    tasks: Value,
}

/// Where and how to upload the source file.
#[derive(Debug, Clone, PartialEq)]
struct UploadForm {
    url: String,
    parameters: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobState {
    Pending,
    Finished,
    Failed,
}

impl JobState {
    fn from_status(status: &str) -> Self {
        match status {
            "finished" => JobState::Finished,
            "error" | "failed" => JobState::Failed,
            _ => JobState::Pending,
        }
    }
}

#[derive(Debug, PartialEq)]
enum PollError<E> {
    Fetch(E),
    TimedOut,
}

impl CloudConvertClient {
    pub fn new(settings: RemoteSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.http_timeout)
            .build()
            .map_err(|e| ConversionError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self { settings, http })
    }

    pub fn settings(&self) -> &RemoteSettings {
        &self.settings
    }

    async fn create_job(&self, input: &Path) -> Result<Job> {
        let url = format!("{}/jobs", self.settings.api_base);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.settings.api_key)
            .json(&job_request_body())
            .send()
            .await
            .map_err(|e| remote_err(input, format!("job creation: {e}")))?;
        let envelope: JobEnvelope = parse_json(input, "job creation", response).await?;
        debug!("Created remote job {} for {}", envelope.data.id, input.display());
        Ok(envelope.data)
    }

    async fn upload(&self, input: &Path, form: UploadForm) -> Result<()> {
        let bytes = tokio::fs::read(input)
            .await
            .map_err(|e| ConversionError::io(input, e))?;
        let file_name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.heic".to_string());

        let mut multipart = reqwest::multipart::Form::new();
        for (key, value) in form.parameters {
            multipart = multipart.text(key, value);
        }
        // The file part must come after the signed form fields.
        multipart = multipart.part(
            "file",
            reqwest::multipart::Part::bytes(bytes).file_name(file_name),
        );

        let response = self
            .http
            .post(&form.url)
            .multipart(multipart)
            .send()
            .await
            .map_err(|e| remote_err(input, format!("upload: {e}")))?;
        ensure_success(input, "upload", &response)?;
        Ok(())
    }

    async fn fetch_job(&self, input: &Path, job_id: &str) -> Result<Job> {
        let url = format!("{}/jobs/{}", self.settings.api_base, job_id);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.settings.api_key)
            .send()
            .await
            .map_err(|e| remote_err(input, format!("status poll: {e}")))?;
        let envelope: JobEnvelope = parse_json(input, "status poll", response).await?;
        Ok(envelope.data)
    }

    async fn download(&self, input: &Path, url: &str, dest: &Path) -> Result<()> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| remote_err(input, format!("download: {e}")))?;
        ensure_success(input, "download", &response)?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| remote_err(input, format!("download: {e}")))?;

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ConversionError::io(parent, e))?;
        }
        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|e| ConversionError::io(dest, e))?;
        Ok(())
    }
}

#[async_trait]
impl RemoteConverter for CloudConvertClient {
    async fn convert_remote(&self, input: &Path, dest: &Path) -> Result<PathBuf> {
        info!("Converting {} remotely", input.display());

        let job = self.create_job(input).await?;
        let form = upload_form(&job.tasks)
            .ok_or_else(|| remote_err(input, "job has no upload form".to_string()))?;
        self.upload(input, form).await?;

        let finished = wait_for_job(
            || self.fetch_job(input, &job.id),
            self.settings.poll_interval,
            self.settings.max_poll_wait,
        )
        .await
        .map_err(|e| match e {
            PollError::Fetch(err) => err,
            PollError::TimedOut => ConversionError::RemoteTimeout {
                path: input.to_path_buf(),
                secs: self.settings.max_poll_wait.as_secs(),
            },
        })?;

        match JobState::from_status(&finished.status) {
            JobState::Finished => {}
            _ => {
                return Err(remote_err(
                    input,
                    format!("job {} {}: {}", finished.id, finished.status, task_failure(&finished.tasks)),
                ))
            }
        }

        let url = export_url(&finished.tasks)
            .ok_or_else(|| remote_err(input, format!("job {} has no exported file", finished.id)))?;
        self.download(input, &url, dest).await?;

        info!("Remote conversion of {} finished → {}", input.display(), dest.display());
        Ok(dest.to_path_buf())
    }
}

/// Poll `fetch` until the job is terminal or `max_wait` has passed.
async fn wait_for_job<F, Fut, E>(
    mut fetch: F,
    interval: Duration,
    max_wait: Duration,
) -> std::result::Result<Job, PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<Job, E>>,
{
    let started = Instant::now();
    loop {
        let job = fetch().await.map_err(PollError::Fetch)?;
        if JobState::from_status(&job.status) != JobState::Pending {
            return Ok(job);
        }
        if started.elapsed() + interval >= max_wait {
            return Err(PollError::TimedOut);
        }
        debug!("Remote job {} is {}", job.id, job.status);
        tokio::time::sleep(interval).await;
    }
}

fn job_request_body() -> Value {
    json!({
        "tasks": {
            IMPORT_TASK: { "operation": "import/upload" },
            CONVERT_TASK: {
                "operation": "convert",
                "input": IMPORT_TASK,
                "output_format": "jpg"
            },
            EXPORT_TASK: { "operation": "export/url", "input": CONVERT_TASK }
        }
    })
}

fn find_task<'a>(tasks: &'a Value, name: &str) -> Option<&'a Value> {
    match tasks {
        Value::Array(list) => list
            .iter()
            .find(|t| t.get("name").and_then(Value::as_str) == Some(name)),
        Value::Object(map) => map.get(name),
        _ => None,
    }
}

fn upload_form(tasks: &Value) -> Option<UploadForm> {
    let form = find_task(tasks, IMPORT_TASK)?.get("result")?.get("form")?;
    let url = form.get("url")?.as_str()?.to_string();
    let parameters = form
        .get("parameters")
        .and_then(Value::as_object)
        .map(|params| {
            params
                .iter()
                .map(|(k, v)| {
                    let v = match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (k.clone(), v)
                })
                .collect()
        })
        .unwrap_or_default();
    Some(UploadForm { url, parameters })
}

fn export_url(tasks: &Value) -> Option<String> {
    find_task(tasks, EXPORT_TASK)?
        .get("result")?
        .get("files")?
        .get(0)?
        .get("url")?
        .as_str()
        .map(str::to_string)
}

fn task_failure(tasks: &Value) -> String {
    let message = |t: &Value| t.get("message").and_then(Value::as_str).map(str::to_string);
    [IMPORT_TASK, CONVERT_TASK, EXPORT_TASK]
        .iter()
        .filter_map(|name| find_task(tasks, name))
        .find_map(message)
        .unwrap_or_else(|| "no error message".to_string())
}

fn remote_err(input: &Path, detail: String) -> ConversionError {
    ConversionError::RemoteConversion {
        path: input.to_path_buf(),
        detail,
    }
}

fn ensure_success(input: &Path, step: &str, response: &reqwest::Response) -> Result<()> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(remote_err(input, format!("{step}: HTTP {}", response.status())))
    }
}

async fn parse_json<T: serde::de::DeserializeOwned>(
    input: &Path,
    step: &str,
    response: reqwest::Response,
) -> Result<T> {
    ensure_success(input, step, &response)?;
    response
        .json()
        .await
        .map_err(|e| remote_err(input, format!("{step}: invalid response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn job(status: &str) -> Job {
        Job {
            id: "job-1".into(),
            status: status.into(),
            tasks: Value::Null,
        }
    }

    #[test]
    fn request_body_chains_three_tasks() {
        let body = job_request_body();
        assert_eq!(body["tasks"][IMPORT_TASK]["operation"], "import/upload");
        assert_eq!(body["tasks"][CONVERT_TASK]["input"], IMPORT_TASK);
        assert_eq!(body["tasks"][CONVERT_TASK]["output_format"], "jpg");
        assert_eq!(body["tasks"][EXPORT_TASK]["input"], CONVERT_TASK);
    }

    #[test]
    fn upload_form_from_task_array() {
        let raw = r#"{"data":{"id":"j","status":"waiting","tasks":[
            {"name":"import-my-file","result":{"form":{
                "url":"https://upload.example/x",
                "parameters":{"key":"abc","expires":1700000000}}}}
        ]}}"#;
        let envelope: JobEnvelope = serde_json::from_str(raw).unwrap();
        let form = upload_form(&envelope.data.tasks).unwrap();
        assert_eq!(form.url, "https://upload.example/x");
        assert!(form.parameters.contains(&("key".into(), "abc".into())));
        assert!(form.parameters.contains(&("expires".into(), "1700000000".into())));
    }

    #[test]
    fn export_url_from_task_map() {
        let tasks = json!({
            "export-my-file": {"result": {"files": [{"url": "https://dl.example/out.jpg"}]}}
        });
        assert_eq!(export_url(&tasks).as_deref(), Some("https://dl.example/out.jpg"));
        assert_eq!(export_url(&json!([])), None);
    }

    #[test]
    fn failure_message_is_taken_from_first_failed_task() {
        let tasks = json!([
            {"name": "import-my-file", "status": "finished"},
            {"name": "convert-my-file", "status": "error", "message": "Unsupported file"}
        ]);
        assert_eq!(task_failure(&tasks), "Unsupported file");
        assert_eq!(task_failure(&Value::Null), "no error message");
    }

    #[test]
    fn status_classification() {
        assert_eq!(JobState::from_status("finished"), JobState::Finished);
        assert_eq!(JobState::from_status("error"), JobState::Failed);
        assert_eq!(JobState::from_status("failed"), JobState::Failed);
        assert_eq!(JobState::from_status("processing"), JobState::Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn polling_stops_at_terminal_status() {
        let calls = AtomicU32::new(0);
        let result: std::result::Result<Job, PollError<()>> = wait_for_job(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok(job(if n < 2 { "processing" } else { "finished" })) }
            },
            Duration::from_secs(2),
            Duration::from_secs(300),
        )
        .await;
        assert_eq!(result.unwrap().status, "finished");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn polling_gives_up_after_max_wait() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();
        let result: std::result::Result<Job, PollError<()>> = wait_for_job(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(job("processing")) }
            },
            Duration::from_secs(2),
            Duration::from_secs(10),
        )
        .await;
        assert!(matches!(result, Err(PollError::TimedOut)));
        assert!(start.elapsed() <= Duration::from_secs(10));
        // polls at t = 0, 2, 4, 6, 8
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn fetch_errors_end_polling() {
        let result: std::result::Result<Job, PollError<&str>> = wait_for_job(
            || async { Err("connection reset") },
            Duration::from_secs(2),
            Duration::from_secs(10),
        )
        .await;
        assert_eq!(result.unwrap_err(), PollError::Fetch("connection reset"));
    }

    // ── Full job lifecycle against a local HTTP stand-in ─────────────────

    #[derive(Debug, Clone)]
    struct Seen {
        method: String,
        path: String,
        authorization: Option<String>,
        body: Vec<u8>,
    }

    struct FakeApi {
        base: String,
        seen: Arc<Mutex<Vec<Seen>>>,
    }

    impl FakeApi {
        /// Serve one request per connection; `route` gets the base URL and
        /// the request and returns status and body.
        async fn start<F>(route: F) -> Self
        where
            F: Fn(&str, &Seen) -> (u16, Vec<u8>) + Send + Sync + 'static,
        {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let base = format!("http://{}", listener.local_addr().unwrap());
            let seen = Arc::new(Mutex::new(Vec::new()));
            let route = Arc::new(route);
            let (server_base, server_seen) = (base.clone(), seen.clone());
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let (base, seen, route) = (server_base.clone(), server_seen.clone(), route.clone());
                    tokio::spawn(async move { respond(stream, &base, &seen, &*route).await });
                }
            });
            Self { base, seen }
        }

        fn requests(&self) -> Vec<(String, String)> {
            self.seen
                .lock()
                .unwrap()
                .iter()
                .map(|r| (r.method.clone(), r.path.clone()))
                .collect()
        }

        fn client(&self, max_poll_wait: Duration) -> CloudConvertClient {
            let mut settings = RemoteSettings::new("test-key");
            settings.api_base = self.base.clone();
            settings.poll_interval = Duration::from_millis(10);
            settings.max_poll_wait = max_poll_wait;
            settings.http_timeout = Duration::from_secs(5);
            CloudConvertClient::new(settings).unwrap()
        }
    }

    async fn respond<F>(mut stream: TcpStream, base: &str, seen: &Mutex<Vec<Seen>>, route: &F)
    where
        F: Fn(&str, &Seen) -> (u16, Vec<u8>),
    {
        let Some(request) = read_request(&mut stream).await else {
            return;
        };
        let (status, body) = route(base, &request);
        seen.lock().unwrap().push(request);
        let head = format!(
            "HTTP/1.1 {status} Fake\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        let _ = stream.write_all(head.as_bytes()).await;
        let _ = stream.write_all(&body).await;
        let _ = stream.shutdown().await;
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    async fn read_request(stream: &mut TcpStream) -> Option<Seen> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let header_end = loop {
            if let Some(i) = find(&buf, b"\r\n\r\n") {
                break i + 4;
            }
            let n = stream.read(&mut chunk).await.ok()?;
            if n == 0 {
                return None;
            }
            buf.extend_from_slice(&chunk[..n]);
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
        let mut lines = head.lines();
        let mut request_line = lines.next()?.split_whitespace();
        let method = request_line.next()?.to_string();
        let path = request_line.next()?.to_string();
        let (mut authorization, mut length, mut chunked) = (None, 0usize, false);
        for line in lines {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match name.trim().to_ascii_lowercase().as_str() {
                "authorization" => authorization = Some(value.to_string()),
                "content-length" => length = value.parse().unwrap_or(0),
                "transfer-encoding" => chunked = value.eq_ignore_ascii_case("chunked"),
                _ => {}
            }
        }

        let mut body = buf[header_end..].to_vec();
        loop {
            let done = if chunked {
                body.ends_with(b"0\r\n\r\n")
            } else {
                body.len() >= length
            };
            if done {
                break;
            }
            let n = stream.read(&mut chunk).await.ok()?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
        Some(Seen {
            method,
            path,
            authorization,
            body,
        })
    }

    fn job_json(status: &str, tasks: Value) -> Vec<u8> {
        serde_json::to_vec(&json!({"data": {"id": "j1", "status": status, "tasks": tasks}})).unwrap()
    }

    fn created_job(base: &str) -> Vec<u8> {
        job_json(
            "waiting",
            json!([{
                "name": IMPORT_TASK,
                "result": {"form": {
                    "url": format!("{base}/upload"),
                    "parameters": {"sig": "s3cr3t", "expires": 1700000000}
                }}
            }]),
        )
    }

    fn finished_job(base: &str) -> Vec<u8> {
        job_json(
            "finished",
            json!([{
                "name": EXPORT_TASK,
                "status": "finished",
                "result": {"files": [{"url": format!("{base}/dl/out.jpg")}]}
            }]),
        )
    }

    fn heic_input(dir: &TempDir) -> PathBuf {
        let input = dir.path().join("IMG_0042.heic");
        std::fs::write(&input, b"heic-bytes").unwrap();
        input
    }

    const JPEG_BYTES: &[u8] = b"\xFF\xD8remote jpeg\xFF\xD9";

    #[tokio::test]
    async fn finished_job_downloads_the_export() {
        let polls = Arc::new(AtomicU32::new(0));
        let counter = polls.clone();
        let api = FakeApi::start(move |base, req| match (req.method.as_str(), req.path.as_str()) {
            ("POST", "/jobs") => (201, created_job(base)),
            ("POST", "/upload") => (201, Vec::new()),
            ("GET", "/jobs/j1") => {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    (200, job_json("processing", json!([])))
                } else {
                    (200, finished_job(base))
                }
            }
            ("GET", "/dl/out.jpg") => (200, JPEG_BYTES.to_vec()),
            _ => (404, Vec::new()),
        })
        .await;

        let dir = TempDir::new().unwrap();
        let input = heic_input(&dir);
        let dest = dir.path().join("converted/IMG_0042.jpg");
        let out = api
            .client(Duration::from_secs(5))
            .convert_remote(&input, &dest)
            .await
            .unwrap();

        assert_eq!(out, dest);
        assert_eq!(std::fs::read(&dest).unwrap(), JPEG_BYTES);
        let expected: Vec<(String, String)> = [
            ("POST", "/jobs"),
            ("POST", "/upload"),
            ("GET", "/jobs/j1"),
            ("GET", "/jobs/j1"),
            ("GET", "/dl/out.jpg"),
        ]
        .iter()
        .map(|(m, p)| (m.to_string(), p.to_string()))
        .collect();
        assert_eq!(api.requests(), expected);

        let seen = api.seen.lock().unwrap().clone();
        for request in &seen {
            let is_api = request.path.starts_with("/jobs");
            assert_eq!(
                request.authorization.as_deref(),
                is_api.then_some("Bearer test-key"),
                "{} {}",
                request.method,
                request.path
            );
        }
        let upload = &seen[1].body;
        assert!(find(upload, b"s3cr3t").is_some());
        assert!(find(upload, b"1700000000").is_some());
        assert!(find(upload, b"filename=\"IMG_0042.heic\"").is_some());
        assert!(find(upload, b"heic-bytes").is_some());
    }

    #[tokio::test]
    async fn failed_job_is_a_remote_conversion_error() {
        let api = FakeApi::start(|base, req| match (req.method.as_str(), req.path.as_str()) {
            ("POST", "/jobs") => (201, created_job(base)),
            ("POST", "/upload") => (201, Vec::new()),
            ("GET", "/jobs/j1") => (
                200,
                job_json(
                    "error",
                    json!([{"name": CONVERT_TASK, "status": "error", "message": "Unsupported file"}]),
                ),
            ),
            _ => (404, Vec::new()),
        })
        .await;

        let dir = TempDir::new().unwrap();
        let input = heic_input(&dir);
        let dest = dir.path().join("out.jpg");
        let err = api
            .client(Duration::from_secs(5))
            .convert_remote(&input, &dest)
            .await
            .unwrap_err();

        match err {
            ConversionError::RemoteConversion { path, detail } => {
                assert_eq!(path, input);
                assert!(detail.contains("Unsupported file"), "{detail}");
            }
            other => panic!("expected RemoteConversion, got {other:?}"),
        }
        assert!(!dest.exists());
        assert!(api.requests().iter().all(|(_, p)| !p.starts_with("/dl")));
    }

    #[tokio::test]
    async fn rejected_upload_stops_before_polling() {
        let api = FakeApi::start(|base, req| match (req.method.as_str(), req.path.as_str()) {
            ("POST", "/jobs") => (201, created_job(base)),
            ("POST", "/upload") => (403, Vec::new()),
            _ => (200, job_json("finished", json!([]))),
        })
        .await;

        let dir = TempDir::new().unwrap();
        let input = heic_input(&dir);
        let err = api
            .client(Duration::from_secs(5))
            .convert_remote(&input, &dir.path().join("out.jpg"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("upload: HTTP 403"), "{err}");
        assert!(matches!(err, ConversionError::RemoteConversion { .. }));
        assert_eq!(api.requests().len(), 2);
    }

    #[tokio::test]
    async fn hung_job_times_out() {
        let api = FakeApi::start(|base, req| match (req.method.as_str(), req.path.as_str()) {
            ("POST", "/jobs") => (201, created_job(base)),
            ("POST", "/upload") => (201, Vec::new()),
            ("GET", "/jobs/j1") => (200, job_json("processing", json!([]))),
            _ => (404, Vec::new()),
        })
        .await;

        let dir = TempDir::new().unwrap();
        let input = heic_input(&dir);
        let err = api
            .client(Duration::from_millis(50))
            .convert_remote(&input, &dir.path().join("out.jpg"))
            .await
            .unwrap_err();

        assert!(matches!(err, ConversionError::RemoteTimeout { .. }), "{err}");
        assert!(api.requests().iter().filter(|(_, p)| p == "/jobs/j1").count() >= 1);
    }
}
