//! Concurrency-bounded document fetching with retry and error isolation.

mod retry;

pub use retry::RetryPolicy;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::StreamExt;
use futures_util::future::join_all;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::error::DownloadError;
use crate::models::config::DownloadConfig;
use crate::models::invoice::InvoiceRef;

/// Result type for download operations.
pub type Result<T> = std::result::Result<T, DownloadError>;

/// One document to fetch and where to put it.
#[derive(Debug)]
pub struct DownloadJob {
    pub invoice: InvoiceRef,
    pub dest: PathBuf,
}

/// Fetches documents over HTTP under a shared admission gate.
///
/// Failures never cross between jobs: a failed fetch leaves its invoice
/// undownloaded and the rest of the batch keeps going. The persisted
/// flags, not return values, are the error channel.
pub struct DownloadManager {
    client: reqwest::Client,
    gate: Arc<Semaphore>,
    retry: RetryPolicy,
}

impl DownloadManager {
    pub fn new(config: &DownloadConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            gate: Arc::new(Semaphore::new(config.concurrency.max(1))),
            retry: RetryPolicy::from_config(config),
        })
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fetch every job, returning once all of them have settled.
    ///
    /// On success the job's invoice is flagged downloaded; on failure the
    /// flag stays false. `last_updated` moves in both cases, as the final
    /// step, so a repeatedly failing document is always visibly fresh
    /// rather than stuck.
    pub async fn fetch_batch(&self, jobs: &mut [DownloadJob]) {
        join_all(jobs.iter_mut().map(|job| self.fetch_one(job))).await;
    }

    async fn fetch_one(&self, job: &mut DownloadJob) {
        match self.fetch_with_retry(&job.invoice.download_url, &job.dest).await {
            Ok(bytes) => {
                debug!(url = %job.invoice.download_url, bytes, "downloaded invoice");
                job.invoice.downloaded = true;
            }
            Err(e) => {
                warn!(url = %job.invoice.download_url, error = %e, "invoice download failed");
            }
        }
        job.invoice.last_updated = Utc::now();
    }

    /// The permit is held across every attempt, including the file write,
    /// so the gate bounds total in-flight work and not just sockets.
    async fn fetch_with_retry(&self, url: &str, dest: &Path) -> Result<u64> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| DownloadError::GateClosed)?;

        let mut attempt = 0;
        loop {
            match self.fetch_once(url, dest).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) if attempt + 1 < self.retry.attempts && e.is_retryable() => {
                    let delay = self.retry.backoff(attempt);
                    debug!(url, error = %e, ?delay, "retrying download");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, url: &str, dest: &Path) -> Result<u64> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Http {
                status,
                url: url.to_string(),
            });
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Stream into a temp file and rename into place; the destination
        // only ever holds complete documents.
        let part = dest.with_extension("part");
        let mut file = fs::File::create(&part).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);
        fs::rename(&part, dest).await?;

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    /// Minimal local HTTP fixture. `route` maps (path, hit-count-so-far)
    /// to a (status, body) pair; every connection is closed after one
    /// response, and `peak` records the highest number of requests that
    /// were in flight at once.
    struct TestServer {
        base: String,
        peak: Arc<AtomicUsize>,
    }

    async fn spawn_server<F>(route: F) -> TestServer
    where
        F: Fn(&str, u32) -> (u16, Vec<u8>) + Send + Sync + 'static,
    {
        spawn_server_with_delay(Duration::ZERO, route).await
    }

    async fn spawn_server_with_delay<F>(delay: Duration, route: F) -> TestServer
    where
        F: Fn(&str, u32) -> (u16, Vec<u8>) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let route = Arc::new(route);
        let hits: Arc<Mutex<HashMap<String, u32>>> = Arc::new(Mutex::new(HashMap::new()));
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let observed_peak = peak.clone();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let route = route.clone();
                let hits = hits.clone();
                let active = active.clone();
                let peak = peak.clone();

                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..n]).to_string();
                    let path = request
                        .split_whitespace()
                        .nth(1)
                        .unwrap_or("/")
                        .to_string();

                    let hit = {
                        let mut hits = hits.lock().unwrap();
                        let counter = hits.entry(path.clone()).or_insert(0);
                        let hit = *counter;
                        *counter += 1;
                        hit
                    };

                    let in_flight = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(in_flight, Ordering::SeqCst);
                    tokio::time::sleep(delay).await;

                    let (status, body) = route(&path, hit);
                    let reason = match status {
                        200 => "OK",
                        404 => "Not Found",
                        500 => "Internal Server Error",
                        _ => "Status",
                    };
                    let header = format!(
                        "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        body.len()
                    );
                    let _ = socket.write_all(header.as_bytes()).await;
                    let _ = socket.write_all(&body).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                });
            }
        });

        TestServer {
            base: format!("http://{addr}"),
            peak: observed_peak,
        }
    }

    fn job(url: String, dest: PathBuf) -> DownloadJob {
        DownloadJob {
            invoice: InvoiceRef {
                id: 1,
                trip_id: "trip".to_string(),
                download_url: url,
                downloaded: false,
                processed: false,
                last_updated: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            },
            dest,
        }
    }

    fn manager(concurrency: usize, attempts: u32) -> DownloadManager {
        let config = DownloadConfig {
            concurrency,
            attempts,
            backoff_base_ms: 1,
            ..DownloadConfig::default()
        };
        DownloadManager::new(&config).unwrap()
    }

    #[tokio::test]
    async fn writes_the_body_and_flags_the_invoice() {
        let server = spawn_server(|_, _| (200, b"receipt bytes".to_vec())).await;
        let dir = tempfile::tempdir().unwrap();

        let mut jobs = vec![job(
            format!("{}/trip/invoice.pdf", server.base),
            dir.path().join("trip").join("invoice.pdf"),
        )];
        manager(4, 1).fetch_batch(&mut jobs).await;

        assert!(jobs[0].invoice.downloaded);
        let written = std::fs::read(&jobs[0].dest).unwrap();
        assert_eq!(written, b"receipt bytes");
    }

    #[tokio::test]
    async fn failures_are_isolated_and_timestamps_always_move() {
        let server = spawn_server(|path, _| {
            if path.contains("missing") {
                (404, Vec::new())
            } else {
                (200, b"ok".to_vec())
            }
        })
        .await;
        let dir = tempfile::tempdir().unwrap();

        let mut jobs = vec![
            job(format!("{}/missing.pdf", server.base), dir.path().join("a.pdf")),
            job(format!("{}/present.pdf", server.base), dir.path().join("b.pdf")),
        ];
        let before = jobs[0].invoice.last_updated;
        manager(4, 1).fetch_batch(&mut jobs).await;

        assert!(!jobs[0].invoice.downloaded);
        assert!(jobs[1].invoice.downloaded);
        assert!(jobs[0].invoice.last_updated > before);
        assert!(jobs[1].invoice.last_updated > before);
        assert!(!dir.path().join("a.pdf").exists());
    }

    #[tokio::test]
    async fn retries_server_errors_within_the_budget() {
        let server = spawn_server(|_, hit| {
            if hit == 0 {
                (500, Vec::new())
            } else {
                (200, b"second time lucky".to_vec())
            }
        })
        .await;
        let dir = tempfile::tempdir().unwrap();

        let mut jobs = vec![job(
            format!("{}/flaky.pdf", server.base),
            dir.path().join("f.pdf"),
        )];
        manager(4, 3).fetch_batch(&mut jobs).await;

        assert!(jobs[0].invoice.downloaded);
    }

    #[tokio::test]
    async fn a_single_attempt_budget_does_not_retry() {
        let server = spawn_server(|_, hit| {
            if hit == 0 {
                (500, Vec::new())
            } else {
                (200, b"never seen".to_vec())
            }
        })
        .await;
        let dir = tempfile::tempdir().unwrap();

        let mut jobs = vec![job(
            format!("{}/flaky.pdf", server.base),
            dir.path().join("f.pdf"),
        )];
        manager(4, 1).fetch_batch(&mut jobs).await;

        assert!(!jobs[0].invoice.downloaded);
    }

    #[tokio::test]
    async fn the_gate_bounds_in_flight_fetches() {
        let server =
            spawn_server_with_delay(Duration::from_millis(30), |_, _| (200, b"ok".to_vec()))
                .await;
        let dir = tempfile::tempdir().unwrap();

        let mut jobs: Vec<DownloadJob> = (0..12)
            .map(|n| {
                job(
                    format!("{}/doc-{n}.pdf", server.base),
                    dir.path().join(format!("doc-{n}.pdf")),
                )
            })
            .collect();
        manager(3, 1).fetch_batch(&mut jobs).await;

        assert!(jobs.iter().all(|job| job.invoice.downloaded));
        assert!(server.peak.load(Ordering::SeqCst) <= 3);
    }
}
