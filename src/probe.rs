//! Single-code probe: submit, classify, persist.
//!
//! One probe is one HTTP submission of one candidate code. The response is
//! classified by its declared content type into a closed set of kinds and
//! persisted accordingly; HTML goes through asset localization. Every
//! failure is contained inside the probe's own report — nothing here can
//! abort a sibling probe.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::checked::CheckedSet;
use crate::client::HttpClient;
use crate::localize;
use crate::storage;

/// Classification of a 200 response by declared content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContentKind {
    Image,
    Video,
    Html,
    Text,
}

impl ContentKind {
    /// Derive the kind once from a `Content-Type` header value.
    pub fn from_content_type(content_type: &str) -> Self {
        let ct = content_type.trim();
        if ct.starts_with("image/") {
            ContentKind::Image
        } else if ct.starts_with("video/") {
            ContentKind::Video
        } else if ct.starts_with("text/html") {
            ContentKind::Html
        } else {
            ContentKind::Text
        }
    }
}

/// What happened to one candidate code.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
    /// The code was probed in this or an earlier run; no request was made.
    AlreadyChecked,
    /// The endpoint answered with a non-200 status.
    NotFound { status: u16 },
    /// The endpoint answered 200 and the response was saved.
    Found { kind: ContentKind, path: PathBuf },
    /// Transport-level failure (connect error, timeout). Terminal for this
    /// code: it was marked checked before the outcome was known.
    Error { message: String },
}

/// One result per input code, reported in input order.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub code: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = &self.code;
        match &self.outcome {
            Outcome::AlreadyChecked => {
                write!(f, "Code '{code}' has already been checked.")
            }
            Outcome::NotFound { status } => {
                write!(f, "Code '{code}' does not exist. Status code: {status}")
            }
            Outcome::Found {
                kind: ContentKind::Image,
                path,
            } => write!(f, "Code '{code}' exists. Image saved as {}", path.display()),
            Outcome::Found {
                kind: ContentKind::Video,
                path,
            } => write!(f, "Code '{code}' exists. Video saved as {}", path.display()),
            Outcome::Found {
                kind: ContentKind::Html,
                path,
            } => write!(
                f,
                "Code '{code}' exists. HTML content saved as {}",
                path.display()
            ),
            Outcome::Found {
                kind: ContentKind::Text,
                path,
            } => write!(
                f,
                "Code '{code}' exists. Response saved as {}",
                path.display()
            ),
            Outcome::Error { message } => {
                write!(f, "An error occurred for code '{code}': {message}")
            }
        }
    }
}

/// Probes candidate codes against the endpoint and persists responses.
#[derive(Clone)]
pub struct Prober {
    client: HttpClient,
    checked: CheckedSet,
    out_dir: PathBuf,
}

impl Prober {
    pub fn new(client: HttpClient, checked: CheckedSet, out_dir: &Path) -> Self {
        Self {
            client,
            checked,
            out_dir: out_dir.to_path_buf(),
        }
    }

    /// Probe one candidate code. Infallible by contract: every failure mode
    /// is folded into the report.
    pub async fn probe(&self, code: &str) -> ProbeReport {
        // Mark before the outcome is known: a timed-out or failed probe
        // still counts as checked (at-most-once policy). The mark doubles
        // as the duplicate-race arbiter — one winner per unique code.
        if !self.checked.mark(code) {
            return ProbeReport {
                code: code.to_string(),
                outcome: Outcome::AlreadyChecked,
            };
        }

        let outcome = match self.probe_inner(code).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(code, "probe failed (code stays marked checked): {e:#}");
                Outcome::Error {
                    message: format!("{e:#}"),
                }
            }
        };

        ProbeReport {
            code: code.to_string(),
            outcome,
        }
    }

    async fn probe_inner(&self, code: &str) -> Result<Outcome> {
        let resp = self.client.submit_code(code).await?;

        let status = resp.status().as_u16();
        if status != 200 {
            return Ok(Outcome::NotFound { status });
        }

        let content_type = resp
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let kind = ContentKind::from_content_type(&content_type);
        debug!(code, content_type, ?kind, "code exists");

        // The per-code directory exists only once a code has answered 200.
        let dir = storage::code_dir(&self.out_dir, code)?;

        let path = match kind {
            ContentKind::Image => {
                let ext = storage::extension_for(&content_type);
                let path = dir.join(format!("{code}{ext}"));
                let bytes = resp.bytes().await.context("image body read failed")?;
                tokio::fs::write(&path, bytes)
                    .await
                    .with_context(|| format!("failed to write {}", path.display()))?;
                path
            }
            ContentKind::Video => {
                let ext = storage::extension_for(&content_type);
                let path = dir.join(format!("{code}{ext}"));
                storage::write_streamed(resp, &path).await?;
                path
            }
            ContentKind::Html => {
                let body = resp.text().await.context("html body read failed")?;
                localize::localize_html(&self.client, &dir, code, &body).await?
            }
            ContentKind::Text => {
                let path = dir.join(format!("{code}.txt"));
                let body = resp.text().await.context("text body read failed")?;
                tokio::fs::write(&path, body)
                    .await
                    .with_context(|| format!("failed to write {}", path.display()))?;
                path
            }
        };

        Ok(Outcome::Found { kind, path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_string_contains, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn prober(server_uri: &str, out_dir: &Path) -> Prober {
        let client = HttpClient::new(server_uri, Duration::from_secs(5));
        Prober::new(client, CheckedSet::new(), out_dir)
    }

    #[test]
    fn test_content_kind_dispatch() {
        assert_eq!(
            ContentKind::from_content_type("image/png"),
            ContentKind::Image
        );
        assert_eq!(
            ContentKind::from_content_type("video/mp4"),
            ContentKind::Video
        );
        assert_eq!(
            ContentKind::from_content_type("text/html; charset=utf-8"),
            ContentKind::Html
        );
        assert_eq!(
            ContentKind::from_content_type("text/plain"),
            ContentKind::Text
        );
        assert_eq!(
            ContentKind::from_content_type("application/json"),
            ContentKind::Text
        );
        assert_eq!(ContentKind::from_content_type(""), ContentKind::Text);
    }

    #[tokio::test]
    async fn test_already_checked_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = HttpClient::new(&server.uri(), Duration::from_secs(5));
        let checked = CheckedSet::new();
        checked.mark("Mabel");
        let prober = Prober::new(client, checked, dir.path());

        let report = prober.probe("Mabel").await;
        assert!(matches!(report.outcome, Outcome::AlreadyChecked));
        server.verify().await;
    }

    #[tokio::test]
    async fn test_not_found_marks_checked() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = HttpClient::new(&server.uri(), Duration::from_secs(5));
        let checked = CheckedSet::new();
        let prober = Prober::new(client, checked.clone(), dir.path());

        let report = prober.probe("Nope").await;
        assert!(matches!(report.outcome, Outcome::NotFound { status: 404 }));
        assert!(checked.contains("Nope"));
        // No directory for codes that do not exist.
        assert!(!dir.path().join("Nope").exists());
    }

    #[tokio::test]
    async fn test_image_saved_with_guessed_extension() {
        let server = MockServer::start().await;
        let bytes = b"\x89PNG pretend".to_vec();
        Mock::given(method("POST"))
            .and(body_string_contains("Waddles"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(bytes.clone()),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let prober = prober(&server.uri(), dir.path());

        let report = prober.probe("Waddles").await;
        match &report.outcome {
            Outcome::Found { kind, path } => {
                assert_eq!(*kind, ContentKind::Image);
                assert!(path.ends_with("Waddles/Waddles.png"));
                assert_eq!(std::fs::read(path).unwrap(), bytes);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(report.to_string().contains("Image saved as"));
    }

    #[tokio::test]
    async fn test_video_streamed_without_truncation() {
        let server = MockServer::start().await;
        let body = vec![0x5au8; 4 * 1024 * 1024];
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "video/mp4")
                    .set_body_bytes(body.clone()),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let prober = prober(&server.uri(), dir.path());

        let report = prober.probe("Weirdmageddon").await;
        match &report.outcome {
            Outcome::Found { kind, path } => {
                assert_eq!(*kind, ContentKind::Video);
                assert!(path.ends_with("Weirdmageddon/Weirdmageddon.mp4"));
                assert_eq!(std::fs::metadata(path).unwrap().len(), body.len() as u64);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_other_content_saved_as_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/json")
                    .set_body_string("{\"secret\": true}"),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let prober = prober(&server.uri(), dir.path());

        let report = prober.probe("Axolotl").await;
        match &report.outcome {
            Outcome::Found { kind, path } => {
                assert_eq!(*kind, ContentKind::Text);
                assert!(path.ends_with("Axolotl/Axolotl.txt"));
                assert_eq!(
                    std::fs::read_to_string(path).unwrap(),
                    "{\"secret\": true}"
                );
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transport_error_is_contained_and_marks_checked() {
        // Nothing listens here; the connect fails immediately.
        let dir = tempfile::tempdir().unwrap();
        let client = HttpClient::new("http://127.0.0.1:9", Duration::from_secs(1));
        let checked = CheckedSet::new();
        let prober = Prober::new(client, checked.clone(), dir.path());

        let report = prober.probe("Gobblewonker").await;
        assert!(matches!(report.outcome, Outcome::Error { .. }));
        assert!(checked.contains("Gobblewonker"));
        assert!(report.to_string().starts_with("An error occurred"));
    }
}
