//! External-process HTTP call with retry/backoff, and the offline/stub test
//! hooks (spec §4.E).

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::SynergyError;
use synergy_common::env;

const DEFAULT_MAX_RETRIES: u32 = 3;
const TRANSIENT_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Raw outcome of one HTTP round-trip, pre-classification. Classifying a
/// [`TransportResponse`] into a [`SynergyError`] is the dispatcher's job
/// (spec §4.D), not the transport's.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
    pub stderr: String,
    pub exit: i32,
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub max_retries: u32,
    pub offline: bool,
    pub offline_response: String,
    pub curl_stub: Option<PathBuf>,
    pub capture_dir: Option<PathBuf>,
}

impl TransportConfig {
    pub fn from_env() -> Self {
        let max_retries = std::env::var(env::SYNERGY_MAX_RETRIES)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_RETRIES);

        Self {
            max_retries,
            offline: env::env_flag(env::SYNERGY_OFFLINE),
            offline_response: std::env::var(env::SYNERGY_OFFLINE_RESPONSE)
                .unwrap_or_else(|_| env::DEFAULT_OFFLINE_RESPONSE.to_string()),
            curl_stub: std::env::var(env::SYNERGY_CURL_STUB).ok().map(PathBuf::from),
            capture_dir: std::env::var(env::SYNERGY_CURL_CAPTURE_DIR).ok().map(PathBuf::from),
        }
    }
}

fn is_transient(resp: &TransportResponse) -> bool {
    resp.exit != 0 || TRANSIENT_STATUSES.contains(&resp.status)
}

/// `POST(url, headers, body) -> TransportResponse`. Retries transient
/// failures up to `cfg.max_retries` times with exponential backoff; a
/// non-transient HTTP 4xx is returned on the first attempt.
pub fn post(
    cfg: &TransportConfig,
    url: &str,
    headers: &[(String, String)],
    body: &str,
) -> Result<TransportResponse, SynergyError> {
    if cfg.offline {
        debug!("offline mode: returning canned response");
        return Ok(TransportResponse { status: 200, body: cfg.offline_response.clone(), stderr: String::new(), exit: 0 });
    }

    if let Some(stub) = &cfg.curl_stub {
        let body = std::fs::read_to_string(stub)?;
        return Ok(TransportResponse { status: 200, body, stderr: String::new(), exit: 0 });
    }

    let attempts = cfg.max_retries.max(1);
    let mut last = None;
    for attempt in 1..=attempts {
        let resp = run_curl_once(cfg, url, headers, body)?;
        let transient = is_transient(&resp);
        if !transient || attempt == attempts {
            return Ok(resp);
        }
        warn!(attempt, status = resp.status, exit = resp.exit, "transient failure, retrying");
        last = Some(resp);
        std::thread::sleep(Duration::from_millis(200 * 2u64.pow(attempt - 1)));
    }

    // Unreachable when attempts >= 1, but keeps the function total.
    last.ok_or_else(|| SynergyError::TransportError { exit_code: -1, stderr: "no attempt was made".to_string() })
}

fn run_curl_once(
    cfg: &TransportConfig,
    url: &str,
    headers: &[(String, String)],
    body: &str,
) -> Result<TransportResponse, SynergyError> {
    let body_file = tempfile::NamedTempFile::new()?;
    std::fs::write(body_file.path(), body)?;
    let out_file = tempfile::NamedTempFile::new()?;
    let err_file = tempfile::NamedTempFile::new()?;

    let mut cmd = Command::new("curl");
    cmd.arg("-sS").arg("-X").arg("POST");
    for (key, value) in headers {
        cmd.arg("-H").arg(format!("{key}: {value}"));
    }
    cmd.arg("--data-binary").arg(format!("@{}", body_file.path().display()));
    cmd.arg("--output").arg(out_file.path());
    cmd.arg("--stderr").arg(err_file.path());
    cmd.arg("-w").arg("%{http_code}");
    cmd.arg(url);

    if let Some(dir) = &cfg.capture_dir {
        capture_request(dir, url, headers, body)?;
    }

    let output = cmd.output()?;
    let exit = output.status.code().unwrap_or(-1);
    let status = String::from_utf8_lossy(&output.stdout).trim().parse().unwrap_or(0);
    let body = std::fs::read_to_string(out_file.path()).unwrap_or_default();
    let stderr = std::fs::read_to_string(err_file.path()).unwrap_or_default();

    Ok(TransportResponse { status, body, stderr, exit })
}

fn capture_request(dir: &std::path::Path, url: &str, headers: &[(String, String)], body: &str) -> Result<(), SynergyError> {
    std::fs::create_dir_all(dir)?;
    let id = Uuid::new_v4();
    std::fs::write(dir.join(format!("{id}.url")), url)?;
    let header_lines: Vec<String> = headers.iter().map(|(k, v)| format!("{k}: {v}")).collect();
    std::fs::write(dir.join(format!("{id}.headers")), header_lines.join("\n"))?;
    std::fs::write(dir.join(format!("{id}.body")), body)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_mode_returns_the_canned_response_without_spawning_curl() {
        let cfg = TransportConfig {
            max_retries: 3,
            offline: true,
            offline_response: "canned".to_string(),
            curl_stub: None,
            capture_dir: None,
        };
        let resp = post(&cfg, "https://example.invalid", &[], "{}").expect("offline short-circuit");
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, "canned");
    }

    #[test]
    fn curl_stub_returns_its_file_contents_as_http_200() {
        let dir = tempfile::TempDir::new().expect("tmp");
        let stub = dir.path().join("stub.json");
        std::fs::write(&stub, r#"{"ok":true}"#).expect("write stub");

        let cfg = TransportConfig {
            max_retries: 3,
            offline: false,
            offline_response: String::new(),
            curl_stub: Some(stub),
            capture_dir: None,
        };
        let resp = post(&cfg, "https://example.invalid", &[], "{}").expect("stub short-circuit");
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, r#"{"ok":true}"#);
    }

    #[test]
    fn transient_status_set_matches_spec() {
        for status in [408, 429, 500, 502, 503, 504] {
            let resp = TransportResponse { status, body: String::new(), stderr: String::new(), exit: 0 };
            assert!(is_transient(&resp));
        }
        let resp = TransportResponse { status: 404, body: String::new(), stderr: String::new(), exit: 0 };
        assert!(!is_transient(&resp));
    }
}
