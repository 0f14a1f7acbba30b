//! TCP reachability probe
//!
//! Each probe races a connect against an independent timeout; a timeout
//! completes the result without eagerly cancelling the underlying connect.
//! Batch probing is bounded by a semaphore and collects results into a keyed
//! map with a single guarded insert per completed probe.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, Semaphore};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub online: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Probe one host/port with the given timeout.
pub async fn check(host: &str, port: u32, timeout: Duration) -> CheckResult {
    let started = Instant::now();
    let addr = format!("{host}:{port}");
    let outcome = tokio::time::timeout(timeout, TcpStream::connect(&addr)).await;
    let duration_ms = started.elapsed().as_millis() as u64;
    match outcome {
        Ok(Ok(_)) => CheckResult {
            online: true,
            duration_ms,
            error: None,
        },
        Ok(Err(e)) => CheckResult {
            online: false,
            duration_ms,
            error: Some(e.to_string()),
        },
        Err(_) => CheckResult {
            online: false,
            duration_ms,
            error: Some(format!("timeout after {}ms", timeout.as_millis())),
        },
    }
}

/// Probe many `(key, host, port)` targets with at most `concurrency` probes
/// in flight, each with its own timeout. Returns results keyed by `key`.
pub async fn check_all(
    targets: Vec<(String, String, u32)>,
    concurrency: usize,
    timeout: Duration,
) -> HashMap<String, CheckResult> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let results = Arc::new(Mutex::new(HashMap::new()));

    let mut handles = Vec::with_capacity(targets.len());
    for (key, host, port) in targets {
        let semaphore = Arc::clone(&semaphore);
        let results = Arc::clone(&results);
        handles.push(tokio::spawn(async move {
            let permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };
            let result = check(&host, port, timeout).await;
            drop(permit);
            debug!("probe {key}: online={}", result.online);
            results.lock().await.insert(key, result);
        }));
    }
    for handle in handles {
        let _ = handle.await;
    }

    match Arc::try_unwrap(results) {
        Ok(map) => map.into_inner(),
        Err(arc) => arc.lock().await.clone(),
    }
}
