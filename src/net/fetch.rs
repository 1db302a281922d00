use std::{thread, time::Duration};

use tracing::{debug, warn};

use crate::{
    foundation::error::{Goes16Error, Goes16Result},
    net::transport::Transport,
};

/// Bounded retry with a fixed pause between attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn validate(&self) -> Goes16Result<()> {
        if self.max_attempts == 0 {
            return Err(Goes16Error::validation(
                "retry policy max_attempts must be >= 1",
            ));
        }
        Ok(())
    }
}

/// GET with retry on top of a [`Transport`].
#[derive(Clone, Debug)]
pub struct Fetcher<T> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: Transport> Fetcher<T> {
    pub fn new(transport: T) -> Self {
        Self::with_policy(transport, RetryPolicy::default())
    }

    pub fn with_policy(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Downloads `url`, retrying failed attempts.
    ///
    /// Exhausting the attempts always yields [`Goes16Error::Download`] carrying
    /// the last transport error.
    pub fn fetch(&self, url: &str) -> Goes16Result<Vec<u8>> {
        self.policy.validate()?;
        let max = self.policy.max_attempts;

        let mut attempt = 1u32;
        loop {
            debug!(url, attempt, "fetching");
            match self.transport.get(url) {
                Ok(bytes) => return Ok(bytes),
                Err(err) if attempt < max => {
                    warn!(
                        url,
                        attempt,
                        max_attempts = max,
                        error = %format!("{err:#}"),
                        "download attempt failed, retrying"
                    );
                    thread::sleep(self.policy.backoff);
                    attempt += 1;
                }
                Err(err) => {
                    return Err(Goes16Error::Download {
                        url: url.to_string(),
                        attempts: attempt,
                        reason: format!("{err:#}"),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicU32, Ordering},
    };

    use super::*;

    /// Fails the first `failures` calls, then returns `body`.
    struct FlakyTransport {
        failures: u32,
        body: Vec<u8>,
        calls: AtomicU32,
        urls: Mutex<Vec<String>>,
    }

    impl FlakyTransport {
        fn new(failures: u32, body: &[u8]) -> Self {
            Self {
                failures,
                body: body.to_vec(),
                calls: AtomicU32::new(0),
                urls: Mutex::new(Vec::new()),
            }
        }
    }

    impl Transport for FlakyTransport {
        fn get(&self, url: &str) -> anyhow::Result<Vec<u8>> {
            self.urls.lock().unwrap().push(url.to_string());
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.failures {
                anyhow::bail!("simulated failure #{n}");
            }
            Ok(self.body.clone())
        }
    }

    fn no_wait(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff: Duration::ZERO,
        }
    }

    #[test]
    fn default_policy_is_three_attempts_one_second_apart() {
        let p = RetryPolicy::default();
        assert_eq!(p.max_attempts, 3);
        assert_eq!(p.backoff, Duration::from_secs(1));
    }

    #[test]
    fn first_try_success_makes_one_call() {
        let fetcher = Fetcher::with_policy(FlakyTransport::new(0, b"ok"), no_wait(3));
        assert_eq!(fetcher.fetch("http://x/a").unwrap(), b"ok");
        assert_eq!(fetcher.transport().calls.load(Ordering::SeqCst), 1);
    }

    /// Runs `f` with warnings and above captured as plain text.
    fn capture_warnings<R>(f: impl FnOnce() -> R) -> (R, String) {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buf);
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || SharedBuf(Arc::clone(&sink)))
            .finish();
        let value = tracing::subscriber::with_default(subscriber, f);
        let text = String::from_utf8(buf.lock().unwrap().clone()).unwrap();
        (value, text)
    }

    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for SharedBuf {
        fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn success_on_second_attempt_returns_bytes_after_one_retry() {
        let fetcher = Fetcher::with_policy(FlakyTransport::new(1, b"tile"), no_wait(3));
        let (bytes, logs) = capture_warnings(|| fetcher.fetch("http://x/a").unwrap());
        assert_eq!(bytes, b"tile");
        assert_eq!(logs.matches("download attempt failed, retrying").count(), 1);
        assert!(logs.contains("simulated failure #1"));
        assert_eq!(fetcher.transport().calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            *fetcher.transport().urls.lock().unwrap(),
            ["http://x/a", "http://x/a"]
        );
    }

    #[test]
    fn exhausting_three_attempts_is_a_download_error() {
        let fetcher = Fetcher::with_policy(FlakyTransport::new(u32::MAX, b""), no_wait(3));
        let (err, logs) = capture_warnings(|| fetcher.fetch("http://x/a").unwrap_err());
        assert_eq!(fetcher.transport().calls.load(Ordering::SeqCst), 3);
        assert_eq!(logs.matches("download attempt failed, retrying").count(), 2);
        match err {
            Goes16Error::Download {
                url,
                attempts,
                reason,
            } => {
                assert_eq!(url, "http://x/a");
                assert_eq!(attempts, 3);
                assert!(reason.contains("simulated failure #3"));
            }
            other => panic!("expected download error, got {other:?}"),
        }
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let fetcher = Fetcher::with_policy(FlakyTransport::new(0, b"ok"), no_wait(0));
        assert!(matches!(
            fetcher.fetch("http://x/a"),
            Err(Goes16Error::Validation(_))
        ));
        assert_eq!(fetcher.transport().calls.load(Ordering::SeqCst), 0);
    }
}
