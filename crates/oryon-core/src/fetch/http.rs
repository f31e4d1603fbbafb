//! Blocking HTTP GET on top of the async reqwest client.

use std::time::Duration;

use tracing::debug;

use crate::error::FetchError;

/// Redirect hops followed before a request is abandoned.
const MAX_REDIRECTS: usize = 10;

/// HTTP client used for registry lookups and tarball downloads.
///
/// Every request blocks the calling thread until the body has been read
/// or the configured deadline has passed.
///
/// The client drives its own tokio runtime, so it must be used from
/// synchronous code. Calling it from inside an async task panics; wrap the
/// call in `tokio::task::spawn_blocking` there.
#[derive(Debug)]
pub struct HttpClient {
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("oryon/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::HttpClient(e.to_string()))?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| FetchError::HttpClient(format!("failed to create tokio runtime: {e}")))?;

        Ok(Self {
            client,
            runtime,
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET `url`, following redirects, and return the response body.
    ///
    /// Transport failures, timeouts and non-success statuses are all
    /// `DownloadFailed`.
    pub fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.runtime.block_on(self.get_bytes_async(url))
    }

    async fn get_bytes_async(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!(%url, "HTTP GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.download_failed(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::DownloadFailed {
                url: url.to_string(),
                reason: format!("HTTP {}", status),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.download_failed(url, &e))?;

        debug!(%url, bytes = bytes.len(), "HTTP GET complete");
        Ok(bytes.to_vec())
    }

    fn download_failed(&self, url: &str, err: &reqwest::Error) -> FetchError {
        let reason = if err.is_timeout() {
            format!("request timed out after {}s", self.timeout.as_secs())
        } else if err.is_redirect() {
            format!("too many redirects (limit {})", MAX_REDIRECTS)
        } else {
            error_chain(err)
        };

        FetchError::DownloadFailed {
            url: url.to_string(),
            reason,
        }
    }
}

/// Flatten an error and its sources into one line.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_chain_joins_sources() {
        let inner = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let outer = FetchError::io("connect", inner);
        assert_eq!(error_chain(&outer), "connect: refused: refused");
    }

    #[test]
    fn unreachable_host_is_download_failed() {
        // Bind then release a port so nothing is listening on it
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let url = format!("http://127.0.0.1:{port}/foo.tar.gz");

        let client = HttpClient::new(Duration::from_secs(5)).unwrap();
        let err = client.get_bytes(&url).unwrap_err();

        match err {
            FetchError::DownloadFailed { url: failed, .. } => assert_eq!(failed, url),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn usable_from_spawn_blocking_inside_a_runtime() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let url = format!("http://127.0.0.1:{port}/foo.tar.gz");

        let result = tokio::task::spawn_blocking(move || {
            let client = HttpClient::new(Duration::from_secs(5))?;
            client.get_bytes(&url)
        })
        .await
        .unwrap();

        assert!(matches!(result, Err(FetchError::DownloadFailed { .. })));
    }
}
