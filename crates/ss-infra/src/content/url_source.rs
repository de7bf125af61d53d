//! URL sources, fetched lazily when a stream is opened.

use std::fs::File;
use std::io::{self, Read};
use std::time::Duration;

use ss_core::content::ByteStream;
use ss_core::error::StorageError;
use ss_core::ports::StreamProducer;
use tracing::debug;
use url::Url;

use super::normalizer::open_file;

pub(crate) struct UrlProducer {
    url: Url,
    timeout: Duration,
}

impl UrlProducer {
    pub(crate) fn new(url: Url, timeout: Duration) -> Self {
        Self { url, timeout }
    }
}

impl StreamProducer for UrlProducer {
    fn open(&self) -> Result<ByteStream, StorageError> {
        if self.url.scheme() == "file" {
            let path = self.url.to_file_path().map_err(|_| {
                StorageError::InvalidSource(format!("{} is not a local file url", self.url))
            })?;
            let file: File = open_file(&path)?;
            return Ok(Box::new(file));
        }

        debug!(url = %self.url, "Fetching url content");
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| StorageError::Network(format!("failed to build http client: {e}")))?;

        let response = client
            .get(self.url.clone())
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|e| StorageError::Network(format!("fetch {}: {e}", self.url)))?;

        Ok(Box::new(ResponseBody {
            response,
            url: self.url.clone(),
        }))
    }
}

/// Response body whose transport failures stay network errors when read.
struct ResponseBody {
    response: reqwest::blocking::Response,
    url: Url,
}

impl Read for ResponseBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.response.read(buf).map_err(|e| {
            if e.kind() == io::ErrorKind::Interrupted {
                return e;
            }
            io::Error::other(StorageError::Network(format!(
                "read body of {}: {e}",
                self.url
            )))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::TcpListener;
    use std::thread;

    /// Serves one response that declares `declared` bytes but sends only `body`.
    fn serve_once(declared: usize, body: &'static [u8]) -> (Url, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request);
            write!(
                socket,
                "HTTP/1.1 200 OK\r\nContent-Length: {declared}\r\nConnection: close\r\n\r\n"
            )
            .unwrap();
            socket.write_all(body).unwrap();
        });
        (Url::parse(&format!("http://{addr}/blob")).unwrap(), server)
    }

    #[test]
    fn truncated_body_is_a_network_error() {
        let (url, server) = serve_once(100_000, b"0123456789");
        let mut stream = UrlProducer::new(url, Duration::from_secs(5)).open().unwrap();

        let mut out = Vec::new();
        let err = StorageError::from_stream_error(stream.read_to_end(&mut out).unwrap_err());
        server.join().unwrap();

        assert!(matches!(err, StorageError::Network(_)), "{err:?}");
        assert!(err.is_transient());
    }

    #[test]
    fn complete_body_is_read_through() {
        let (url, server) = serve_once(5, b"hello");
        let mut stream = UrlProducer::new(url, Duration::from_secs(5)).open().unwrap();

        let mut out = Vec::new();
        stream.read_to_end(&mut out).unwrap();
        server.join().unwrap();
        assert_eq!(out, b"hello");
    }
}
