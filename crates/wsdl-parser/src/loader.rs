//! WSDL document retrieval.
//!
//! A source is either an HTTP(S) URL or a filesystem path. The fetch is a
//! single attempt with no retry; a failure aborts the whole run.

use wsdl2rest_core::{Error, Result};

/// Loads raw WSDL XML from a file path or URL.
///
/// Sources starting with `http://` or `https://` are fetched over HTTP;
/// anything else is read from the filesystem. Non-2xx responses count as
/// fetch failures.
///
/// # Errors
///
/// Returns [`Error::Fetch`] when the document cannot be retrieved.
pub async fn load(source: &str) -> Result<String> {
    if source.starts_with("http://") || source.starts_with("https://") {
        tracing::info!(url = source, "fetching WSDL");
        let response = reqwest::get(source).await.map_err(|err| Error::Fetch {
            source_desc: source.to_string(),
            source: Box::new(err),
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch {
                source_desc: source.to_string(),
                source: format!("HTTP status {status}").into(),
            });
        }
        response.text().await.map_err(|err| Error::Fetch {
            source_desc: source.to_string(),
            source: Box::new(err),
        })
    } else {
        tracing::info!(path = source, "reading WSDL file");
        std::fs::read_to_string(source).map_err(|err| Error::Fetch {
            source_desc: source.to_string(),
            source: Box::new(err),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::io::Write as _;

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<definitions/>").unwrap();
        let content = load(file.path().to_str().unwrap()).await.unwrap();
        assert_eq!(content, "<definitions/>");
    }

    #[tokio::test]
    async fn test_load_missing_file_is_fetch_error() {
        let err = load("/definitely/not/here.wsdl").await.unwrap_err();
        assert!(err.is_fetch());
    }

    #[tokio::test]
    async fn test_load_from_url() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/svc.wsdl");
            then.status(200).body("<definitions name=\"X\"/>");
        });

        let content = load(&server.url("/svc.wsdl")).await.unwrap();
        assert!(content.contains("definitions"));
        mock.assert();
    }

    #[tokio::test]
    async fn test_load_http_error_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/gone.wsdl");
            then.status(404);
        });

        let err = load(&server.url("/gone.wsdl")).await.unwrap_err();
        assert!(err.is_fetch());
        assert!(format!("{err:?}").contains("404"));
    }
}
