//! Source image loading
//!
//! Reference images travel to providers inline (base64 plus MIME type).
//! `https://` URLs are downloaded, `data:` URLs are decoded in place.

use crate::error::AppError;
use crate::providers::http;
use crate::state::models::ImageData;
use base64::{engine::general_purpose, Engine as _};

const PROVIDER_NAME: &str = "source image host";

/// Whether `url` is an acceptable source image reference
///
/// Only secure transport (`https://`) or an inline `data:image/...` URL is
/// accepted.
pub fn validate_source_url(url: &str) -> Result<(), AppError> {
    if url.starts_with("data:") {
        return parse_data_url(url).map(|_| ());
    }

    let parsed = reqwest::Url::parse(url)
        .map_err(|e| AppError::Validation(format!("invalid image URL '{}': {}", url, e)))?;
    if parsed.scheme() != "https" {
        return Err(AppError::Validation(format!(
            "image URL must use https, got '{}'",
            parsed.scheme()
        )));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(AppError::Validation(format!("image URL '{}' has no host", url)));
    }
    Ok(())
}

/// Split a `data:<mime>;base64,<payload>` URL
pub fn parse_data_url(url: &str) -> Result<ImageData, AppError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| AppError::Validation("not a data URL".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| AppError::Validation("data URL has no payload".to_string()))?;
    let mime_type = meta
        .strip_suffix(";base64")
        .ok_or_else(|| AppError::Validation("data URL must be base64 encoded".to_string()))?;
    if !mime_type.starts_with("image/") {
        return Err(AppError::Validation(format!(
            "data URL must carry an image, got '{}'",
            mime_type
        )));
    }
    if payload.is_empty() {
        return Err(AppError::Validation("data URL payload is empty".to_string()));
    }
    Ok(ImageData {
        mime_type: mime_type.to_string(),
        data: payload.to_string(),
    })
}

fn mime_from_extension(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    if path.ends_with(".jpg") || path.ends_with(".jpeg") {
        "image/jpeg"
    } else if path.ends_with(".webp") {
        "image/webp"
    } else if path.ends_with(".gif") {
        "image/gif"
    } else {
        "image/png"
    }
}

/// Downloads reference images for inline upload
#[derive(Clone)]
pub struct ImageFetcher {
    client: reqwest::Client,
}

impl ImageFetcher {
    /// Create a fetcher sharing the gateway's HTTP client
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Load an image as inline data
    ///
    /// A non-2xx answer from the image host is a provider failure.
    pub async fn load(&self, source: &str) -> Result<ImageData, AppError> {
        if source.starts_with("data:") {
            return parse_data_url(source);
        }

        tracing::debug!(url = %source, "Fetching source image");

        let response = self
            .client
            .get(source)
            .send()
            .await
            .map_err(|e| http::send_error(PROVIDER_NAME, e))?;

        if !response.status().is_success() {
            return Err(http::status_error(PROVIDER_NAME, response, false).await);
        }

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .filter(|v| v.starts_with("image/"))
            .unwrap_or_else(|| mime_from_extension(source).to_string());

        let bytes = response.bytes().await.map_err(|e| {
            AppError::Provider(format!("Failed to read source image body: {}", e))
        })?;
        if bytes.is_empty() {
            return Err(AppError::MissingArtifact(format!(
                "source image {} is empty",
                source
            )));
        }

        Ok(ImageData {
            mime_type,
            data: general_purpose::STANDARD.encode(&bytes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use serial_test::serial;

    #[test]
    fn test_validate_accepts_https_and_data() {
        assert!(validate_source_url("https://cdn.example.com/shoe.png").is_ok());
        assert!(validate_source_url("data:image/png;base64,aGVsbG8=").is_ok());
    }

    #[test]
    fn test_validate_rejects_insecure_and_garbage() {
        for url in [
            "http://cdn.example.com/shoe.png",
            "ftp://cdn.example.com/shoe.png",
            "not a url",
            "data:text/plain;base64,aGVsbG8=",
            "data:image/png,raw",
        ] {
            assert!(
                matches!(validate_source_url(url), Err(AppError::Validation(_))),
                "{} should be rejected",
                url
            );
        }
    }

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(mime_from_extension("https://x/a.JPG?sig=1"), "image/jpeg");
        assert_eq!(mime_from_extension("https://x/a.webp"), "image/webp");
        assert_eq!(mime_from_extension("https://x/a"), "image/png");
    }

    #[tokio::test]
    async fn test_load_data_url_without_network() {
        let fetcher = ImageFetcher::new(reqwest::Client::new());
        let image = fetcher.load("data:image/jpeg;base64,/9j/4AAQ").await.unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(image.data, "/9j/4AAQ");
    }

    #[tokio::test]
    #[serial]
    async fn test_load_downloads_and_encodes() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/shoe.png")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body("hello")
            .create_async()
            .await;

        let fetcher = ImageFetcher::new(reqwest::Client::new());
        let image = fetcher
            .load(&format!("{}/shoe.png", server.url()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, "aGVsbG8=");
    }

    #[tokio::test]
    #[serial]
    async fn test_load_404_is_provider_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/gone.png")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = ImageFetcher::new(reqwest::Client::new());
        let result = fetcher.load(&format!("{}/gone.png", server.url())).await;
        assert!(matches!(result, Err(AppError::Provider(_))));
    }
}
