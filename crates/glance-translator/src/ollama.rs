use std::net::IpAddr;
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use crate::{EndpointError, InferenceBackend, InferenceError, InferenceRequest, ProviderMetadata};

const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct OllamaErrorBody {
    error: String,
}

/// Ollama over its local HTTP API
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    client: reqwest::Client,
    base_url: Url,
}

impl OllamaBackend {
    /// Only loopback endpoints are accepted; captured text never leaves the machine.
    pub fn new(base_url: &str) -> Result<Self, EndpointError> {
        let mut url = Url::parse(base_url).map_err(|e| EndpointError::Invalid {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(EndpointError::Invalid {
                url: base_url.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        if !is_loopback(&url) {
            return Err(EndpointError::NotLocal(base_url.to_string()));
        }

        // Url::join drops the last segment unless the path ends with '/'
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: url,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, InferenceError> {
        self.base_url
            .join(path)
            .map_err(|e| InferenceError::Unreachable(e.to_string()))
    }
}

fn is_loopback(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };

    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }

    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .is_ok_and(|ip| ip.is_loopback())
}

#[async_trait::async_trait]
impl InferenceBackend for OllamaBackend {
    async fn generate(&self, request: &InferenceRequest) -> Result<String, InferenceError> {
        let mut options = serde_json::json!({
            "temperature": request.temperature,
            "num_predict": request.max_tokens,
        });
        if let Some(sampling) = request.sampling {
            options["top_k"] = sampling.top_k.into();
            options["top_p"] = sampling.top_p.into();
            options["min_p"] = sampling.min_p.into();
        }

        let body = serde_json::json!({
            "model": request.model_id,
            "prompt": request.prompt,
            "stream": false,
            "raw": request.raw,
            "options": options,
        });

        let response = self
            .client
            .post(self.endpoint("api/generate")?)
            .json(&body)
            .send()
            .await
            .map_err(|e| InferenceError::Unreachable(e.to_string()))?;

        let status = response.status();
        let body_text = response
            .text()
            .await
            .map_err(|e| InferenceError::Unreachable(e.to_string()))?;

        if !status.is_success() {
            tracing::warn!("Ollama API error ({}): {}", status, body_text);
            let message = serde_json::from_str::<OllamaErrorBody>(&body_text)
                .map(|b| b.error)
                .unwrap_or_else(|_| format!("HTTP {}", status));
            return Err(InferenceError::Model(message));
        }

        tracing::trace!("Ollama raw body: {}", body_text);

        serde_json::from_str::<OllamaResponse>(&body_text)
            .map(|r| r.response)
            .map_err(|e| InferenceError::Model(format!("malformed response: {}", e)))
    }

    async fn health_check(&self) -> bool {
        let Ok(url) = self.endpoint("api/tags") else {
            return false;
        };

        match self.client.get(url).timeout(HEALTH_TIMEOUT).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!("Ollama health check failed: {}", e);
                false
            }
        }
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            name: "ollama".to_string(),
            endpoint: self.base_url.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use glance_types::TranslationModel;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    use super::*;

    /// Serve one canned HTTP response and hand back the request body
    async fn serve_once(status: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];

            let header_end = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
                if n == 0 {
                    break buf.len();
                }
            };

            let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
            let content_length = headers
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);

            while buf.len() < header_end + content_length {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }

            let request_body = String::from_utf8_lossy(&buf[header_end..]).to_string();
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            let _ = tx.send(request_body);
        });

        (format!("http://{}", addr), rx)
    }

    fn request() -> InferenceRequest {
        InferenceRequest::new(
            &TranslationModel::Gemma3n.config(),
            "Translate \"Hello\"".to_string(),
            false,
        )
    }

    #[tokio::test]
    async fn test_generate_success() {
        let (url, body_rx) =
            serve_once("200 OK", r#"{"model":"gemma3n","response":"สวัสดี","done":true}"#).await;
        let backend = OllamaBackend::new(&url).unwrap();

        let text = backend.generate(&request()).await.unwrap();
        assert_eq!(text, "สวัสดี");

        let sent: serde_json::Value = serde_json::from_str(&body_rx.await.unwrap()).unwrap();
        assert_eq!(sent["model"], "gemma3n");
        assert_eq!(sent["stream"], false);
        assert_eq!(sent["raw"], false);
        assert_eq!(sent["options"]["num_predict"], 200);
    }

    #[tokio::test]
    async fn test_missing_model_is_model_error() {
        let (url, _rx) = serve_once("404 Not Found", r#"{"error":"model 'gemma3n' not found"}"#).await;
        let backend = OllamaBackend::new(&url).unwrap();

        assert_eq!(
            backend.generate(&request()).await,
            Err(InferenceError::Model("model 'gemma3n' not found".to_string()))
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_model_error() {
        let (url, _rx) = serve_once("200 OK", "not json").await;
        let backend = OllamaBackend::new(&url).unwrap();

        assert!(matches!(
            backend.generate(&request()).await,
            Err(InferenceError::Model(_))
        ));
    }

    #[tokio::test]
    async fn test_closed_port_is_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let backend = OllamaBackend::new(&format!("http://{}", addr)).unwrap();
        assert!(matches!(
            backend.generate(&request()).await,
            Err(InferenceError::Unreachable(_))
        ));
        assert!(!backend.health_check().await);
    }

    #[tokio::test]
    async fn test_health_check() {
        let (url, _rx) = serve_once("200 OK", r#"{"models":[]}"#).await;
        let backend = OllamaBackend::new(&url).unwrap();
        assert!(backend.health_check().await);
    }

    #[test]
    fn test_endpoint_must_be_local() {
        assert!(OllamaBackend::new("http://localhost:11434").is_ok());
        assert!(OllamaBackend::new("http://127.0.0.1:11434").is_ok());
        assert!(OllamaBackend::new("http://[::1]:11434").is_ok());

        assert!(matches!(
            OllamaBackend::new("http://translate.example.com:11434"),
            Err(EndpointError::NotLocal(_))
        ));
        assert!(matches!(
            OllamaBackend::new("http://192.168.1.20:11434"),
            Err(EndpointError::NotLocal(_))
        ));
        assert!(matches!(
            OllamaBackend::new("not a url"),
            Err(EndpointError::Invalid { .. })
        ));
    }

    #[test]
    fn test_base_path_is_preserved() {
        let backend = OllamaBackend::new("http://localhost:11434/ollama").unwrap();
        assert_eq!(
            backend.endpoint("api/generate").unwrap().as_str(),
            "http://localhost:11434/ollama/api/generate"
        );
    }
}
