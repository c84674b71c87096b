//! The one HTTP operation the store needs: a GET whose body is read either as
//! a stream (episode audio) or all at once (feed XML).

use std::pin::Pin;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::{Stream, TryStreamExt};

const USER_AGENT: &str = concat!("podstore/", env!("CARGO_PKG_VERSION"));

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// Status and body of a GET, before the body has been read
pub struct HttpResponse {
    pub status: u16,
    pub content_length: Option<u64>,
    pub body: ByteStream,
}

impl HttpResponse {
    /// 2xx and 3xx count as success; redirects are followed by the client
    pub fn is_success(&self) -> bool {
        self.status < 400
    }

    /// Read the rest of the body into memory
    pub async fn collect(self) -> Result<Bytes, reqwest::Error> {
        let capacity = self
            .content_length
            .and_then(|len| usize::try_from(len).ok())
            .unwrap_or_default();
        let buffer = self
            .body
            .try_fold(BytesMut::with_capacity(capacity), |mut buffer, chunk| async move {
                buffer.extend_from_slice(&chunk);
                Ok::<_, reqwest::Error>(buffer)
            })
            .await?;
        Ok(buffer.freeze())
    }
}

#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, reqwest::Error>;
}

/// reqwest-backed client sending the podstore user agent
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
        let response = self.client.get(url).send().await?;
        Ok(HttpResponse {
            status: response.status().as_u16(),
            content_length: response.content_length(),
            body: Box::pin(response.bytes_stream()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, chunks: &[&'static [u8]]) -> HttpResponse {
        let chunks: Vec<Result<Bytes, reqwest::Error>> =
            chunks.iter().map(|&c| Ok(Bytes::from_static(c))).collect();
        HttpResponse {
            status,
            content_length: None,
            body: Box::pin(futures::stream::iter(chunks)),
        }
    }

    #[test]
    fn client_errors_and_server_errors_are_failures() {
        assert!(response(200, &[]).is_success());
        assert!(response(304, &[]).is_success());
        assert!(!response(404, &[]).is_success());
        assert!(!response(503, &[]).is_success());
    }

    #[tokio::test]
    async fn collect_joins_every_chunk() {
        let body = response(200, &[b"<rss>", b"</rss>"]).collect().await.unwrap();

        assert_eq!(&body[..], b"<rss></rss>");
    }

    #[test]
    fn user_agent_names_the_crate() {
        assert!(USER_AGENT.starts_with("podstore/"));
    }
}
