use http::HeaderMap;
use once_cell::sync::Lazy;
use tracing::instrument;

use crate::{Request, Response};

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(Default::default);

/// The GraphQL service that answers everything but introspection.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Upstream {
    /// Service address
    ///
    /// For example: 1.2.3.4:8000, example.com:8080
    pub addr: String,

    /// Use TLS
    pub tls: bool,

    /// GraphQL HTTP path, default is `/`.
    pub query_path: Option<String>,
}

impl Upstream {
    pub fn url(&self) -> String {
        let scheme = match self.tls {
            true => "https",
            false => "http",
        };
        format!("{}://{}{}", scheme, self.addr, self.query_path.as_deref().unwrap_or("/"))
    }

    #[instrument(skip(self, header_map), err(Debug), level = "trace")]
    pub async fn query(&self, request: &Request, header_map: &HeaderMap) -> anyhow::Result<Response> {
        let url = self.url();
        let raw_resp = HTTP_CLIENT
            .post(&url)
            .headers(header_map.clone())
            .json(request)
            .send()
            .await?;

        if !raw_resp.status().is_success() {
            let body = raw_resp.text().await?;
            return Err(anyhow::anyhow!(
                "received non-2xx response from upstream \"{}\", body: \"{}\"",
                url,
                body
            ));
        }

        Ok(raw_resp.json::<Response>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_defaults_to_root_path() {
        let mut upstream = Upstream {
            addr: "localhost:4000".to_string(),
            tls: false,
            query_path: None,
        };
        assert_eq!(upstream.url(), "http://localhost:4000/");

        upstream.tls = true;
        upstream.query_path = Some("/graphql".to_string());
        assert_eq!(upstream.url(), "https://localhost:4000/graphql");
    }
}
