use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use url::Url;

use crate::eutils::Literature;

pub const DEFAULT_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/";

const USER_AGENT: &str = concat!(
    "pubmed-fetch/",
    env!("CARGO_PKG_VERSION"),
    " (+https://www.ncbi.nlm.nih.gov/books/NBK25501/)"
);

/// PubMed through the NCBI E-utilities `esearch` and `efetch` endpoints.
pub struct PubMed {
    agent: ureq::Agent,
    base: Url,
    api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    esearchresult: SearchResult,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

impl PubMed {
    /// `timeout` caps each whole request; `None` keeps the transport defaults.
    pub fn new(base: Url, api_key: Option<String>, timeout: Option<Duration>) -> Self {
        let agent = match timeout {
            Some(t) => {
                let cfg = ureq::Agent::config_builder()
                    .timeout_global(Some(t))
                    .build();
                ureq::Agent::new_with_config(cfg)
            }
            None => ureq::Agent::new_with_defaults(),
        };
        PubMed {
            agent,
            base: with_trailing_slash(base),
            api_key,
        }
    }

    fn endpoint(&self, tool: &str, params: &[(&str, &str)]) -> anyhow::Result<Url> {
        let mut url = self
            .base
            .join(tool)
            .with_context(|| format!("invalid E-utilities base URL {}", self.base))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
            if let Some(key) = &self.api_key {
                pairs.append_pair("api_key", key);
            }
        }
        Ok(url)
    }

    fn get(&self, url: &Url) -> anyhow::Result<String> {
        tracing::debug!(%url, "GET");
        let body = self
            .agent
            .get(url.as_str())
            .header("User-Agent", USER_AGENT)
            .call()?
            .into_body()
            .read_to_string()
            .context("failed to read response body")?;
        Ok(body)
    }
}

impl Literature for PubMed {
    fn search(&self, term: &str, retmax: u32) -> anyhow::Result<Vec<String>> {
        let retmax = retmax.to_string();
        let url = self.endpoint(
            "esearch.fcgi",
            &[
                ("db", "pubmed"),
                ("term", term),
                ("retmax", &retmax),
                ("retmode", "json"),
            ],
        )?;
        let body = self
            .get(&url)
            .with_context(|| format!("search request failed for query {term:?}"))?;
        let ids = parse_search_response(&body)?;
        tracing::info!(term, found = ids.len(), "search finished");
        Ok(ids)
    }

    fn fetch(&self, id: &str) -> anyhow::Result<String> {
        let url = self.endpoint(
            "efetch.fcgi",
            &[("db", "pubmed"), ("id", id), ("retmode", "xml")],
        )?;
        self.get(&url)
            .with_context(|| format!("fetch request failed for PubMed ID {id}"))
    }
}

fn parse_search_response(body: &str) -> anyhow::Result<Vec<String>> {
    let envelope: SearchEnvelope =
        serde_json::from_str(body).context("malformed esearch response")?;
    Ok(envelope.esearchresult.idlist)
}

/// `Url::join` drops the last path segment unless the base ends in a slash.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
mod tests {
    use std::{
        io::{BufRead, BufReader, Write},
        net::TcpListener,
        thread,
    };

    use super::*;

    /// Answer the next `requests` connections on a local port with `status` and no body.
    fn serve_status(status: &'static str, requests: usize) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        thread::spawn(move || {
            for stream in listener.incoming().take(requests) {
                let mut stream = stream.unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut line = String::new();
                while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                    line.clear();
                }
                write!(
                    stream,
                    "HTTP/1.1 {status}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                )
                .unwrap();
            }
        });
        Url::parse(&format!("http://127.0.0.1:{port}/entrez/eutils/")).unwrap()
    }

    fn pubmed(base: &str, api_key: Option<&str>) -> PubMed {
        PubMed::new(
            Url::parse(base).unwrap(),
            api_key.map(str::to_string),
            None,
        )
    }

    #[test]
    fn parses_id_list_in_order() {
        let body = r#"{"header":{"type":"esearch","version":"0.3"},
            "esearchresult":{"count":"2","retmax":"2","retstart":"0",
            "idlist":["39000001","38000002"],"translationset":[]}}"#;
        assert_eq!(
            parse_search_response(body).unwrap(),
            vec!["39000001".to_string(), "38000002".to_string()]
        );
    }

    #[test]
    fn missing_fields_mean_no_ids() {
        assert!(parse_search_response("{}").unwrap().is_empty());
        assert!(
            parse_search_response(r#"{"esearchresult":{"ERROR":"Empty term and query_key - nothing todo"}}"#)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn malformed_body_is_an_error() {
        let err = parse_search_response("<html>Service unavailable</html>").unwrap_err();
        assert!(err.to_string().contains("malformed esearch response"));
    }

    #[test]
    fn search_url_carries_all_parameters() {
        let p = pubmed(DEFAULT_BASE_URL, None);
        let url = p
            .endpoint(
                "esearch.fcgi",
                &[("db", "pubmed"), ("term", "cancer & diet"), ("retmax", "5"), ("retmode", "json")],
            )
            .unwrap();
        assert_eq!(url.path(), "/entrez/eutils/esearch.fcgi");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("db".into(), "pubmed".into()),
                ("term".into(), "cancer & diet".into()),
                ("retmax".into(), "5".into()),
                ("retmode".into(), "json".into()),
            ]
        );
    }

    #[test]
    fn api_key_is_appended_when_configured() {
        let p = pubmed(DEFAULT_BASE_URL, Some("secret"));
        let url = p.endpoint("efetch.fcgi", &[("id", "1")]).unwrap();
        assert!(url.query_pairs().any(|(k, v)| k == "api_key" && v == "secret"));
    }

    #[test]
    fn base_without_trailing_slash_keeps_its_path() {
        let p = pubmed("http://localhost:8080/mirror/eutils", None);
        let url = p.endpoint("efetch.fcgi", &[("id", "7")]).unwrap();
        assert_eq!(url.host_str(), Some("localhost"));
        assert_eq!(url.path(), "/mirror/eutils/efetch.fcgi");
    }

    #[test]
    fn server_error_status_fails_search_and_fetch() {
        let p = PubMed::new(
            serve_status("500 Internal Server Error", 2),
            None,
            Some(Duration::from_secs(10)),
        );

        let err = p.search("crispr", 5).unwrap_err();
        assert!(err.to_string().contains("search request failed"), "{err:#}");
        assert!(format!("{err:#}").contains("500"), "{err:#}");

        let err = p.fetch("12345678").unwrap_err();
        assert!(err.to_string().contains("fetch request failed for PubMed ID 12345678"), "{err:#}");
        assert!(format!("{err:#}").contains("500"), "{err:#}");
    }

    #[test]
    fn client_error_status_fails_fetch() {
        let p = PubMed::new(serve_status("400 Bad Request", 1), None, None);
        let err = p.fetch("not-an-id").unwrap_err();
        assert!(err.to_string().contains("fetch request failed"), "{err:#}");
        assert!(format!("{err:#}").contains("400"), "{err:#}");
    }
}
