//! arXiv scholarly index provider.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::sync::Arc;

use crate::config::{HttpConfig, ScholarlyConfig};
use crate::models::{Record, SearchOptions};
use crate::sources::{ProviderCapabilities, SearchProvider, SourceError};
use crate::utils::HttpClient;

/// Largest page the arXiv API serves in a single request
const ARXIV_MAX_RESULTS: usize = 2000;

/// arXiv search provider
///
/// Supports:
/// - Free-text search over all fields
/// - Inclusive submission-date ranges
#[derive(Debug, Clone)]
pub struct ArxivProvider {
    client: Arc<HttpClient>,
    api_url: String,
}

impl ArxivProvider {
    /// Create a provider from configuration
    pub fn new(config: &ScholarlyConfig, http: &HttpConfig) -> Result<Self, SourceError> {
        let client = HttpClient::from_config(http, http.request_timeout_secs)?;
        Ok(Self::with_client(Arc::new(client), &config.api_url))
    }

    /// Create with a custom HTTP client and endpoint (for testing)
    pub fn with_client(client: Arc<HttpClient>, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
        }
    }

    /// Build the `search_query` expression for the arXiv API
    ///
    /// Date bounds become an inclusive `submittedDate` range; an open bound is
    /// filled with the earliest submission date or `today`.
    fn build_search_query(options: &SearchOptions, today: NaiveDate) -> String {
        let terms = options.query.trim();
        let mut query = if terms.is_empty() {
            "all:*".to_string()
        } else {
            format!("all:{}", terms)
        };

        if let Some((start, end)) = options.date_range(today) {
            query.push_str(&format!(
                " AND submittedDate:[{} TO {}]",
                start.format("%Y%m%d0000"),
                end.format("%Y%m%d2359")
            ));
        }

        query
    }

    fn build_url(&self, options: &SearchOptions) -> String {
        let search_query = Self::build_search_query(options, Utc::now().date_naive());
        let max_results = options.max_results.clamp(1, ARXIV_MAX_RESULTS);

        format!(
            "{}?search_query={}&start=0&max_results={}",
            self.api_url,
            urlencoding::encode(&search_query),
            max_results
        )
    }

    /// Parse an arXiv Atom feed into records, preserving entry order
    fn parse_feed(xml: &str) -> Result<Vec<Record>, SourceError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut saw_feed = false;
        let mut records = Vec::new();
        let mut entry: Option<FeedEntry> = None;
        let mut field: Option<TextField> = None;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| malformed(format!("Atom feed: {}", e)))?;

            match event {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"feed" => saw_feed = true,
                    b"entry" => entry = Some(FeedEntry::default()),
                    name => {
                        if let Some(entry) = entry.as_mut() {
                            field = TextField::from_element(name);
                            entry.apply_attributes(&e)?;
                        }
                    }
                },
                Event::Empty(e) => {
                    if let Some(entry) = entry.as_mut() {
                        entry.apply_attributes(&e)?;
                    }
                }
                Event::Text(t) => {
                    if let (Some(entry), Some(field)) = (entry.as_mut(), field) {
                        let text = t
                            .unescape()
                            .map_err(|e| malformed(format!("Atom text: {}", e)))?;
                        entry.push_text(field, &text);
                    }
                }
                Event::CData(c) => {
                    if let (Some(entry), Some(field)) = (entry.as_mut(), field) {
                        entry.push_text(field, &String::from_utf8_lossy(&c.into_inner()));
                    }
                }
                Event::End(e) => {
                    field = None;
                    if e.local_name().as_ref() == b"entry" {
                        if let Some(finished) = entry.take() {
                            records.push(finished.into_record()?);
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !saw_feed {
            return Err(malformed("response is not an Atom feed"));
        }

        Ok(records)
    }
}

fn malformed(message: impl std::fmt::Display) -> SourceError {
    SourceError::MalformedResponse(message.to_string())
}

/// Text-bearing entry children we keep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextField {
    Id,
    Title,
    Summary,
    Published,
}

impl TextField {
    fn from_element(local_name: &[u8]) -> Option<Self> {
        match local_name {
            b"id" => Some(TextField::Id),
            b"title" => Some(TextField::Title),
            b"summary" => Some(TextField::Summary),
            b"published" => Some(TextField::Published),
            _ => None,
        }
    }
}

/// Fields collected from one `<entry>` while streaming through the feed
#[derive(Debug, Default)]
struct FeedEntry {
    id: String,
    title: String,
    summary: String,
    published: String,
    alternate_link: Option<String>,
    primary_category: Option<String>,
    categories: Vec<String>,
}

impl FeedEntry {
    fn push_text(&mut self, field: TextField, text: &str) {
        let target = match field {
            TextField::Id => &mut self.id,
            TextField::Title => &mut self.title,
            TextField::Summary => &mut self.summary,
            TextField::Published => &mut self.published,
        };
        target.push_str(text);
    }

    fn apply_attributes(&mut self, element: &BytesStart<'_>) -> Result<(), SourceError> {
        match element.local_name().as_ref() {
            b"link" => {
                // Atom treats a link without `rel` as the alternate link
                let rel = attribute(element, "rel")?.unwrap_or_else(|| "alternate".to_string());
                if rel == "alternate" && self.alternate_link.is_none() {
                    self.alternate_link = attribute(element, "href")?;
                }
            }
            b"primary_category" => {
                if let Some(term) = attribute(element, "term")?.filter(|t| !t.is_empty()) {
                    self.primary_category = Some(term);
                }
            }
            b"category" => {
                if let Some(term) = attribute(element, "term")?.filter(|t| !t.is_empty()) {
                    self.categories.push(term);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn into_record(self) -> Result<Record, SourceError> {
        let id = self.id.trim().to_string();

        // arXiv reports query errors as a single pseudo-entry
        if id.contains("/api/errors") {
            return Err(malformed(format!(
                "arXiv rejected the query: {}",
                self.summary.trim()
            )));
        }

        let category = self
            .primary_category
            .or_else(|| self.categories.into_iter().next())
            .ok_or_else(|| malformed(format!("entry {} has no category", id)))?;

        let link = self
            .alternate_link
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(id);

        let title = self.title.split_whitespace().collect::<Vec<_>>().join(" ");

        Ok(Record::new(title, link)
            .summary(self.summary.trim())
            .published_date(self.published.trim())
            .category(category))
    }
}

fn attribute(element: &BytesStart<'_>, name: &str) -> Result<Option<String>, SourceError> {
    match element.try_get_attribute(name) {
        Ok(Some(attr)) => attr
            .unescape_value()
            .map(|value| Some(value.into_owned()))
            .map_err(|e| malformed(format!("attribute {}: {}", name, e))),
        Ok(None) => Ok(None),
        Err(e) => Err(malformed(format!("attribute {}: {}", name, e))),
    }
}

#[async_trait]
impl SearchProvider for ArxivProvider {
    fn id(&self) -> &str {
        "arxiv"
    }

    fn name(&self) -> &str {
        "arXiv"
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::SEARCH | ProviderCapabilities::DATE_RANGE
    }

    async fn search(&self, options: &SearchOptions) -> Result<Vec<Record>, SourceError> {
        let url = self.build_url(options);
        tracing::debug!(provider = "arxiv", %url, "sending search request");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/atom+xml")
            .send()
            .await
            .map_err(|e| {
                SourceError::UpstreamUnavailable(format!("Failed to fetch arXiv results: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::UpstreamUnavailable(format!(
                "arXiv API returned status: {}",
                status
            )));
        }

        let body = response.text().await.map_err(|e| {
            SourceError::UpstreamUnavailable(format!("Failed to read arXiv response: {}", e))
        })?;

        let records = Self::parse_feed(&body)?;
        tracing::info!(
            provider = "arxiv",
            query = %options.query,
            results = records.len(),
            "search complete"
        );

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title type="html">ArXiv Query: search_query=all:transformer</title>
  <id>http://arxiv.org/api/cHxbiOdZaP56ODnBPIenZhzg5f8</id>
  <entry>
    <id>http://arxiv.org/abs/1706.03762v7</id>
    <published>2017-06-12T17:57:34Z</published>
    <title>Attention Is All
      You Need</title>
    <summary>  The dominant sequence transduction models are based on complex
recurrent or convolutional neural networks.  </summary>
    <author><name>Ashish Vaswani</name></author>
    <link href="http://arxiv.org/abs/1706.03762v7" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/1706.03762v7" rel="related" type="application/pdf"/>
    <arxiv:primary_category term="cs.CL" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.LG" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.CL" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/1810.04805v2</id>
    <published>2018-10-11T00:50:01Z</published>
    <title>BERT &amp; friends</title>
    <summary>We introduce a new language representation model.</summary>
    <link href="http://arxiv.org/abs/1810.04805v2" rel="alternate" type="text/html"/>
    <category term="cs.CL" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.AI" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
</feed>"#;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_build_search_query_plain() {
        let options = SearchOptions::new("transformer");
        let query = ArxivProvider::build_search_query(&options, date(2024, 1, 1));
        assert_eq!(query, "all:transformer");
    }

    #[test]
    fn test_build_search_query_with_range() {
        let options = SearchOptions::new("graph neural networks")
            .start_date(date(2020, 1, 1))
            .end_date(date(2020, 12, 31));
        let query = ArxivProvider::build_search_query(&options, date(2024, 1, 1));
        assert_eq!(
            query,
            "all:graph neural networks AND submittedDate:[202001010000 TO 202012312359]"
        );
    }

    #[test]
    fn test_build_search_query_open_end() {
        let options = SearchOptions::new("llm").start_date(date(2023, 3, 1));
        let query = ArxivProvider::build_search_query(&options, date(2024, 2, 29));
        assert!(query.ends_with("submittedDate:[202303010000 TO 202402292359]"));
    }

    #[test]
    fn test_build_search_query_empty_terms() {
        let options = SearchOptions::new("   ");
        let query = ArxivProvider::build_search_query(&options, date(2024, 1, 1));
        assert_eq!(query, "all:*");
    }

    #[test]
    fn test_parse_feed_preserves_order_and_fields() {
        let records = ArxivProvider::parse_feed(FEED).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.title, "Attention Is All You Need");
        assert_eq!(first.link, "http://arxiv.org/abs/1706.03762v7");
        assert_eq!(first.published_date, "2017-06-12T17:57:34Z");
        assert!(first.summary.starts_with("The dominant sequence"));
        assert!(first.summary.ends_with("neural networks."));
        // primary category wins over the first tag
        assert_eq!(first.category, "cs.CL");

        let second = &records[1];
        assert_eq!(second.title, "BERT & friends");
        // no primary category: first tag is used
        assert_eq!(second.category, "cs.CL");
    }

    #[test]
    fn test_parse_empty_feed() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>empty</title></feed>"#;
        assert!(ArxivProvider::parse_feed(xml).unwrap().is_empty());
    }

    #[test]
    fn test_parse_feed_link_falls_back_to_id() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
            <entry>
              <id>http://arxiv.org/abs/2301.00001v1</id>
              <title>No links</title>
              <category term="math.CO"/>
            </entry>
        </feed>"#;
        let records = ArxivProvider::parse_feed(xml).unwrap();
        assert_eq!(records[0].link, "http://arxiv.org/abs/2301.00001v1");
        assert_eq!(records[0].category, "math.CO");
    }

    #[test]
    fn test_parse_feed_error_entry() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
            <entry>
              <id>http://arxiv.org/api/errors#incorrect_id_format_for_1234</id>
              <title>Error</title>
              <summary>incorrect id format for 1234</summary>
            </entry>
        </feed>"#;
        let err = ArxivProvider::parse_feed(xml).unwrap_err();
        assert!(matches!(err, SourceError::MalformedResponse(ref m) if m.contains("incorrect id format")));
    }

    #[test]
    fn test_parse_feed_rejects_entry_without_category() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
            <entry><id>http://arxiv.org/abs/1</id><title>t</title></entry>
        </feed>"#;
        assert!(matches!(
            ArxivProvider::parse_feed(xml),
            Err(SourceError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_non_feed_payloads() {
        assert!(ArxivProvider::parse_feed("").is_err());
        assert!(ArxivProvider::parse_feed("{\"json\": true}").is_err());
        assert!(ArxivProvider::parse_feed("<html><body>Bad gateway</body></html>").is_err());
        assert!(ArxivProvider::parse_feed("<feed><entry></feed>").is_err());
    }

    #[tokio::test]
    async fn test_search_against_stub_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/query")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("search_query".into(), "all:transformer".into()),
                Matcher::UrlEncoded("start".into(), "0".into()),
                Matcher::UrlEncoded("max_results".into(), "2".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/atom+xml")
            .with_body(FEED)
            .create_async()
            .await;

        let client = Arc::new(HttpClient::with_timeout("test-agent", 5).unwrap());
        let provider =
            ArxivProvider::with_client(client, format!("{}/api/query", server.url()));

        let records = provider
            .search(&SearchOptions::new("transformer").max_results(2))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Attention Is All You Need");
    }

    #[tokio::test]
    async fn test_search_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/query")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let client = Arc::new(HttpClient::with_timeout("test-agent", 5).unwrap());
        let provider =
            ArxivProvider::with_client(client, format!("{}/api/query", server.url()));

        let err = provider
            .search(&SearchOptions::new("transformer"))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::UpstreamUnavailable(_)));
    }

    #[test]
    fn test_provider_metadata() {
        let client = Arc::new(HttpClient::with_timeout("test-agent", 5).unwrap());
        let provider = ArxivProvider::with_client(client, "http://localhost/api/query");
        assert_eq!(provider.id(), "arxiv");
        assert!(provider.supports_date_range());
    }
}
