//! Integration tests for Research Librarian
//!
//! These tests drive the public tool-calling surface end to end against
//! local stub servers: search, download into a temporary store, extract.

use std::sync::Arc;

use research_librarian::config::Config;
use research_librarian::documents::{text_to_pdf, DocumentStore, Downloader, TextExtractor};
use research_librarian::sources::mock::make_record;
use research_librarian::sources::MockProvider;
use research_librarian::tools::{Directive, DirectivePlan, ToolCall, ToolDispatcher, ToolOutcome};
use research_librarian::utils::sanitize_filename;
use research_librarian::ErrorKind;
use serde_json::json;
use tempfile::TempDir;

const FEED_TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title type="html">ArXiv Query: search_query=all:transformer</title>
  <entry>
    <id>{server}/abs/1234</id>
    <published>2017-06-12T17:57:34Z</published>
    <title>Attn</title>
    <summary>Attention based sequence transduction.</summary>
    <link href="{server}/abs/1234" rel="alternate" type="text/html"/>
    <arxiv:primary_category term="cs.CL" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.CL" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
</feed>"#;

/// Configuration pointing every endpoint at the stub server and the store
/// at a fresh temporary directory
fn stub_config(server: &mockito::Server, store: &TempDir) -> Config {
    let mut config = Config::default();
    config.store.root = store.path().to_path_buf();
    config.scholarly.api_url = format!("{}/api/query", server.url());
    config.encyclopedia.api_url = format!("{}/w/api.php", server.url());
    config.downloads.direct_hosts = vec!["127.0.0.1".to_string()];
    config.http.request_timeout_secs = 5;
    config.downloads.timeout_secs = 5;
    config
}

fn mock_dispatcher(
    scholarly: Arc<MockProvider>,
    encyclopedia: Arc<MockProvider>,
    store: &TempDir,
) -> ToolDispatcher {
    let mut config = Config::default();
    config.store.root = store.path().to_path_buf();

    let downloader = Downloader::new(&config).unwrap();
    let extractor = TextExtractor::new(DocumentStore::new(store.path()));
    ToolDispatcher::with_components(
        scholarly,
        encyclopedia,
        Arc::new(downloader),
        Arc::new(extractor),
        &config,
    )
}

#[tokio::test]
async fn test_search_download_extract_flow() {
    let mut server = mockito::Server::new_async().await;
    let store = TempDir::new().unwrap();
    let config = stub_config(&server, &store);

    let feed = FEED_TEMPLATE.replace("{server}", &server.url());
    let search_mock = server
        .mock("GET", "/api/query")
        .match_query(mockito::Matcher::UrlEncoded(
            "search_query".into(),
            "all:transformer".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/atom+xml")
        .with_body(feed)
        .create_async()
        .await;

    let pdf = text_to_pdf("Attn", "Transformers replace recurrence with attention.").unwrap();
    let pdf_mock = server
        .mock("GET", "/abs/1234")
        .with_status(200)
        .with_header("content-type", "application/pdf")
        .with_body(pdf.clone())
        .create_async()
        .await;

    let dispatcher = ToolDispatcher::new(&config).unwrap();

    let search = dispatcher
        .invoke(
            "search_scholarly",
            &json!({ "query": "transformer", "max_results": 1 }),
        )
        .await
        .unwrap();
    let records = search.data.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["title"], "Attn");
    assert_eq!(records[0]["category"], "cs.CL");
    let link = records[0]["link"].as_str().unwrap().to_string();
    assert_eq!(link, format!("{}/abs/1234", server.url()));
    search_mock.assert_async().await;

    let download = dispatcher
        .invoke(
            "download_document",
            &json!({ "url": link, "filename": "Attn" }),
        )
        .await
        .unwrap();
    assert_eq!(download.data["sanitizedName"], "attn.pdf");
    assert_eq!(download.data["bytes"], pdf.len() as u64);
    assert_eq!(download.data["strategy"], "direct");
    assert!(store.path().join("attn.pdf").is_file());
    pdf_mock.assert_async().await;

    let extracted = dispatcher
        .invoke("extract_text", &json!({ "filename": "Attn" }))
        .await
        .unwrap();
    let text = extracted.data["text"].as_str().unwrap();
    assert!(text.contains("Transformers"), "extracted: {:?}", text);
}

#[tokio::test]
async fn test_encyclopedia_search_through_dispatcher() {
    let mut server = mockito::Server::new_async().await;
    let store = TempDir::new().unwrap();
    let config = stub_config(&server, &store);

    let body = json!({
        "batchcomplete": "",
        "query": {
            "search": [
                { "title": "Alan Turing", "pageid": 1208, "snippet": "<span class=\"searchmatch\">Alan</span> Mathison Turing" },
                { "title": "Turing machine", "pageid": 30403, "snippet": "A <b>Turing</b> machine" }
            ]
        }
    });
    let mock = server
        .mock("GET", "/w/api.php")
        .match_query(mockito::Matcher::UrlEncoded(
            "srsearch".into(),
            "Alan Turing".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await;

    let dispatcher = ToolDispatcher::new(&config).unwrap();
    let call = ToolCall::new(
        "search_encyclopedia",
        json!({ "query": "Alan Turing", "max_results": 1 }),
    )
    .with_id("call_7");

    match dispatcher.invoke_outcome(&call).await {
        ToolOutcome::Ok { id, data, directive, .. } => {
            assert_eq!(id.as_deref(), Some("call_7"));
            assert_eq!(directive, "/searchResults");
            let records = data.as_array().unwrap();
            assert_eq!(records.len(), 1);
            assert_eq!(records[0]["title"], "Alan Turing");
            assert_eq!(records[0]["link"], "https://en.wikipedia.org/?curid=1208");
            assert_eq!(records[0]["summary"], "Alan Mathison Turing");
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_upstream_failure_becomes_error_outcome() {
    let mut server = mockito::Server::new_async().await;
    let store = TempDir::new().unwrap();
    let config = stub_config(&server, &store);

    let _mock = server
        .mock("GET", "/api/query")
        .match_query(mockito::Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let dispatcher = ToolDispatcher::new(&config).unwrap();
    let outcome = dispatcher
        .invoke_outcome(&ToolCall::new("search_scholarly", json!({ "query": "x" })))
        .await;

    match outcome {
        ToolOutcome::Error { kind, tool, .. } => {
            assert_eq!(kind, ErrorKind::UpstreamUnavailable);
            assert_eq!(tool, "search_scholarly");
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn test_rendered_page_download() {
    let mut server = mockito::Server::new_async().await;
    let store = TempDir::new().unwrap();
    let mut config = stub_config(&server, &store);
    config.downloads.direct_hosts = vec!["arxiv.org".to_string()];

    let _page = server
        .mock("GET", "/wiki/Alan_Turing")
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(
            "<html><body><h1>Alan Turing</h1>\
             <p>Turing was an English mathematician and computer scientist.</p></body></html>",
        )
        .create_async()
        .await;

    let dispatcher = ToolDispatcher::new(&config).unwrap();
    let url = format!("{}/wiki/Alan_Turing", server.url());

    let stored = dispatcher
        .invoke(
            "download_document",
            &json!({ "url": url, "filename": "Alan Turing" }),
        )
        .await
        .unwrap();
    assert_eq!(stored.data["sanitizedName"], "alan_turing.pdf");
    assert_eq!(stored.data["strategy"], "rendered");

    let bytes = std::fs::read(store.path().join("alan_turing.pdf")).unwrap();
    assert!(bytes.starts_with(b"%PDF"));

    let extracted = dispatcher
        .invoke("extract_text", &json!({ "filename": "alan_turing" }))
        .await
        .unwrap();
    assert!(extracted.data["text"]
        .as_str()
        .unwrap()
        .contains("mathematician"));
}

#[tokio::test]
async fn test_invalid_calls_never_reach_providers() {
    let store = TempDir::new().unwrap();
    let scholarly = Arc::new(MockProvider::new("arxiv"));
    let encyclopedia = Arc::new(MockProvider::new("wikipedia"));
    let dispatcher = mock_dispatcher(scholarly.clone(), encyclopedia.clone(), &store);

    let err = dispatcher
        .invoke("query_arxiv", &json!({ "query": "x" }))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArguments);

    let err = dispatcher
        .invoke("search_scholarly", &json!({}))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArguments);

    let err = dispatcher
        .invoke("search_encyclopedia", &json!({ "query": "x", "max_results": 0 }))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArguments);

    let err = dispatcher
        .invoke(
            "search_scholarly",
            &json!({ "query": "x", "start_date": "2024-02-01", "end_date": "2024-01-01" }),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArguments);

    assert_eq!(scholarly.call_count(), 0);
    assert_eq!(encyclopedia.call_count(), 0);
}

#[tokio::test]
async fn test_mock_search_passes_dates_through() {
    let store = TempDir::new().unwrap();
    let scholarly = Arc::new(
        MockProvider::new("arxiv").with_records(vec![make_record("Paper A", "cs.LG")]),
    );
    let encyclopedia = Arc::new(MockProvider::new("wikipedia"));
    let dispatcher = mock_dispatcher(scholarly.clone(), encyclopedia, &store);

    let output = dispatcher
        .invoke(
            "search_scholarly",
            &json!({ "query": " graph networks ", "start_date": "2020-01-01" }),
        )
        .await
        .unwrap();
    assert_eq!(output.data[0]["title"], "Paper A");
    assert_eq!(output.data[0]["publishedDate"], "2024-01-01T00:00:00Z");

    let options = scholarly.last_options().unwrap();
    assert_eq!(options.query, "graph networks");
    assert_eq!(options.start_date.unwrap().to_string(), "2020-01-01");
    assert!(options.end_date.is_none());
}

#[tokio::test]
async fn test_extract_missing_document() {
    let store = TempDir::new().unwrap();
    let dispatcher = mock_dispatcher(
        Arc::new(MockProvider::new("arxiv")),
        Arc::new(MockProvider::new("wikipedia")),
        &store,
    );

    let outcome = dispatcher
        .invoke_outcome(&ToolCall::new(
            "extract_text",
            json!({ "filename": "Never Downloaded" }),
        ))
        .await;
    match outcome {
        ToolOutcome::Error { kind, message, .. } => {
            assert_eq!(kind, ErrorKind::NotFound);
            assert!(message.contains("never_downloaded.pdf"), "{}", message);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[test]
fn test_definitions_cover_every_tool() {
    let store = TempDir::new().unwrap();
    let dispatcher = mock_dispatcher(
        Arc::new(MockProvider::new("arxiv")),
        Arc::new(MockProvider::new("wikipedia")),
        &store,
    );

    let definitions = dispatcher.definitions();
    let names: Vec<&str> = definitions
        .iter()
        .map(|d| d["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "search_scholarly",
            "search_encyclopedia",
            "download_document",
            "extract_text"
        ]
    );

    for definition in &definitions {
        assert_eq!(definition["parameters"]["type"], "object");
        assert!(!definition["description"].as_str().unwrap().is_empty());
    }
    assert_eq!(
        definitions[2]["parameters"]["required"],
        json!(["url", "filename"])
    );
}

#[test]
fn test_filename_sanitization() {
    assert_eq!(
        sanitize_filename("Attention Is All You Need"),
        "attention_is_all_you_need.pdf"
    );
}

#[test]
fn test_directive_plans_into_dispatchable_call() {
    let directive = Directive::parse("/read Attention Is All You Need").unwrap();
    match directive.plan() {
        DirectivePlan::Tool(call, Some(_)) => {
            assert_eq!(call.name, "extract_text");
            assert_eq!(call.arguments["filename"], "Attention Is All You Need");
        }
        other => panic!("unexpected plan {:?}", other),
    }
}
