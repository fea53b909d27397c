//! Integration tests for the ECC client and article source using wiremock.

use pds_core::{Mapper, PageSource, SourceError};
use pds_sources::{
    ArticleLookup, EccArticleMapper, EccArticleSource, EccClient, HttpSettings, SourceClientError,
};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(max_retries: u32) -> HttpSettings {
    HttpSettings {
        request_timeout_secs: 5,
        user_agent: "pds-test".to_string(),
        max_retries,
        retry_backoff_base_ms: 0,
    }
}

fn test_client(base_url: &str, max_retries: u32) -> EccClient {
    EccClient::new(&settings(max_retries), base_url, "ecc-token", "de")
        .expect("client construction should not fail")
}

fn lookup(supplier_gln: &str, ean: &str) -> ArticleLookup {
    ArticleLookup {
        supplier_gln: supplier_gln.to_string(),
        ean: ean.to_string(),
    }
}

fn article_path(ean: &str, supplier_gln: &str) -> String {
    format!("/articleData/byEanAndSuGln/{ean}/{supplier_gln}/de")
}

async fn mount_article(server: &MockServer, ean: &str, supplier_gln: &str, ecc_id: i64) {
    Mock::given(method("GET"))
        .and(path(article_path(ean, supplier_gln)))
        .and(query_param("token", "ecc-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "articles": [{"eccId": ecc_id, "articleName": format!("Article {ecc_id}")}]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn fetch_articles_returns_raw_articles() {
    let server = MockServer::start().await;
    mount_article(&server, "4061234567890", "4042834000005", 1001).await;

    let client = test_client(&server.uri(), 0);
    let articles = client
        .fetch_articles("4061234567890", "4042834000005")
        .await
        .expect("should fetch articles");

    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0]["eccId"], 1001);
}

#[tokio::test]
async fn fetch_articles_treats_404_as_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0);
    let articles = client
        .fetch_articles("1", "2")
        .await
        .expect("404 is not an error");
    assert!(articles.is_empty());
}

#[tokio::test]
async fn fetch_articles_treats_empty_list_as_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"articles": []})))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0);
    assert!(client.fetch_articles("1", "2").await.unwrap().is_empty());
}

#[tokio::test]
async fn fetch_articles_retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 2);
    let err = client.fetch_articles("1", "2").await.unwrap_err();
    assert!(matches!(
        err,
        SourceClientError::UnexpectedStatus { status: 503, .. }
    ));
    assert!(
        !err.to_string().contains("ecc-token"),
        "token leaked into error: {err}"
    );
}

#[tokio::test]
async fn fetch_articles_rejects_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0);
    let err = client.fetch_articles("1", "2").await.unwrap_err();
    assert!(matches!(err, SourceClientError::Deserialize { .. }));
}

#[tokio::test]
async fn article_source_pages_through_lookups_in_batches() {
    let server = MockServer::start().await;
    mount_article(&server, "111", "900", 1).await;
    mount_article(&server, "222", "900", 2).await;
    mount_article(&server, "333", "901", 3).await;

    let mut source = EccArticleSource::new(
        test_client(&server.uri(), 0),
        vec![lookup("900", "111"), lookup("900", "222"), lookup("901", "333")],
        2,
        0,
    );

    let first = source.fetch_page(None).await.expect("first page");
    assert_eq!(first.records.len(), 2);
    assert_eq!(first.next, Some(2));

    let second = source.fetch_page(first.next).await.expect("second page");
    assert_eq!(second.records.len(), 1);
    assert_eq!(second.next, None);
    assert_eq!(second.records[0].supplier_gln, "901");

    let mapper = EccArticleMapper::default();
    let article = mapper.to_dto(second.records[0].clone()).expect("maps");
    assert_eq!(article.article_key, "3");
    assert_eq!(article.ean.as_deref(), Some("333"));
}

#[tokio::test]
async fn article_source_with_no_lookups_is_immediately_exhausted() {
    let server = MockServer::start().await;
    let mut source = EccArticleSource::new(test_client(&server.uri(), 0), Vec::new(), 10, 0);
    let page = source.fetch_page(None).await.expect("empty page");
    assert!(page.records.is_empty());
    assert_eq!(page.next, None);
}

#[tokio::test]
async fn article_source_splits_page_at_invalid_response() {
    let server = MockServer::start().await;
    mount_article(&server, "111", "900", 1).await;
    Mock::given(method("GET"))
        .and(path(article_path("222", "900")))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    mount_article(&server, "333", "900", 3).await;

    let mut source = EccArticleSource::new(
        test_client(&server.uri(), 0),
        vec![lookup("900", "111"), lookup("900", "222"), lookup("900", "333")],
        3,
        0,
    );

    let first = source.fetch_page(None).await.expect("partial page");
    assert_eq!(first.records.len(), 1);
    assert_eq!(first.next, Some(1));

    let failure = source
        .fetch_page(first.next)
        .await
        .expect_err("401 should fail the page");
    assert!(matches!(failure.error, SourceError::ResponseInvalid(_)));
    assert_eq!(failure.resume_from, Some(2));

    let last = source
        .fetch_page(failure.resume_from)
        .await
        .expect("resumed");
    assert_eq!(last.records.len(), 1);
    assert_eq!(last.next, None);
}

#[tokio::test]
async fn article_source_unavailable_has_no_resume_point() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut source = EccArticleSource::new(
        test_client(&server.uri(), 0),
        vec![lookup("900", "111")],
        10,
        0,
    );

    let failure = source.fetch_page(None).await.expect_err("should fail");
    assert!(matches!(failure.error, SourceError::Unavailable(_)));
    assert_eq!(failure.resume_from, None);
}
