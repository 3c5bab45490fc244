//! Integration tests for the crawl traversal
//!
//! These tests use wiremock to serve small sites and run complete
//! traversals against them.

use audiobreak_scraper::config::FetchConfig;
use audiobreak_scraper::crawler::{build_http_client, traverse, CrawlRequest, MediaKind, PaginationMode};
use reqwest::Client;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> Client {
    build_http_client(&FetchConfig::default()).expect("Failed to build client")
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_single_page_without_pagination() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "<html><body><p>a</p><p>b keyword</p><p>c</p></body></html>".to_string(),
    )
    .await;

    let origin = format!("{}/", server.uri());
    let request = CrawlRequest {
        url: origin.clone(),
        ..Default::default()
    };
    let report = traverse(&client(), &request).await.unwrap();

    assert_eq!(report.scraped_pages, vec![origin]);
    assert_eq!(report.results, vec!["a", "b keyword", "c"]);
    assert!(report.errors.is_empty());
}

#[tokio::test]
async fn test_keyword_filters_results() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "<html><body><p>a</p><p>b keyword</p><p>c</p></body></html>".to_string(),
    )
    .await;

    let request = CrawlRequest {
        url: format!("{}/", server.uri()),
        keyword: Some("keyword".to_string()),
        ..Default::default()
    };
    let report = traverse(&client(), &request).await.unwrap();

    assert_eq!(report.results, vec!["b keyword"]);
}

#[tokio::test]
async fn test_media_urls_are_absolute_without_query() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><body><img src="x.png?v=2"><audio src="/a.mp3?t=1"></audio></body></html>"#
            .to_string(),
    )
    .await;

    let request = CrawlRequest {
        url: format!("{}/", server.uri()),
        media_types: Some(vec![MediaKind::Img]),
        ..Default::default()
    };
    let report = traverse(&client(), &request).await.unwrap();

    assert_eq!(report.media_assets.len(), 1);
    assert_eq!(report.media_assets[0].url, format!("{}/x.png", server.uri()));
    assert_eq!(report.media_assets[0].kind, MediaKind::Img);
}

#[tokio::test]
async fn test_next_link_pagination_visits_each_page_once() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(
        &server,
        "/p1",
        r#"<html><body><p>one</p><a class="next" href="/p2">Next</a></body></html>"#.to_string(),
    )
    .await;
    mount_page(
        &server,
        "/p2",
        r#"<html><body><p>two</p><a class="next" href="/p3">Next</a></body></html>"#.to_string(),
    )
    .await;
    mount_page(
        &server,
        "/p3",
        r#"<html><body><p>three</p><a class="next" href="/p1">Back to start</a></body></html>"#
            .to_string(),
    )
    .await;

    let request = CrawlRequest {
        url: format!("{}/p1", base),
        follow_pagination: Some(true),
        pagination_selector: Some("a.next".to_string()),
        pagination_type: Some(PaginationMode::SingleNextLink),
        ..Default::default()
    };
    let report = traverse(&client(), &request).await.unwrap();

    assert_eq!(
        report.scraped_pages,
        vec![
            format!("{}/p1", base),
            format!("{}/p2", base),
            format!("{}/p3", base)
        ]
    );
    assert_eq!(report.results, vec!["one", "two", "three"]);
    assert!(report.errors.is_empty());
}

#[tokio::test]
async fn test_list_pagination_collects_listing() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(
        &server,
        "/",
        r#"<html><body><p>index</p>
        <nav><a class="page" href="/page/2">2</a><a class="page" href="/page/3">3</a></nav>
        </body></html>"#
            .to_string(),
    )
    .await;
    for n in [2, 3] {
        mount_page(
            &server,
            &format!("/page/{}", n),
            format!(
                r#"<html><body><p>page {n}</p>
                <nav><a class="page" href="/page/2">2</a><a class="page" href="/page/3">3</a></nav>
                </body></html>"#
            ),
        )
        .await;
    }

    let origin = format!("{}/", base);
    let request = CrawlRequest {
        url: origin.clone(),
        follow_pagination: Some(true),
        pagination_selector: Some("a.page".to_string()),
        pagination_type: Some(PaginationMode::ExplicitList),
        ..Default::default()
    };
    let report = traverse(&client(), &request).await.unwrap();

    assert_eq!(
        report.scraped_pages,
        vec![
            origin.clone(),
            format!("{}/page/2", base),
            format!("{}/page/3", base)
        ]
    );
    assert_eq!(
        report.list_pagination_urls,
        vec![format!("{}/page/2", base), format!("{}/page/3", base), origin]
    );
}

#[tokio::test]
async fn test_explicit_links_are_the_whole_frontier() {
    let server = MockServer::start().await;
    let base = server.uri();
    for n in [1, 2] {
        mount_page(
            &server,
            &format!("/item/{}", n),
            format!(
                r#"<html><body><p>item {n}</p><a class="next" href="/item/99">More</a></body></html>"#
            ),
        )
        .await;
    }

    let first = format!("{}/item/1", base);
    let second = format!("{}/item/2", base);
    let request = CrawlRequest {
        url: format!("{}/unused", base),
        follow_pagination: Some(true),
        pagination_selector: Some("a.next".to_string()),
        pagination_links: Some(vec![first.clone(), second.clone(), first.clone()]),
        ..Default::default()
    };
    let report = traverse(&client(), &request).await.unwrap();

    assert_eq!(report.scraped_pages, vec![first, second]);
    assert_eq!(report.results, vec!["item 1", "item 2"]);
    // The listing is still harvested from the origin, which does not exist
    assert_eq!(
        report.errors,
        vec!["Error fetching or parsing initial page for pagination selector: HTTP status 404"]
    );
    assert!(report.list_pagination_urls.is_empty());
}

#[tokio::test]
async fn test_failed_pages_are_recorded_not_fatal() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(
        &server,
        "/start",
        r#"<html><body><p>start</p><a class="next" href="/broken">Next</a></body></html>"#
            .to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let request = CrawlRequest {
        url: format!("{}/start", base),
        follow_pagination: Some(true),
        pagination_selector: Some("a.next".to_string()),
        ..Default::default()
    };
    let report = traverse(&client(), &request).await.unwrap();

    assert_eq!(report.results, vec!["start"]);
    assert_eq!(report.scraped_pages.len(), 2);
    assert_eq!(
        report.errors,
        vec![format!("{}/broken: HTTP status 500", base)]
    );
}

#[tokio::test]
async fn test_origin_without_trailing_slash_is_visited_once() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(
        &server,
        "/",
        format!(r#"<html><body><p>home</p><a class="next" href="{base}">Home</a></body></html>"#),
    )
    .await;

    let request = CrawlRequest {
        url: base.clone(),
        follow_pagination: Some(true),
        pagination_selector: Some("a.next".to_string()),
        pagination_type: Some(PaginationMode::SingleNextLink),
        ..Default::default()
    };
    let report = traverse(&client(), &request).await.unwrap();

    assert_eq!(report.scraped_pages, vec![format!("{}/", base)]);
    assert_eq!(report.results, vec!["home"]);
    assert!(report.errors.is_empty());
}

#[tokio::test]
async fn test_listing_does_not_repeat_unnormalized_origin() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(
        &server,
        "/",
        r#"<html><body><p>index</p><a class="page" href="/">1</a></body></html>"#.to_string(),
    )
    .await;

    let request = CrawlRequest {
        url: base.clone(),
        follow_pagination: Some(true),
        pagination_selector: Some("a.page".to_string()),
        pagination_type: Some(PaginationMode::ExplicitList),
        ..Default::default()
    };
    let report = traverse(&client(), &request).await.unwrap();

    assert_eq!(report.scraped_pages, vec![format!("{}/", base)]);
    assert_eq!(report.list_pagination_urls, vec![format!("{}/", base)]);
}

#[tokio::test]
async fn test_unmatched_pagination_selector_is_reported() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "<html><body><p>only page</p></body></html>".to_string(),
    )
    .await;

    let origin = format!("{}/", server.uri());
    let request = CrawlRequest {
        url: origin.clone(),
        follow_pagination: Some(true),
        pagination_selector: Some("a.next".to_string()),
        ..Default::default()
    };
    let report = traverse(&client(), &request).await.unwrap();

    assert_eq!(report.scraped_pages, vec![origin]);
    assert_eq!(report.results, vec!["only page"]);
    assert_eq!(
        report.errors,
        vec!["No elements found matching pagination selector: a.next"]
    );
    assert!(report.list_pagination_urls.is_empty());
}

#[tokio::test]
async fn test_failed_origin_reports_listing_and_page_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let origin = format!("{}/", server.uri());
    let request = CrawlRequest {
        url: origin.clone(),
        follow_pagination: Some(true),
        pagination_selector: Some("a.next".to_string()),
        ..Default::default()
    };
    let report = traverse(&client(), &request).await.unwrap();

    assert_eq!(report.scraped_pages, vec![origin.clone()]);
    assert!(report.results.is_empty());
    assert_eq!(
        report.errors,
        vec![
            "Error fetching or parsing initial page for pagination selector: HTTP status 500"
                .to_string(),
            format!("{}: HTTP status 500", origin),
        ]
    );
}

#[tokio::test]
async fn test_listing_is_harvested_without_following() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(
        &server,
        "/",
        r#"<html><body><p>index</p>
        <a class="page" href="/page/2">2</a><a class="page" href="/page/3">3</a>
        </body></html>"#
            .to_string(),
    )
    .await;

    let origin = format!("{}/", base);
    let request = CrawlRequest {
        url: origin.clone(),
        follow_pagination: Some(false),
        pagination_selector: Some("a.page".to_string()),
        pagination_type: Some(PaginationMode::ExplicitList),
        ..Default::default()
    };
    let report = traverse(&client(), &request).await.unwrap();

    assert_eq!(report.scraped_pages, vec![origin]);
    assert_eq!(report.results, vec!["index"]);
    assert_eq!(
        report.list_pagination_urls,
        vec![format!("{}/page/2", base), format!("{}/page/3", base)]
    );
    assert!(report.errors.is_empty());
}
