//! HTTP document source against a local mock server

mod common;

use anyhow::Result;
use common::{html_page, init_tracing};
use kodegen_tools_linkpreview::utils::DEFAULT_USER_AGENT;
use kodegen_tools_linkpreview::{
    DocumentSource, FetchError, HttpSource, ScrapeConfig, scrape_with_config,
};
use mockito::Server;
use url::Url;

fn source() -> HttpSource {
    HttpSource::new(&ScrapeConfig::default()).expect("client builds")
}

#[tokio::test]
async fn follows_transport_redirects_and_reports_landing_url() -> Result<()> {
    init_tracing();
    let mut server = Server::new_async().await;
    let redirect = server
        .mock("GET", "/old")
        .with_status(301)
        .with_header("location", "/new")
        .create_async()
        .await;
    let landing = server
        .mock("GET", "/new")
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(html_page("<title>Landed</title>", ""))
        .create_async()
        .await;

    let page = source()
        .fetch(&Url::parse(&format!("{}/old", server.url()))?)
        .await?;

    assert_eq!(page.effective_url.as_str(), format!("{}/new", server.url()));
    assert!(page.body.contains("Landed"));
    redirect.assert_async().await;
    landing.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn transcodes_declared_charset_to_utf8() -> Result<()> {
    init_tracing();
    let mut server = Server::new_async().await;
    let mut body = b"<html><head><title>Caf".to_vec();
    body.push(0xE9);
    body.extend_from_slice(b"</title></head></html>");
    let _mock = server
        .mock("GET", "/latin1")
        .with_header("content-type", "text/html; charset=iso-8859-1")
        .with_body(body)
        .create_async()
        .await;

    let page = source()
        .fetch(&Url::parse(&format!("{}/latin1", server.url()))?)
        .await?;

    assert!(page.body.contains("Café"), "body was {:?}", page.body);
    Ok(())
}

#[tokio::test]
async fn falls_back_to_charset_declared_in_markup() -> Result<()> {
    init_tracing();
    let mut server = Server::new_async().await;
    let mut body = br#"<html><head><meta charset="iso-8859-1"><title>Caf"#.to_vec();
    body.push(0xE9);
    body.extend_from_slice(b"</title></head></html>");
    let _mock = server
        .mock("GET", "/meta")
        .with_header("content-type", "text/html")
        .with_body(body)
        .create_async()
        .await;

    let page = source()
        .fetch(&Url::parse(&format!("{}/meta", server.url()))?)
        .await?;

    assert!(page.body.contains("<title>Café</title>"), "body was {:?}", page.body);
    Ok(())
}

#[tokio::test]
async fn http_equiv_content_type_names_the_charset() -> Result<()> {
    init_tracing();
    let mut server = Server::new_async().await;
    let mut body =
        br#"<html><head><meta http-equiv="Content-Type" content="text/html; charset=gbk"><title>"#
            .to_vec();
    // "中文" in GBK
    body.extend_from_slice(&[0xD6, 0xD0, 0xCE, 0xC4]);
    body.extend_from_slice(b"</title></head></html>");
    let _mock = server
        .mock("GET", "/gbk")
        .with_header("content-type", "text/html")
        .with_body(body)
        .create_async()
        .await;

    let page = source()
        .fetch(&Url::parse(&format!("{}/gbk", server.url()))?)
        .await?;

    assert!(page.body.contains("<title>中文</title>"), "body was {:?}", page.body);
    Ok(())
}

#[tokio::test]
async fn keeps_every_value_of_repeated_headers() -> Result<()> {
    init_tracing();
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/")
        .with_header("content-type", "text/html")
        .with_header("set-cookie", "a=1")
        .with_header("set-cookie", "b=2")
        .with_body("<html></html>")
        .create_async()
        .await;

    let page = source()
        .fetch(&Url::parse(&format!("{}/", server.url()))?)
        .await?;

    let cookies: Vec<_> = page
        .headers
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    assert_eq!(cookies, vec!["a=1", "b=2"]);
    Ok(())
}

#[tokio::test]
async fn error_statuses_still_yield_a_document() -> Result<()> {
    init_tracing();
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/gone")
        .with_status(404)
        .with_header("content-type", "text/html")
        .with_body(html_page("<title>Not Found</title>", ""))
        .create_async()
        .await;

    let page = source()
        .fetch(&Url::parse(&format!("{}/gone", server.url()))?)
        .await?;

    assert!(page.body.contains("Not Found"));
    Ok(())
}

#[tokio::test]
async fn sends_the_configured_user_agent() -> Result<()> {
    init_tracing();
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/")
        .match_header("user-agent", DEFAULT_USER_AGENT)
        .with_body("<html></html>")
        .create_async()
        .await;

    source()
        .fetch(&Url::parse(&format!("{}/", server.url()))?)
        .await?;

    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn unresponsive_hosts_time_out() -> Result<()> {
    init_tracing();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    let config = ScrapeConfig::builder().request_timeout_secs(1).build()?;
    let err = HttpSource::new(&config)?
        .fetch(&Url::parse(&format!("http://{addr}/"))?)
        .await
        .unwrap_err();

    assert!(
        matches!(err, FetchError::Timeout { secs: 1, .. }),
        "unexpected error: {err}"
    );
    Ok(())
}

#[tokio::test]
async fn end_to_end_canonical_scrape() -> Result<()> {
    init_tracing();
    let mut server = Server::new_async().await;
    let base = server.url();
    let first = server
        .mock("GET", "/x")
        .with_header("content-type", "text/html")
        .with_body(html_page(r#"<link rel="canonical" href="/y">"#, ""))
        .create_async()
        .await;
    let second = server
        .mock("GET", "/y")
        .with_header("content-type", "text/html")
        .with_body(html_page(
            r#"<title>Canonical</title><link rel="stylesheet" href="/site.css">"#,
            "",
        ))
        .create_async()
        .await;

    let config = ScrapeConfig::builder().max_hops(2).build()?;
    let document = scrape_with_config(&format!("{base}/x"), &config).await?;

    assert_eq!(document.effective_url.as_str(), format!("{base}/y"));
    assert_eq!(document.preview.link, format!("{base}/y"));
    assert_eq!(document.preview.title, "Canonical");
    assert_eq!(
        document.preview.css_files[0].as_str(),
        Some(format!("{base}/site.css").as_str())
    );
    first.assert_async().await;
    second.assert_async().await;
    Ok(())
}
