//! Chrome-backed capture tests
//!
//! Run with: `cargo test --test cdp_capture -- --ignored`
#![cfg(feature = "cdp")]

use ogshot::routes::CollectSink;
use ogshot::{GeneratorConfig, SelectionRule};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Once;
use tiny_http::{Response, Server};

static INIT: Once = Once::new();
static ASSET_HITS: AtomicUsize = AtomicUsize::new(0);

/// Serve a small stylesheet so the template has a network request to settle.
fn start_asset_server() -> String {
    INIT.call_once(|| {
        std::thread::spawn(|| {
            let server = Server::http("127.0.0.1:18090").unwrap();
            for request in server.incoming_requests() {
                let response = match request.url() {
                    "/style.css" => {
                        ASSET_HITS.fetch_add(1, Ordering::SeqCst);
                        // Delay so the screenshot has to wait for it
                        std::thread::sleep(std::time::Duration::from_millis(300));
                        Response::from_string("h1 { color: rgb(200, 30, 30); font-size: 64px; }").with_header(
                            "Content-Type: text/css".parse::<tiny_http::Header>().unwrap(),
                        )
                    }
                    _ => Response::from_string("Not Found").with_status_code(404),
                };
                let _ = request.respond(response);
            }
        });
        // Give the server time to start
        std::thread::sleep(std::time::Duration::from_millis(100));
    });

    "http://127.0.0.1:18090".to_string()
}

/// Width and height from the PNG IHDR chunk
fn png_size(png: &[u8]) -> (u32, u32) {
    let width = u32::from_be_bytes([png[16], png[17], png[18], png[19]]);
    let height = u32::from_be_bytes([png[20], png[21], png[22], png[23]]);
    (width, height)
}

#[test]
#[ignore] // Requires Chrome to be installed
fn captures_open_graph_images_with_chrome() {
    let base_url = start_asset_server();

    let dir = tempfile::tempdir().unwrap();
    let dist = dir.path().join("dist");
    for (slug, title) in [("post-1", "First Post"), ("post-2", "Second Post")] {
        let page = dist.join("blog").join(slug);
        std::fs::create_dir_all(&page).unwrap();
        std::fs::write(
            page.join("index.html"),
            format!("<html><head><title>{}</title></head><body></body></html>", title),
        )
        .unwrap();
    }

    let template = dir.path().join("og-image.html");
    std::fs::write(
        &template,
        format!(
            r#"<html><head><link rel="stylesheet" href="{}/style.css"></head><body><h1>@title</h1></body></html>"#,
            base_url
        ),
    )
    .unwrap();

    let config = GeneratorConfig {
        path: "og".to_string(),
        patterns: vec![SelectionRule::new("^/blog/")],
        template,
        ..Default::default()
    };
    let mut sink = CollectSink::default();
    let report = ogshot::run(&config, &dist, &[], &mut sink).expect("generation failed");

    assert_eq!(report.generated.len(), 2);
    for image in &report.generated {
        let png = std::fs::read(image).unwrap();
        assert_eq!(&png[0..8], b"\x89PNG\r\n\x1a\n");
        let (width, height) = png_size(&png);
        assert_eq!((width, height), (1200, 630), "unexpected size {}x{}", width, height);
    }
    assert!(ASSET_HITS.load(Ordering::SeqCst) >= 2);
    assert!(sink.routes.is_empty());
}
