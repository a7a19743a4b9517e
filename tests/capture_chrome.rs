//! End-to-end capture through headless Chrome

#![cfg(feature = "cdp")]

use sitebind::capture::ScratchMarkup;
use sitebind::cdp::CdpRenderer;
use sitebind::{bind_markup, capture_preview, BindingRecord, CaptureConfig, Preview, RequestPolicy, Viewport};
use std::sync::{Arc, Mutex, Once};
use tiny_http::{Response, Server};

static INIT: Once = Once::new();

/// Start a test HTTP server that records every requested path
fn start_asset_server(seen: Arc<Mutex<Vec<String>>>) -> u16 {
    INIT.call_once(move || {
        std::thread::spawn(move || {
            let server = Server::http("127.0.0.1:18093").unwrap();
            for request in server.incoming_requests() {
                seen.lock().unwrap().push(request.url().to_string());
                let _ = request.respond(Response::from_string("").with_status_code(204));
            }
        });
        std::thread::sleep(std::time::Duration::from_millis(100));
    });
    18093
}

// Width and height from the IHDR chunk
fn png_size(png: &[u8]) -> (u32, u32) {
    assert_eq!(&png[12..16], b"IHDR");
    let width = u32::from_be_bytes([png[16], png[17], png[18], png[19]]);
    let height = u32::from_be_bytes([png[20], png[21], png[22], png[23]]);
    (width, height)
}

#[tokio::test]
#[ignore] // Requires Chrome to be installed
async fn test_capture_blocks_api_host_and_writes_pngs() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let port = start_asset_server(seen.clone());

    let template = r#"<!DOCTYPE html><html><head><title>Preview</title></head><body>
        <h1 id="name" data-display="true">?</h1>
        <img id="tracker"><img id="logo">
    </body></html>"#;
    let records = vec![
        BindingRecord::new("name", "Ada", None),
        BindingRecord::new("tracker", &format!("http://127.0.0.1:{}/blocked.png", port), None),
        BindingRecord::new("logo", &format!("http://localhost:{}/allowed.png", port), None),
    ];
    let markup = bind_markup(template, "h1 { color: #123456; }", "", &records).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let scratch = ScratchMarkup::write(&markup).unwrap();
    let preview = Preview::in_dir(dir.path());
    let config = CaptureConfig {
        policy: RequestPolicy::blocking(["127.0.0.1"]),
        settle_ms: 300,
        ..Default::default()
    };

    capture_preview::<CdpRenderer>(config, scratch.path(), &preview)
        .await
        .expect("capture failed");

    for (path, viewport) in [(&preview.mobile, Viewport::MOBILE), (&preview.desktop, Viewport::DESKTOP)] {
        let png = std::fs::read(path).unwrap();
        assert!(png.len() > 100, "PNG data seems too small");
        assert_eq!(&png[0..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(png_size(&png), (viewport.width, viewport.height), "{}", path.display());
    }

    let seen = seen.lock().unwrap();
    assert!(!seen.iter().any(|p| p == "/blocked.png"), "blocked host was contacted: {:?}", seen);
    assert!(seen.iter().any(|p| p == "/allowed.png"), "allowed host not contacted: {:?}", seen);
}
