mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use aioreq_rs::Client;

#[tokio::test]
async fn follows_redirect_and_replays_cookie() {
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_clone = hits.clone();

    let base = support::spawn_server(move |mut reader| {
        let hits = hits_clone.clone();
        async move {
            let req = support::read_request(&mut reader).await;
            let n = hits.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                assert_eq!(req.request_line, "GET /start HTTP/1.1");
                let resp = "HTTP/1.1 302 Found\r\nLocation: /landed\r\nSet-Cookie: session=abc123; Path=/\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
                support::write_response(&mut reader, resp.as_bytes()).await;
            } else {
                assert_eq!(req.request_line, "GET /landed HTTP/1.1");
                assert_eq!(req.header("cookie"), Some("session=abc123"));
                let resp = "HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\n";
                support::write_response(&mut reader, resp.as_bytes()).await;
                support::write_response(&mut reader, b"ok").await;
            }
        }
    })
    .await;

    let client = Client::new();
    let req = client.get(&format!("{base}/start")).build().unwrap();
    let resp = client.send(req).await.unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.body().unwrap().as_ref(), b"ok");
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}
