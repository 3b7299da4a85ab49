mod support;

use aioreq_rs::Client;
use futures_util::StreamExt;

#[tokio::test]
async fn streams_a_large_body_in_chunks_without_materializing() {
    let payload = vec![b'x'; 256 * 1024];
    let payload_clone = payload.clone();

    let base = support::spawn_server(move |mut reader| {
        let payload = payload_clone.clone();
        async move {
            let _req = support::read_request(&mut reader).await;
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                payload.len()
            );
            support::write_response(&mut reader, head.as_bytes()).await;
            support::write_response(&mut reader, &payload).await;
        }
    })
    .await;

    let client = Client::new();
    let req = client.get(&format!("{base}/big")).build().unwrap();
    let resp = client.stream(req).await.unwrap();

    let streaming = resp.into_streaming().expect("expected a streaming response");
    let mut body = streaming.body;
    let mut total = 0usize;
    while let Some(chunk) = body.next().await {
        total += chunk.unwrap().len();
    }
    assert_eq!(total, payload.len());
}
