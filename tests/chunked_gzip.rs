mod support;

use std::io::Write;

use aioreq_rs::Client;

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

fn chunk_encode(data: &[u8], chunk_size: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for window in data.chunks(chunk_size) {
        out.extend_from_slice(format!("{:x}\r\n", window.len()).as_bytes());
        out.extend_from_slice(window);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"0\r\n\r\n");
    out
}

#[tokio::test]
async fn decodes_chunked_gzip_body() {
    let payload = b"the quick brown fox jumps over the lazy dog, repeated for size";
    let compressed = gzip(payload);
    let chunked = chunk_encode(&compressed, 17);

    let base = support::spawn_server(move |mut reader| {
        let chunked = chunked.clone();
        async move {
            let _req = support::read_request(&mut reader).await;
            let head = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nContent-Encoding: gzip\r\nConnection: close\r\n\r\n";
            support::write_response(&mut reader, head).await;
            support::write_response(&mut reader, &chunked).await;
        }
    })
    .await;

    let client = Client::new();
    let req = client.get(&format!("{base}/data")).build().unwrap();
    let resp = client.send(req).await.unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.body().unwrap().as_ref(), payload.as_ref());
    assert!(resp.headers().get("content-encoding").is_none());
}
