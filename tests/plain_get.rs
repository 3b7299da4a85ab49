mod support;

use aioreq_rs::Client;

#[tokio::test]
async fn plain_get_round_trip() {
    let base = support::spawn_server(|mut reader| async move {
        let req = support::read_request(&mut reader).await;
        assert_eq!(req.request_line, "GET /hello HTTP/1.1");
        let body = b"hello world";
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        support::write_response(&mut reader, response.as_bytes()).await;
        support::write_response(&mut reader, body).await;
    })
    .await;

    let client = Client::new();
    let req = client.get(&format!("{base}/hello")).build().unwrap();
    let resp = client.send(req).await.unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.body().unwrap().as_ref(), b"hello world");
}

#[tokio::test]
async fn head_request_has_no_body() {
    let base = support::spawn_server(|mut reader| async move {
        let req = support::read_request(&mut reader).await;
        assert!(req.request_line.starts_with("HEAD"));
        support::write_response(
            &mut reader,
            b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\n",
        )
        .await;
    })
    .await;

    let client = Client::new();
    let req = client.head(&format!("{base}/x")).build().unwrap();
    let resp = client.send(req).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.body().unwrap().len(), 0);
}
