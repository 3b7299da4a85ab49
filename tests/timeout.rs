mod support;

use std::time::Duration;

use aioreq_rs::Client;

#[tokio::test]
async fn per_request_timeout_fires_when_server_hangs() {
    let base = support::spawn_server(|mut reader| async move {
        let _req = support::read_request(&mut reader).await;
        // Never respond; hold the connection open past the client's budget.
        tokio::time::sleep(Duration::from_secs(5)).await;
        let _ = &mut reader;
    })
    .await;

    let client = Client::new();
    let req = client
        .get(&format!("{base}/slow"))
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();

    let err = client.send(req).await.unwrap_err();
    assert!(matches!(err, aioreq_rs::Error::Timeout));
}
