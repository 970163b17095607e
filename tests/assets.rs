mod common;

use common::*;
use craftpath::core::assets::AssetManager;
use craftpath::core::downloader::Downloader;
use craftpath::core::layout::GameLayout;
use craftpath::core::sink::MemorySink;
use craftpath::core::version::AssetIndexInfo;

#[tokio::test]
async fn progress_is_reported_every_hundred_objects() {
    let server = FixtureServer::start().await;
    let mut objects = serde_json::Map::new();
    for i in 0..201 {
        let body = format!("object-{i}").into_bytes();
        let hash = sha1_hex(&body);
        server.serve(&format!("/resources/{}/{}", &hash[..2], hash), body);
        objects.insert(
            format!("minecraft/sounds/{i}.ogg"),
            serde_json::json!({"hash": hash, "size": 8}),
        );
    }
    let index = serde_json::to_vec(&serde_json::json!({"objects": objects})).unwrap();
    server.serve("/indexes/big.json", index);

    let temp = tempfile::tempdir().unwrap();
    let layout = GameLayout::new(temp.path());
    let downloader = Downloader::new(reqwest::Client::new()).with_concurrency(4);
    let resources = server.url("/resources");
    let manager = AssetManager::new(&downloader, &layout, &resources);
    let info = AssetIndexInfo {
        id: "big".into(),
        url: server.url("/indexes/big.json"),
        sha1: None,
    };
    let sink = MemorySink::new();

    let summary = manager.download_assets(&info, &sink).await.unwrap();
    assert_eq!(summary.downloaded, 201);

    let progress: Vec<String> = sink
        .lines()
        .into_iter()
        .map(|line| line.message)
        .filter(|message| message.starts_with("Downloaded "))
        .collect();
    assert_eq!(
        progress,
        ["Downloaded 100/201 assets", "Downloaded 200/201 assets"]
    );

    // a second pass finds everything present and reports no progress
    let again = MemorySink::new();
    let summary = manager.download_assets(&info, &again).await.unwrap();
    assert_eq!(summary.already_present, 201);
    assert!(!again.contains("Downloaded "));
}
