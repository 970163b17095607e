//! Local HTTP fixture server for integration tests.
//!
//! Serves registered byte bodies under arbitrary paths on `127.0.0.1:0`,
//! honors `If-None-Match` for bodies registered with an ETag, and counts
//! requests per path so tests can assert that nothing was refetched.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use sha1::{Digest, Sha1};
use tokio::sync::oneshot;

#[derive(Clone)]
struct Fixture {
    body: Vec<u8>,
    etag: Option<String>,
}

#[derive(Default)]
struct ServerState {
    files: Mutex<HashMap<String, Fixture>>,
    hits: Mutex<HashMap<String, usize>>,
}

pub struct FixtureServer {
    base_url: String,
    state: Arc<ServerState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    _task: tokio::task::JoinHandle<()>,
}

impl FixtureServer {
    pub async fn start() -> Self {
        let state = Arc::new(ServerState::default());

        let app = Router::new()
            .route("/*path", get(serve_file))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fixture listener");
        let addr: SocketAddr = listener.local_addr().expect("fixture addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = server.await;
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            shutdown_tx: Some(shutdown_tx),
            _task: task,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for `path` (leading slash optional).
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn serve(&self, path: &str, body: impl Into<Vec<u8>>) {
        self.insert(path, body.into(), None);
    }

    pub fn serve_with_etag(&self, path: &str, body: impl Into<Vec<u8>>, etag: &str) {
        self.insert(path, body.into(), Some(etag.to_string()));
    }

    /// Requests received for `path`.
    pub fn hits(&self, path: &str) -> usize {
        let key = normalize(path);
        self.state
            .hits
            .lock()
            .unwrap()
            .get(&key)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.state.hits.lock().unwrap().values().sum()
    }

    fn insert(&self, path: &str, body: Vec<u8>, etag: Option<String>) {
        self.state
            .files
            .lock()
            .unwrap()
            .insert(normalize(path), Fixture { body, etag });
    }
}

impl Drop for FixtureServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

fn normalize(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

async fn serve_file(
    State(state): State<Arc<ServerState>>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Response {
    let key = normalize(&path);
    *state.hits.lock().unwrap().entry(key.clone()).or_insert(0) += 1;

    let Some(fixture) = state.files.lock().unwrap().get(&key).cloned() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    if let Some(etag) = &fixture.etag {
        let matches = headers
            .get(header::IF_NONE_MATCH)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|sent| sent == etag);
        if matches {
            return (StatusCode::NOT_MODIFIED, [(header::ETAG, etag.clone())]).into_response();
        }
        return (
            StatusCode::OK,
            [(header::ETAG, etag.clone())],
            Body::from(fixture.body),
        )
            .into_response();
    }

    (StatusCode::OK, Body::from(fixture.body)).into_response()
}

// ─── Fixture content ───

pub fn sha1_hex(bytes: &[u8]) -> String {
    hex::encode(Sha1::digest(bytes))
}

/// A zip archive with the given file entries.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, data) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

pub const CLIENT_JAR: &[u8] = b"client-jar-bytes";
pub const BRIGADIER_JAR: &[u8] = b"brigadier-jar-bytes";
pub const LWJGL_JAR: &[u8] = b"lwjgl-jar-bytes";
pub const ASSET_A: &[u8] = b"asset-a";
pub const ASSET_B: &[u8] = b"asset-b";

pub const BRIGADIER_PATH: &str = "com/mojang/brigadier/1.2.9/brigadier-1.2.9.jar";
pub const LWJGL_PATH: &str = "org/lwjgl/lwjgl/3.3.3/lwjgl-3.3.3.jar";
pub const LWJGL_LINUX_PATH: &str = "org/lwjgl/lwjgl/3.3.3/lwjgl-3.3.3-natives-linux.jar";
pub const LWJGL_WINDOWS_PATH: &str = "org/lwjgl/lwjgl/3.3.3/lwjgl-3.3.3-natives-windows.jar";
pub const WINDOWS_ONLY_PATH: &str = "org/example/winonly/1.0/winonly-1.0.jar";

/// Register a complete 1.20.4 on the server and return its manifest URL.
///
/// The version carries a client jar, a plain library, a library with linux
/// and windows natives, a windows-only library and an asset index whose
/// two names share one object.
pub fn publish_vanilla(server: &FixtureServer) -> String {
    let native_linux = zip_bytes(&[
        ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0"),
        ("liblwjgl.so", b"elf"),
    ]);
    let native_windows = zip_bytes(&[("lwjgl.dll", b"pe")]);

    server.serve("/client.jar", CLIENT_JAR);
    server.serve(&format!("/libraries/{BRIGADIER_PATH}"), BRIGADIER_JAR);
    server.serve(&format!("/libraries/{LWJGL_PATH}"), LWJGL_JAR);
    server.serve(&format!("/libraries/{LWJGL_LINUX_PATH}"), native_linux.clone());
    server.serve(&format!("/libraries/{LWJGL_WINDOWS_PATH}"), native_windows.clone());
    server.serve(&format!("/libraries/{WINDOWS_ONLY_PATH}"), b"win".to_vec());

    let hash_a = sha1_hex(ASSET_A);
    let hash_b = sha1_hex(ASSET_B);
    server.serve(&format!("/resources/{}/{}", &hash_a[..2], hash_a), ASSET_A);
    server.serve(&format!("/resources/{}/{}", &hash_b[..2], hash_b), ASSET_B);

    let index = serde_json::json!({"objects": {
        "minecraft/sounds/a.ogg": {"hash": hash_a, "size": ASSET_A.len()},
        "minecraft/sounds/a-copy.ogg": {"hash": hash_a, "size": ASSET_A.len()},
        "minecraft/lang/b.json": {"hash": hash_b, "size": ASSET_B.len()}
    }});
    let index_bytes = serde_json::to_vec(&index).unwrap();
    server.serve("/indexes/12.json", index_bytes.clone());

    let manifest = serde_json::json!({
        "id": "1.20.4",
        "type": "release",
        "mainClass": "net.minecraft.client.main.Main",
        "assetIndex": {"id": "12", "url": server.url("/indexes/12.json"), "sha1": sha1_hex(&index_bytes)},
        "downloads": {"client": {"url": server.url("/client.jar"), "sha1": sha1_hex(CLIENT_JAR)}},
        "arguments": {"game": ["--username", "${auth_player_name}"], "jvm": []},
        "libraries": [
            {"name": "com.mojang:brigadier:1.2.9",
             "downloads": {"artifact": {"path": BRIGADIER_PATH,
                                        "url": server.url(&format!("/libraries/{BRIGADIER_PATH}")),
                                        "sha1": sha1_hex(BRIGADIER_JAR)}}},
            {"name": "org.lwjgl:lwjgl:3.3.3",
             "downloads": {
                "artifact": {"path": LWJGL_PATH,
                             "url": server.url(&format!("/libraries/{LWJGL_PATH}"))},
                "classifiers": {
                    "natives-linux": {"path": LWJGL_LINUX_PATH,
                                      "url": server.url(&format!("/libraries/{LWJGL_LINUX_PATH}")),
                                      "sha1": sha1_hex(&native_linux)},
                    "natives-windows": {"path": LWJGL_WINDOWS_PATH,
                                        "url": server.url(&format!("/libraries/{LWJGL_WINDOWS_PATH}"))}
                }},
             "extract": {"exclude": ["META-INF/"]}},
            {"name": "org.example:winonly:1.0",
             "downloads": {"artifact": {"path": WINDOWS_ONLY_PATH,
                                        "url": server.url(&format!("/libraries/{WINDOWS_ONLY_PATH}"))}},
             "rules": [{"action": "allow", "os": {"name": "windows"}}]}
        ]
    });
    server.serve("/v1/1.20.4.json", serde_json::to_vec(&manifest).unwrap());

    let list = serde_json::json!({
        "latest": {"release": "1.20.4", "snapshot": "1.20.4"},
        "versions": [
            {"id": "1.20.4", "type": "release", "url": server.url("/v1/1.20.4.json"),
             "releaseTime": "2023-12-07T12:56:20+00:00"},
            {"id": "23w51b", "type": "snapshot", "url": server.url("/v1/23w51b.json"),
             "releaseTime": "2023-12-18T14:40:00+00:00"}
        ]
    });
    server.serve_with_etag(
        "/mc/game/version_manifest_v2.json",
        serde_json::to_vec(&list).unwrap(),
        "\"list-v1\"",
    );

    server.url("/v1/1.20.4.json")
}

/// Register fabric loader libraries under `/maven/` and return the loader
/// profile JSON (not served; loader profiles are imported from disk).
pub fn publish_fabric(server: &FixtureServer) -> String {
    server.serve(
        "/maven/net/fabricmc/fabric-loader/0.15.11/fabric-loader-0.15.11.jar",
        b"fabric-loader".to_vec(),
    );
    server.serve(
        "/maven/net/fabricmc/intermediary/1.20.4/intermediary-1.20.4.jar",
        b"intermediary".to_vec(),
    );

    serde_json::json!({
        "id": "fabric-loader-0.15.11-1.20.4",
        "inheritsFrom": "1.20.4",
        "type": "release",
        "mainClass": "net.fabricmc.loader.impl.launch.knot.KnotClient",
        "arguments": {
            "game": [],
            "jvm": ["-DFabricMcEmu= net.minecraft.client.main.Main "]
        },
        "libraries": [
            {"name": "net.fabricmc:intermediary:1.20.4", "url": server.url("/maven/")},
            {"name": "net.fabricmc:fabric-loader:0.15.11"}
        ]
    })
    .to_string()
}
