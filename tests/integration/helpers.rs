//! Shared helpers for integration tests.

use assetsync::bundle::{BundleSync, RegistryResolver};
use assetsync::config::{BundleConfig, SyncConfig};
use assetsync::TransferEvent;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub(crate) const PACKAGE: &str = "@ffmpeg/core";
pub(crate) const LOADER: &str = "ffmpeg-core.js";
pub(crate) const ENGINE: &str = "ffmpeg-core.wasm";

/// A bundle sync pointed at a mock registry/CDN, installing into a temp dir.
pub(crate) struct BundleFixture {
    pub server: MockServer,
    pub dir: tempfile::TempDir,
    pub sync: BundleSync<RegistryResolver>,
}

impl BundleFixture {
    pub(crate) async fn start() -> Self {
        Self::start_with_cdn(None).await
    }

    /// Like [`start`](Self::start) but fetching content from `cdn_url`.
    pub(crate) async fn start_with_cdn(cdn_url: Option<String>) -> Self {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = SyncConfig {
            bundle: BundleConfig {
                registry_url: server.uri(),
                cdn_url: cdn_url.unwrap_or_else(|| server.uri()),
                install_dir: Some(dir.path().join("bundle")),
                version_file: Some(dir.path().join("bundle-version.json")),
                ..BundleConfig::default()
            },
            ..SyncConfig::default()
        };
        let sync = BundleSync::from_config(&config).expect("build bundle sync");
        Self { server, dir, sync }
    }

    pub(crate) fn install_dir(&self) -> PathBuf {
        self.dir.path().join("bundle")
    }

    pub(crate) fn version_file(&self) -> PathBuf {
        self.dir.path().join("bundle-version.json")
    }

    /// Lay down an installed bundle and its version record.
    pub(crate) fn install(&self, version: &str, loader: &str, engine: &str) {
        let dir = self.install_dir();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(LOADER), loader).unwrap();
        std::fs::write(dir.join(ENGINE), engine).unwrap();
        self.sync.store().write(version).unwrap();
    }

    pub(crate) fn read_installed(&self, file: &str) -> String {
        std::fs::read_to_string(self.install_dir().join(file)).unwrap()
    }

    pub(crate) async fn mock_latest(&self, version: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/{PACKAGE}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": PACKAGE,
                "dist-tags": { "latest": version }
            })))
            .mount(&self.server)
            .await;
    }

    /// Serve `file` of `version`, expecting exactly `hits` requests.
    pub(crate) async fn mock_file(&self, version: &str, file: &str, body: &str, hits: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/{PACKAGE}@{version}/dist/esm/{file}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(hits)
            .mount(&self.server)
            .await;
    }
}

/// Collects every transfer event it receives.
#[derive(Clone, Default)]
pub(crate) struct EventLog(Arc<Mutex<Vec<TransferEvent>>>);

impl EventLog {
    pub(crate) fn callback(&self) -> impl Fn(TransferEvent) + Send + Sync + 'static {
        let events = Arc::clone(&self.0);
        move |event: TransferEvent| events.lock().unwrap().push(event)
    }

    pub(crate) fn events(&self) -> Vec<TransferEvent> {
        self.0.lock().unwrap().clone()
    }
}

/// A progress sink that drops everything.
pub(crate) fn ignore(_: TransferEvent) {}

/// A CDN stand-in whose responses announce `Content-Length: 1000` but close
/// the connection after 10 bytes.
pub(crate) async fn truncating_cdn() -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            let _ = socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\nConnection: close\r\n\r\n0123456789",
                )
                .await;
            let _ = socket.shutdown().await;
        }
    });
    format!("http://{addr}")
}
