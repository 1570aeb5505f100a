//! End-to-end workflow tests against the local filesystem backend, with an
//! in-process HTTP server standing in for the download origin and the
//! error-tracking service.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use base64::{engine::general_purpose, Engine as _};
use tempfile::TempDir;
use urlstash_core::{Config, TriggerEvent};
use urlstash_fn::{ErrorReporter, Workflow};
use urlstash_storage::{EntryKind, RemoteEntry, RemoteStore, StoreResult};

const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];

async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Serve `body` with `status` at `/pic.jpg`, returning the full URL.
async fn file_server(status: StatusCode, body: &'static [u8]) -> String {
    let router = Router::new().route("/pic.jpg", get(move || async move { (status, body) }));
    let addr = spawn(router).await;
    format!("http://{}/pic.jpg", addr)
}

/// Error-tracking stub recording received report bodies.
async fn reporter_server() -> (ErrorReporter, Arc<Mutex<Vec<String>>>) {
    let reports = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&reports);
    let router = Router::new().route(
        "/report",
        post(move |body: String| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push(body);
                StatusCode::OK
            }
        }),
    );
    let addr = spawn(router).await;
    let reporter = ErrorReporter::new(Some(format!("http://{}/report", addr)));
    (reporter, reports)
}

fn workflow(store_dir: &TempDir, reporter: ErrorReporter) -> Workflow {
    let config = Config::local(store_dir.path().to_string_lossy().to_string());
    Workflow::new(config, reporter).unwrap()
}

fn event(json: &str) -> TriggerEvent {
    TriggerEvent {
        data: Some(general_purpose::STANDARD.encode(json)),
    }
}

#[tokio::test]
async fn missing_data_fails_with_one_report() {
    let store_dir = TempDir::new().unwrap();
    let (reporter, reports) = reporter_server().await;
    let workflow = workflow(&store_dir, reporter);

    let status = workflow.handle(&TriggerEvent { data: None }).await;

    assert_eq!(status, 1);
    assert_eq!(reports.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_base64_fails() {
    let store_dir = TempDir::new().unwrap();
    let workflow = workflow(&store_dir, ErrorReporter::disabled());

    let status = workflow
        .handle(&TriggerEvent {
            data: Some("%%% not base64 %%%".to_string()),
        })
        .await;

    assert_eq!(status, 1);
}

#[tokio::test]
async fn invalid_json_fails() {
    let store_dir = TempDir::new().unwrap();
    let workflow = workflow(&store_dir, ErrorReporter::disabled());

    let data = general_purpose::STANDARD.encode("this is not json");
    let status = workflow
        .handle(&TriggerEvent { data: Some(data) })
        .await;

    assert_eq!(status, 1);
}

#[tokio::test]
async fn missing_url_fails_before_any_upload() {
    let store_dir = TempDir::new().unwrap();
    let (reporter, reports) = reporter_server().await;
    let workflow = workflow(&store_dir, reporter);

    let status = workflow.handle(&event(r#"{"folder": "albums"}"#)).await;

    assert_eq!(status, 1);
    assert_eq!(reports.lock().unwrap().len(), 1);
    // Nothing was stored.
    assert_eq!(std::fs::read_dir(store_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn missing_folder_uploads_to_root() {
    let store_dir = TempDir::new().unwrap();
    let workflow = workflow(&store_dir, ErrorReporter::disabled());

    let url = file_server(StatusCode::OK, JPEG_BYTES).await;
    let status = workflow
        .handle(&event(&format!(r#"{{"url": "{}"}}"#, url)))
        .await;

    assert_eq!(status, 0);
    let stored = std::fs::read(store_dir.path().join("pic.jpg")).unwrap();
    assert_eq!(stored, JPEG_BYTES);
}

#[tokio::test]
async fn uploads_into_existing_folder() {
    let store_dir = TempDir::new().unwrap();
    std::fs::create_dir(store_dir.path().join("albums")).unwrap();
    let workflow = workflow(&store_dir, ErrorReporter::disabled());

    let url = file_server(StatusCode::OK, JPEG_BYTES).await;
    let status = workflow
        .handle(&event(&format!(
            r#"{{"url": "{}", "folder": "albums"}}"#,
            url
        )))
        .await;

    assert_eq!(status, 0);
    let stored = std::fs::read(store_dir.path().join("albums").join("pic.jpg")).unwrap();
    assert_eq!(stored, JPEG_BYTES);
}

#[tokio::test]
async fn creates_missing_folder_then_uploads() {
    let store_dir = TempDir::new().unwrap();
    let workflow = workflow(&store_dir, ErrorReporter::disabled());

    let url = file_server(StatusCode::OK, JPEG_BYTES).await;
    let status = workflow
        .handle(&event(&format!(
            r#"{{"url": "{}", "folder": "albums"}}"#,
            url
        )))
        .await;

    assert_eq!(status, 0);
    assert!(store_dir.path().join("albums").is_dir());
    let stored = std::fs::read(store_dir.path().join("albums").join("pic.jpg")).unwrap();
    assert_eq!(stored, JPEG_BYTES);
}

#[tokio::test]
async fn download_404_fails_with_one_report_and_no_upload() {
    let store_dir = TempDir::new().unwrap();
    let (reporter, reports) = reporter_server().await;
    let workflow = workflow(&store_dir, reporter);

    let url = file_server(StatusCode::NOT_FOUND, b"").await;
    let status = workflow
        .handle(&event(&format!(
            r#"{{"url": "{}", "folder": "albums"}}"#,
            url
        )))
        .await;

    assert_eq!(status, 1);
    assert_eq!(reports.lock().unwrap().len(), 1);
    assert_eq!(std::fs::read_dir(store_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn reuses_store_session_across_invocations() {
    let store_dir = TempDir::new().unwrap();
    let workflow = workflow(&store_dir, ErrorReporter::disabled());

    let url = file_server(StatusCode::OK, JPEG_BYTES).await;
    let payload = event(&format!(r#"{{"url": "{}", "folder": "albums"}}"#, url));

    assert_eq!(workflow.handle(&payload).await, 0);
    // Second invocation overwrites the same target and still succeeds.
    assert_eq!(workflow.handle(&payload).await, 0);
}

#[tokio::test]
async fn url_without_filename_fails_with_missing_filename() {
    let store_dir = TempDir::new().unwrap();
    let (reporter, reports) = reporter_server().await;
    let workflow = workflow(&store_dir, reporter);

    let status = workflow
        .handle(&event(r#"{"url": "https://example.com/", "folder": "albums"}"#))
        .await;

    assert_eq!(status, 1);
    let reports = reports.lock().unwrap();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].contains("MISSING_FILENAME"));
    assert_eq!(std::fs::read_dir(store_dir.path()).unwrap().count(), 0);
}

// -- Scripted store for driving the branches the filesystem backend cannot --

/// What the bare-name lookup returns for the destination folder.
enum FolderLookup {
    Folder,
    File,
    Missing,
}

/// `RemoteStore` whose lookup results are fixed up front and whose mutating
/// calls are recorded, so individual folder-resolution and rename branches
/// can be exercised directly.
struct ScriptedStore {
    path_exists: bool,
    folder_lookup: FolderLookup,
    uploaded_entry_missing: bool,
    uploads: Mutex<Vec<Option<String>>>,
    created: Mutex<Vec<String>>,
    renames: Mutex<Vec<(String, String)>>,
}

impl ScriptedStore {
    fn new(path_exists: bool, folder_lookup: FolderLookup) -> Self {
        Self {
            path_exists,
            folder_lookup,
            uploaded_entry_missing: false,
            uploads: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
            renames: Mutex::new(Vec::new()),
        }
    }

    fn folder_entry() -> RemoteEntry {
        RemoteEntry {
            key: "albums/".to_string(),
            name: "albums".to_string(),
            kind: EntryKind::Folder,
        }
    }

    fn file_entry(name: &str) -> RemoteEntry {
        RemoteEntry {
            key: name.to_string(),
            name: name.to_string(),
            kind: EntryKind::File,
        }
    }
}

#[async_trait]
impl RemoteStore for ScriptedStore {
    async fn find_path(&self, _path: &str) -> StoreResult<Option<RemoteEntry>> {
        Ok(self.path_exists.then(Self::folder_entry))
    }

    async fn create_folder(&self, name: &str) -> StoreResult<()> {
        self.created.lock().unwrap().push(name.to_string());
        Ok(())
    }

    async fn find(&self, name: &str) -> StoreResult<Option<RemoteEntry>> {
        // The workflow looks up the destination folder by its payload name
        // and the uploaded file by its temporary basename.
        if name == "albums" {
            Ok(match self.folder_lookup {
                FolderLookup::Folder => Some(Self::folder_entry()),
                FolderLookup::File => Some(Self::file_entry("albums")),
                FolderLookup::Missing => None,
            })
        } else if self.uploaded_entry_missing {
            Ok(None)
        } else {
            Ok(Some(Self::file_entry(name)))
        }
    }

    async fn upload(
        &self,
        local_path: &Path,
        folder: Option<&RemoteEntry>,
    ) -> StoreResult<RemoteEntry> {
        self.uploads
            .lock()
            .unwrap()
            .push(folder.map(|f| f.key.clone()));
        let name = local_path.file_name().unwrap().to_string_lossy().to_string();
        Ok(Self::file_entry(&name))
    }

    async fn rename(&self, entry: &RemoteEntry, new_name: &str) -> StoreResult<RemoteEntry> {
        self.renames
            .lock()
            .unwrap()
            .push((entry.name.clone(), new_name.to_string()));
        Ok(Self::file_entry(new_name))
    }
}

fn scripted_workflow(store: Arc<ScriptedStore>, reporter: ErrorReporter) -> Workflow {
    let config = Config::local("/unused".to_string());
    Workflow::with_store(config, reporter, store).unwrap()
}

#[tokio::test]
async fn existing_folder_entry_is_passed_to_upload() {
    let store = Arc::new(ScriptedStore::new(true, FolderLookup::Folder));
    let workflow = scripted_workflow(Arc::clone(&store), ErrorReporter::disabled());

    let url = file_server(StatusCode::OK, JPEG_BYTES).await;
    let status = workflow
        .handle(&event(&format!(
            r#"{{"url": "{}", "folder": "albums"}}"#,
            url
        )))
        .await;

    assert_eq!(status, 0);
    assert!(store.created.lock().unwrap().is_empty());
    assert_eq!(*store.uploads.lock().unwrap(), vec![Some("albums/".to_string())]);
    let renames = store.renames.lock().unwrap();
    assert_eq!(renames.len(), 1);
    assert_eq!(renames[0].1, "pic.jpg");
}

#[tokio::test]
async fn folder_name_resolving_to_a_file_uploads_to_root() {
    let store = Arc::new(ScriptedStore::new(true, FolderLookup::File));
    let workflow = scripted_workflow(Arc::clone(&store), ErrorReporter::disabled());

    let url = file_server(StatusCode::OK, JPEG_BYTES).await;
    let status = workflow
        .handle(&event(&format!(
            r#"{{"url": "{}", "folder": "albums"}}"#,
            url
        )))
        .await;

    assert_eq!(status, 0);
    assert_eq!(*store.uploads.lock().unwrap(), vec![None]);
}

#[tokio::test]
async fn folder_unlocatable_by_name_after_creation_uploads_to_root() {
    let store = Arc::new(ScriptedStore::new(false, FolderLookup::Missing));
    let workflow = scripted_workflow(Arc::clone(&store), ErrorReporter::disabled());

    let url = file_server(StatusCode::OK, JPEG_BYTES).await;
    let status = workflow
        .handle(&event(&format!(
            r#"{{"url": "{}", "folder": "albums"}}"#,
            url
        )))
        .await;

    assert_eq!(status, 0);
    assert_eq!(*store.created.lock().unwrap(), vec!["albums".to_string()]);
    assert_eq!(*store.uploads.lock().unwrap(), vec![None]);
}

#[tokio::test]
async fn uploaded_entry_lookup_miss_is_fatal() {
    let mut store = ScriptedStore::new(true, FolderLookup::Folder);
    store.uploaded_entry_missing = true;
    let store = Arc::new(store);
    let (reporter, reports) = reporter_server().await;
    let workflow = scripted_workflow(Arc::clone(&store), reporter);

    let url = file_server(StatusCode::OK, JPEG_BYTES).await;
    let status = workflow
        .handle(&event(&format!(
            r#"{{"url": "{}", "folder": "albums"}}"#,
            url
        )))
        .await;

    assert_eq!(status, 1);
    let reports = reports.lock().unwrap();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].contains("RENAME_FAILED"));
    // The upload went through but no rename was attempted.
    assert_eq!(store.uploads.lock().unwrap().len(), 1);
    assert!(store.renames.lock().unwrap().is_empty());
}
