// tests/export.rs - CSV downloads
mod common;

use common::MockBackend;
use labdash::api::{download_export, ExportKind, ExportRange};

#[actix_rt::test]
async fn test_download_uses_server_filename() {
    let backend = MockBackend::start();
    let (client, _) = backend.signed_in_client();

    let file = download_export(&client, ExportKind::AuthLogs, ExportRange::All).await.unwrap();
    assert_eq!(file.filename, "auth_logs_20260201.csv");
    assert_eq!(file.headers().unwrap(), vec!["id", "title", "status"]);
    assert_eq!(file.row_count().unwrap(), 2);

    let request = &backend.state.requests_to("GET", "/api/export/auth-logs")[0];
    assert_eq!(request.csrf, None);

    let dir = tempfile::tempdir().unwrap();
    let path = file.save_into(dir.path()).unwrap();
    assert_eq!(path, dir.path().join("auth_logs_20260201.csv"));
    assert_eq!(std::fs::read(&path).unwrap(), file.bytes);
}
