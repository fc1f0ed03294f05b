use config::{ConfigScope, ScopeReloadEvent, Setting, watch_scope};
use data_types::Integer;
use storage::StoreFormat;
use testing::sample_config;
use tokio::time::{Duration, Instant, timeout};

#[tokio::test]
async fn settings_observe_reloaded_file() {
    let fixture = sample_config(StoreFormat::Toml).unwrap();
    let scope = ConfigScope::open(fixture.path()).unwrap();
    let mut port = Setting::declare(&scope, "Server", "port", Integer::new(80)).unwrap();
    assert_eq!(port.get().unwrap(), 8080);

    let (_tx, mut rx) = watch_scope(scope.clone()).await.unwrap();
    let ready = timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("Timeout waiting for Ready event")
        .expect("No event received");
    assert_eq!(ready, ScopeReloadEvent::Ready);

    fixture
        .overwrite("[Server]\nhost = \"localhost\"\nport = 9090\n")
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while port.get().ok() != Some(9090) {
        assert!(Instant::now() < deadline, "setting never saw the new port");
        let _ = timeout(Duration::from_millis(500), rx.recv()).await;
    }
}
