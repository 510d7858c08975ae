use std::sync::OnceLock;
use tracing_subscriber::FmtSubscriber;

/// Start a fresh mock service on an ephemeral port and return its base URL.
#[allow(unused)]
pub async fn mock_service() -> String {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();
    ONCE_LOCK.get_or_init(|| {
        let _ = FmtSubscriber::builder()
            .with_env_filter("rampload=debug,rampload_runner=info,mock_service=info")
            .try_init();
    });

    let addr = mock_service::spawn("127.0.0.1:0")
        .await
        .expect("mock service failed to bind");
    format!("http://{addr}")
}
