#[tokio::main]
async fn main() {
    if let Err(err) = tf_api::run().await {
        tracing::error!(error = %err, "tf-api failed");
        eprintln!("tf-api failed: {err}");
        std::process::exit(1);
    }
}
