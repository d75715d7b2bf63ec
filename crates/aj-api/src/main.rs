#[tokio::main]
async fn main() {
    if let Err(err) = aj_api::run().await {
        tracing::error!(error = %err, "aj-api failed");
        std::process::exit(1);
    }
}
