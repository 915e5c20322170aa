//! Classified Ads Backend - binary entry point
//! Delegates to the library for all app logic.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    classified_ads_backend::run().await
}
