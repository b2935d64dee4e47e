use validator_duty_indexer::{logging, process::App};

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    logging::init();
    App::build().await.run().await
}
