#[tokio::main]
async fn main() -> anyhow::Result<()> {
    oracle_swap_lib::run().await
}
