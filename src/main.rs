#[tokio::main]
async fn main() {
    wedding_invite::run().await
}
