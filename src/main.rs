//! Elegance Events backend - binary entry point.
//! Delegates to the library for all app logic.

#[tokio::main]
async fn main() {
    elegance_backend::run().await;
}
