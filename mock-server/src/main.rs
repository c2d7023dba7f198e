use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "11434".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "mock ollama listening");
    mock_server::run(listener).await
}
