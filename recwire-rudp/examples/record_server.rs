//! Record Server Example
//!
//! Run: cargo run -p recwire-rudp --example record_server [addr]

use recwire_rudp::RecordServer;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recwire_rudp=debug".into()),
        )
        .init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:7400".to_string());

    println!("Record Server");
    println!("=============");

    let mut server = RecordServer::bind(addr.as_str())?;
    println!("Listening on: {}", server.local_addr());
    println!();

    server.run()?;
    Ok(())
}
