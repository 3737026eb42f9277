//! Record Client Example
//!
//! Run: cargo run -p recwire-rudp --example record_client [addr]
//!
//! Performs a handful of add/retrieve exchanges against a running
//! record_server and prints each outcome.

use recwire_proto::{Command, Record};
use recwire_rudp::Connection;

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

    println!("Record Client");
    println!("=============");
    println!("Server: {}", addr);
    println!();

    let mut conn = Connection::open(addr.as_str())?;

    for (id, name, age) in [(7, "Ann", 30), (12, "Maya", 27), (7, "Bob", 44)] {
        let reply = conn.execute(Record::add(id, name, age))?;
        match reply.command {
            Command::AddOk => println!("ID {} added successfully", id),
            Command::AddDuplicate => println!("ID {} already exists", id),
            other => println!("unexpected reply: {:?}", other),
        }
    }

    for id in [12, 99] {
        let reply = conn.execute(Record::retrieve(id))?;
        match reply.command {
            Command::RetrieveOk => {
                println!("ID: {}", reply.id);
                println!("Name: {}", reply.name);
                println!("Age: {}", reply.age);
            }
            Command::RetrieveMissing => println!("ID {} does not exist", id),
            other => println!("unexpected reply: {:?}", other),
        }
    }

    conn.close()?;
    Ok(())
}
