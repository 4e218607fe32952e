//! Basic TBin serialization and deserialization.
//!
//! Run with: cargo run --example simple

use serde::{Deserialize, Serialize};
use std::error::Error;
use tbin::{format::hex, from_slice, to_bytes};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct User {
    id: u32,
    name: String,
    email: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let users = vec![
        User {
            id: 42,
            name: "Alice Johnson".to_string(),
            email: "alice@example.com".to_string(),
        },
        User {
            id: 43,
            name: "Bob Smith".to_string(),
            email: "bob@example.com".to_string(),
        },
    ];

    // Serialize to TBin
    let bytes = to_bytes(&users)?;
    println!("TBin output ({} bytes):\n{}\n", bytes.len(), hex(&bytes));

    // Deserialize back to struct
    let users_back: Vec<User> = from_slice(&bytes)?;
    assert_eq!(users, users_back);
    println!("✓ Round-trip successful");

    Ok(())
}
