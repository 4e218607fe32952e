//! Working with Value for runtime flexibility.
//!
//! Run with: cargo run --example dynamic_values

use serde::{Deserialize, Serialize};
use std::error::Error;
use tbin::{decode, encode, tbin, to_value, Struct, Symbol, Value};

#[derive(Debug, Serialize, Deserialize)]
struct User {
    id: u32,
    name: String,
    roles: Vec<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    // Build config dynamically with tbin! macro
    let config = tbin!({
        "host": "localhost",
        "port": 8080,
        "features": ["auth", "logging", "metrics"],
        "debug": true
    });

    println!("Config: {}", config);

    // Access values dynamically
    if let Some(fields) = config.as_struct() {
        if let Some(host) = fields.get("host").and_then(Value::as_str) {
            println!("Accessing field 'host': {}", host);
        }

        if let Some(port) = fields.get("port").and_then(Value::as_i64) {
            println!("Accessing field 'port': {}", port);
        }

        if let Some(features) = fields.get("features").and_then(Value::as_array) {
            println!("Accessing field 'features': {} items\n", features.len());
        }
    }

    // Kinds serde has no word for survive a Value round trip
    let mut event = Struct::new();
    event.insert("at", Value::Timestamp(chrono::Utc::now()));
    event.insert("state", Value::Symbol(Symbol::new("ready")));
    event.insert("trace", Value::Uuid(uuid::Uuid::from_u128(0x5eed)));
    let event = Value::Struct(event);
    let decoded = decode(&encode(&event)?)?;
    println!("Event: {}", decoded);
    println!("  same kinds after decode: {}\n", decoded.type_def() == event.type_def());

    // Convert existing struct to Value
    let user = User {
        id: 123,
        name: "Alice".to_string(),
        roles: vec!["admin".to_string(), "developer".to_string()],
    };

    let user_value = to_value(&user)?;
    println!("User as Value: {}\n", user_value);

    // Runtime type checking
    println!("Type checks:");
    println!("  is_struct: {}", user_value.is_struct());
    println!("  is_array:  {}", user_value.is_array());
    println!("  is_string: {}", user_value.is_string());
    println!("  kind:      {}", user_value.kind().signature());

    Ok(())
}
