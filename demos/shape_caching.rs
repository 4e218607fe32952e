//! What repeated shapes and field names cost on one stream.
//!
//! Run with: cargo run --example shape_caching

use std::error::Error;
use tbin::{format::hex, tbin, Decoder, Encoder, Field, TypeDef};

fn main() -> Result<(), Box<dyn Error>> {
    let point = TypeDef::struct_of(vec![
        Field::required("x", TypeDef::INT32),
        Field::required("y", TypeDef::INT32),
    ]);

    // Generic values: field names are sent once per stream, then by id.
    let mut encoder = Encoder::new(Vec::new())?;
    let mut previous = encoder.get_ref().len();
    for i in 0..4 {
        encoder.encode(&tbin!({"x": i, "y": (i * 10)}))?;
        let len = encoder.get_ref().len();
        println!("generic value {}: {}", i, hex(&encoder.get_ref()[previous..len]));
        previous = len;
    }
    println!();

    // Declared shape: the definition is sent once, then values carry payloads only.
    let mut encoder = Encoder::new(Vec::new())?;
    let mut previous = encoder.get_ref().len();
    for i in 0..4 {
        encoder.encode_as(&tbin!({"x": i, "y": (i * 10)}), &point)?;
        let len = encoder.get_ref().len();
        println!("typed value {}:   {}", i, hex(&encoder.get_ref()[previous..len]));
        previous = len;
    }
    let bytes = encoder.into_inner();
    println!();

    for value in Decoder::new(bytes.as_slice()) {
        println!("decoded: {}", value?);
    }

    Ok(())
}
