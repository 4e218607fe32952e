//! Declaring wire shapes for Rust types with `Record`.
//!
//! Run with: cargo run --example typed_records

use serde::{Deserialize, Serialize};
use std::error::Error;
use tbin::{
    format::hex, from_slice_record, to_bytes, to_bytes_record, FieldDescriptor, FieldKind,
    Primitive, Record, TypeDef,
};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Point {
    x: i32,
    y: i32,
}

impl Record for Point {
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::required("x", FieldKind::Primitive(Primitive::Int32)),
        FieldDescriptor::required("y", FieldKind::Primitive(Primitive::Int32)),
    ];
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
enum Style {
    Solid,
    Dashed,
}

fn style_shape() -> TypeDef {
    TypeDef::enum_of(["Solid", "Dashed"])
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Polyline {
    name: Option<String>,
    style: Style,
    points: Vec<Point>,
}

impl Record for Polyline {
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::optional("name", FieldKind::Primitive(Primitive::String)),
        FieldDescriptor::required("style", FieldKind::Nested(style_shape)),
        FieldDescriptor::required(
            "points",
            FieldKind::Array(&FieldKind::Nested(Point::type_def)),
        ),
    ];
}

fn main() -> Result<(), Box<dyn Error>> {
    let polyline = Polyline {
        name: Some("outline".to_string()),
        style: Style::Dashed,
        points: vec![Point { x: 1, y: 11 }, Point { x: 2, y: 22 }, Point { x: 3, y: 33 }],
    };

    println!("Declared shape: {}\n", Polyline::type_def());

    let typed = to_bytes_record(&polyline)?;
    let generic = to_bytes(&polyline)?;
    println!("Typed   ({:>3} bytes): {}", typed.len(), hex(&typed));
    println!("Generic ({:>3} bytes): {}\n", generic.len(), hex(&generic));

    let back: Polyline = from_slice_record(&typed)?;
    assert_eq!(polyline, back);
    println!("✓ Typed round-trip successful");

    // A generic stream decodes into the same record type.
    let back: Polyline = from_slice_record(&generic)?;
    assert_eq!(polyline, back);
    println!("✓ Generic stream decoded as record");

    Ok(())
}
