use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tbin::{
    encode, from_slice_record, tbin, to_bytes_record, Decoder, Encoder, Error, FieldDescriptor,
    FieldKind, Primitive, Record, TypeDef, Value,
};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Copy)]
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

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Polyline {
    name: Option<String>,
    points: Vec<Point>,
}

impl Record for Polyline {
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::optional("name", FieldKind::Primitive(Primitive::String)),
        FieldDescriptor::required(
            "points",
            FieldKind::Array(&FieldKind::Nested(Point::type_def)),
        ),
    ];
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
enum Status {
    Active,
    Suspended,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(untagged)]
enum Reading {
    Number(i64),
    Text(String),
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Device {
    id: Uuid,
    seen: DateTime<Utc>,
    status: Status,
    last: Reading,
    port: u16,
}

fn status_shape() -> TypeDef {
    TypeDef::enum_of(["Active", "Suspended"])
}

fn reading_shape() -> TypeDef {
    TypeDef::union_of(vec![TypeDef::INT64, TypeDef::STRING])
}

impl Record for Device {
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::required("id", FieldKind::Primitive(Primitive::Uuid)),
        FieldDescriptor::required("seen", FieldKind::Primitive(Primitive::Timestamp)),
        FieldDescriptor::required("status", FieldKind::Nested(status_shape)),
        FieldDescriptor::required("last", FieldKind::Nested(reading_shape)),
        FieldDescriptor::required("port", FieldKind::Primitive(Primitive::Int32)),
    ];
}

fn sample_polyline() -> Polyline {
    Polyline {
        name: Some("route".to_string()),
        points: vec![Point { x: 1, y: 11 }, Point { x: 2, y: 22 }],
    }
}

#[test]
fn test_point_wire_layout() {
    let bytes = to_bytes_record(&Point { x: 1, y: 11 }).unwrap();
    assert_eq!(
        bytes,
        vec![0x18, 0x40, 0x13, 0x02, 0x01, b'x', 0x04, 0x01, b'y', 0x04, 0x40, 0x02, 0x16]
    );
    assert_eq!(from_slice_record::<Point>(&bytes).unwrap(), Point { x: 1, y: 11 });
}

#[test]
fn test_polyline_roundtrip() {
    let polyline = sample_polyline();
    let bytes = to_bytes_record(&polyline).unwrap();
    assert_eq!(from_slice_record::<Polyline>(&bytes).unwrap(), polyline);

    let unnamed = Polyline {
        name: None,
        points: vec![],
    };
    let bytes = to_bytes_record(&unnamed).unwrap();
    assert_eq!(from_slice_record::<Polyline>(&bytes).unwrap(), unnamed);
}

#[test]
fn test_typed_is_smaller_than_generic() {
    let points: Vec<Point> = (0..50).map(|i| Point { x: i, y: -i }).collect();
    let polyline = Polyline { name: None, points };

    let typed = to_bytes_record(&polyline).unwrap();
    let generic = tbin::to_bytes(&polyline).unwrap();
    assert!(typed.len() < generic.len());
}

#[test]
fn test_repeated_records_reuse_definitions() {
    let mut encoder = Encoder::new(Vec::new()).unwrap();
    for i in 0..10 {
        encoder.encode_record(&Point { x: i, y: i }).unwrap();
    }
    let bytes = encoder.into_inner();
    // version + one 9-byte definition + ten 3-byte values
    assert_eq!(bytes.len(), 1 + 9 + 10 * 3);

    let mut decoder = Decoder::new(bytes.as_slice());
    for i in 0..10 {
        assert_eq!(decoder.decode_record::<Point>().unwrap(), Point { x: i, y: i });
    }
    assert!(decoder.decode_next().unwrap().is_none());
}

#[test]
fn test_enum_union_uuid_and_timestamp_fields() {
    let device = Device {
        id: Uuid::from_u128(0x1234_5678_9abc_def0),
        seen: Utc.timestamp_millis_opt(1_700_000_000_500).unwrap(),
        status: Status::Suspended,
        last: Reading::Text("offline".to_string()),
        port: 8080,
    };
    let bytes = to_bytes_record(&device).unwrap();
    assert_eq!(from_slice_record::<Device>(&bytes).unwrap(), device);

    let device = Device {
        last: Reading::Number(-40),
        status: Status::Active,
        ..device
    };
    let bytes = to_bytes_record(&device).unwrap();
    assert_eq!(from_slice_record::<Device>(&bytes).unwrap(), device);
}

#[test]
fn test_missing_required_field() {
    let bytes = encode(&tbin!({"x": 1})).unwrap();
    assert!(matches!(
        from_slice_record::<Point>(&bytes),
        Err(Error::MissingField(name)) if name == "y"
    ));
}

#[test]
fn test_type_mismatch() {
    let bytes = encode(&tbin!({"x": "one", "y": 2})).unwrap();
    assert!(matches!(
        from_slice_record::<Point>(&bytes),
        Err(Error::TypeMismatch { .. })
    ));

    let bytes = encode(&Value::Int32(4)).unwrap();
    assert!(matches!(
        from_slice_record::<Point>(&bytes),
        Err(Error::TypeMismatch { .. })
    ));
}

#[test]
fn test_generic_stream_decodes_as_record() {
    let bytes = encode(&tbin!({"y": 2, "x": 1})).unwrap();
    assert_eq!(from_slice_record::<Point>(&bytes).unwrap(), Point { x: 1, y: 2 });
}

#[test]
fn test_out_of_range_field_is_unencodable() {
    #[derive(Serialize, Deserialize)]
    struct Narrow {
        level: i64,
    }

    impl Record for Narrow {
        const FIELDS: &'static [FieldDescriptor] = &[FieldDescriptor::required(
            "level",
            FieldKind::Primitive(Primitive::Int8),
        )];
    }

    assert!(to_bytes_record(&Narrow { level: 100 }).is_ok());
    assert!(matches!(
        to_bytes_record(&Narrow { level: 1000 }),
        Err(Error::UnencodableShape(_))
    ));
}

#[test]
fn test_required_any_field_keeps_null() {
    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Holder {
        id: i64,
        extra: Option<i64>,
    }

    impl Record for Holder {
        const FIELDS: &'static [FieldDescriptor] = &[
            FieldDescriptor::required("id", FieldKind::Primitive(Primitive::Int64)),
            FieldDescriptor::required("extra", FieldKind::Primitive(Primitive::Any)),
        ];
    }

    let empty = Holder { id: 1, extra: None };
    let bytes = to_bytes_record(&empty).unwrap();
    assert_eq!(from_slice_record::<Holder>(&bytes).unwrap(), empty);

    let full = Holder {
        id: 2,
        extra: Some(7),
    };
    let bytes = to_bytes_record(&full).unwrap();
    assert_eq!(from_slice_record::<Holder>(&bytes).unwrap(), full);
}
