use tbin::{decode, encode, tbin, Primitive, Struct, Value};

#[test]
fn test_tbin_macro_null() {
    assert_eq!(tbin!(null), Value::Null);
}

#[test]
fn test_tbin_macro_booleans() {
    assert_eq!(tbin!(true), Value::Bool(true));
    assert_eq!(tbin!(false), Value::Bool(false));
}

#[test]
fn test_tbin_macro_numbers() {
    assert_eq!(tbin!(42), Value::Int32(42));
    assert_eq!(tbin!(3.5), Value::Float64(3.5));
    assert_eq!(tbin!((-123)), Value::Int32(-123));
    assert_eq!(tbin!(7u8), Value::Int16(7));
    assert_eq!(tbin!(1.5f32), Value::Float32(1.5));
}

#[test]
fn test_tbin_macro_strings() {
    assert_eq!(tbin!("hello world"), Value::String("hello world".to_string()));
    assert_eq!(tbin!(""), Value::String(String::new()));
}

#[test]
fn test_tbin_macro_arrays() {
    assert_eq!(tbin!([]), Value::Array(vec![]));
    assert_eq!(
        tbin!([1, 2, 3]),
        Value::Array(vec![Value::Int32(1), Value::Int32(2), Value::Int32(3)])
    );
    assert_eq!(
        tbin!([1, "hello", true, null]),
        Value::Array(vec![
            Value::Int32(1),
            Value::String("hello".to_string()),
            Value::Bool(true),
            Value::Null,
        ])
    );
}

#[test]
fn test_tbin_macro_structs() {
    assert_eq!(tbin!({}), Value::Struct(Struct::new()));

    let simple = tbin!({
        "name": "Alice",
        "age": 30
    });
    let fields = simple.as_struct().unwrap();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields.get("name"), Some(&Value::from("Alice")));
    assert_eq!(fields.get("age"), Some(&Value::Int32(30)));
}

#[test]
fn test_tbin_macro_nested() {
    let nested = tbin!({
        "user": {
            "id": 123,
            "name": "Bob",
            "active": true
        },
        "tags": ["admin", "developer"],
        "count": 42
    });

    let fields = nested.as_struct().unwrap();
    assert_eq!(fields.len(), 3);

    let user = fields.get("user").and_then(Value::as_struct).unwrap();
    assert_eq!(user.get("id"), Some(&Value::Int32(123)));
    assert_eq!(user.get("active"), Some(&Value::Bool(true)));

    let tags = fields.get("tags").and_then(Value::as_array).unwrap();
    assert_eq!(tags, &vec![Value::from("admin"), Value::from("developer")]);

    assert_eq!(decode(&encode(&nested).unwrap()).unwrap(), nested);
}

#[test]
fn test_value_methods() {
    let null_val = tbin!(null);
    assert!(null_val.is_null());
    assert!(!null_val.is_bool());
    assert!(!null_val.is_integer());
    assert!(!null_val.is_string());
    assert!(!null_val.is_array());
    assert!(!null_val.is_struct());
    assert_eq!(null_val.kind(), Primitive::Null);

    let bool_val = tbin!(true);
    assert_eq!(bool_val.as_bool(), Some(true));

    let int_val = tbin!((-9i8));
    assert!(int_val.is_integer());
    assert_eq!(int_val.as_i64(), Some(-9));
    assert_eq!(int_val.as_f64(), Some(-9.0));

    let str_val = tbin!("hello");
    assert_eq!(str_val.as_str(), Some("hello"));

    let array_val = tbin!([1, 2, 3]);
    assert_eq!(array_val.as_array().map(Vec::len), Some(3));
    assert_eq!(array_val.kind(), Primitive::Array);

    let struct_val = tbin!({"key": "value"});
    assert_eq!(struct_val.as_struct().map(Struct::len), Some(1));
    assert_eq!(struct_val.type_def().signature(), "Struct");
}

#[test]
fn test_display() {
    let value = tbin!({"id": 7, "tags": ["a", "b"], "gone": null});
    assert_eq!(value.to_string(), r#"{id:7,tags:["a","b"],gone:null}"#);
    assert_eq!(Value::Bytes(vec![0xde, 0xad]).to_string(), "<de ad>");
}
