/// Builds a [`Value`](crate::Value) from a JSON-like literal.
///
/// Objects become [`Struct`](crate::Struct)s with fields in the order written.
/// Any other expression goes through [`to_value`](crate::to_value); wrap
/// negative numbers and other multi-token expressions in parentheses.
///
/// ```rust
/// use tbin::{tbin, Value};
///
/// let point = tbin!({ "x": 1, "y": (-2), "tags": ["a", "b"], "note": null });
/// let fields = point.as_struct().unwrap();
/// assert_eq!(fields.get("y"), Some(&Value::Int32(-2)));
/// assert_eq!(fields.get("note"), Some(&Value::Null));
/// ```
#[macro_export]
macro_rules! tbin {
    (null) => {
        $crate::Value::Null
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::Array(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Array(vec![$($crate::tbin!($elem)),*])
    };

    ({}) => {
        $crate::Value::Struct($crate::Struct::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut fields = $crate::Struct::new();
        $(
            fields.insert($key, $crate::tbin!($value));
        )*
        $crate::Value::Struct(fields)
    }};

    ($other:expr) => {
        $crate::to_value(&$other).unwrap_or($crate::Value::Null)
    };
}

#[cfg(test)]
mod tests {
    use crate::{Struct, Value};

    #[test]
    fn test_tbin_macro_primitives() {
        assert_eq!(tbin!(null), Value::Null);
        assert_eq!(tbin!(true), Value::Bool(true));
        assert_eq!(tbin!(42), Value::Int32(42));
        assert_eq!(tbin!(3.5), Value::Float64(3.5));
        assert_eq!(tbin!("hello"), Value::String("hello".to_string()));
        assert_eq!(tbin!((-7i64)), Value::Int64(-7));
    }

    #[test]
    fn test_tbin_macro_nesting() {
        assert_eq!(tbin!({}), Value::Struct(Struct::new()));

        let value = tbin!({
            "name": "poly",
            "points": [{"x": 1, "y": 2}, {"x": 3, "y": 4}]
        });
        let fields = value.as_struct().unwrap();
        let keys: Vec<_> = fields.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name", "points"]);
        let points = fields.get("points").and_then(Value::as_array).unwrap();
        assert_eq!(points.len(), 2);
        assert!(points.iter().all(Value::is_struct));
    }
}
