use serde_json::Value;

/// Named parameter values bound to one statement or transaction block.
///
/// Backed by `serde_json::Map`, which iterates in key order, so composing the
/// same statements always produces the same output.
pub type Bindings = serde_json::Map<String, Value>;

/// Build a [`Bindings`] map from `key => value` pairs.
///
/// Values go through `serde_json::json!`, so anything serializable works.
///
/// # Examples
///
/// ```
/// use flexstore::bindings;
///
/// let vars = bindings! { "email" => "a@x.com", "age" => 30 };
/// assert_eq!(vars.len(), 2);
/// ```
#[macro_export]
macro_rules! bindings {
    () => {
        $crate::core::Bindings::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::core::Bindings::new();
        $( map.insert(($key).to_string(), ::serde_json::json!($value)); )+
        map
    }};
}
