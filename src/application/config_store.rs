use serde_json::Value;

/// Read access to the hierarchical configuration.
///
/// Keys are dot-separated paths such as `connections.prod.serviceURL`.
#[cfg_attr(test, mockall::automock)]
pub trait ConfigStore {
    fn get(&self, key: &str) -> Option<Value>;

    fn is_set(&self, key: &str) -> bool;
}

/// Typed lookups layered over [`ConfigStore::get`]. Absent or mistyped values
/// come back empty rather than as errors.
pub trait ConfigStoreExt: ConfigStore {
    fn get_string(&self, key: &str) -> String {
        self.get(key).map(scalar_to_string).unwrap_or_default()
    }

    fn get_bool(&self, key: &str) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => b,
            Some(Value::String(s)) => {
                matches!(s.to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on")
            }
            Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
            _ => false,
        }
    }
}

impl<T: ConfigStore + ?Sized> ConfigStoreExt for T {}

pub(crate) fn scalar_to_string(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use serde_json::json;

    #[test]
    fn typed_lookups_convert_values() {
        let mut store = MockConfigStore::new();
        store
            .expect_get()
            .with(eq("name"))
            .returning(|_| Some(json!("prod")));
        store
            .expect_get()
            .with(eq("port"))
            .returning(|_| Some(json!(8080)));
        store
            .expect_get()
            .with(eq("debug"))
            .returning(|_| Some(json!("true")));
        store
            .expect_get()
            .withf(|key| !["name", "port", "debug"].contains(&key))
            .returning(|_| None);

        assert_eq!(store.get_string("name"), "prod");
        assert_eq!(store.get_string("port"), "8080");
        assert!(store.get_bool("debug"));
        assert!(!store.get_bool("missing"));
        assert_eq!(store.get_string("missing"), "");
    }
}
