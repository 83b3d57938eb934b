use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt;

/// A request parameter value in its wire form.
///
/// Numbers are rendered as plain decimals (never scientific notation) and
/// keep exactly the digits the value carries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamValue(String);

impl ParamValue {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self(value.clone())
    }
}

impl From<Decimal> for ParamValue {
    fn from(value: Decimal) -> Self {
        Self(value.to_string())
    }
}

impl From<f64> for ParamValue {
    // `Display` for f64 prints the shortest round-trip form without an exponent.
    fn from(value: f64) -> Self {
        Self(value.to_string())
    }
}

macro_rules! impl_param_value_for_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for ParamValue {
                fn from(value: $t) -> Self {
                    Self(value.to_string())
                }
            }
        )*
    };
}

impl_param_value_for_int!(i32, i64, u32, u64, usize);

/// Unordered request parameters, serialized in ascending byte order of key.
///
/// Inserting a key twice keeps the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    entries: BTreeMap<String, ParamValue>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> &mut Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert only when `value` is present
    pub fn with_opt<V: Into<ParamValue>>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with(key, value),
            None => self,
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `k1=v1&k2=v2...` with keys ascending; values are not URL-escaped.
    ///
    /// The venue signs raw values, so any escaping must happen after signing.
    pub fn canonical_string(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K, V> FromIterator<(K, V)> for RequestParams
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

/// Canonical query string for a borrowed parameter list
pub fn canonicalize(params: &[(&str, &str)]) -> String {
    params.iter().copied().collect::<RequestParams>().canonical_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_empty_params_yield_empty_string() {
        assert_eq!(RequestParams::new().canonical_string(), "");
        assert_eq!(canonicalize(&[]), "");
    }

    #[test]
    fn test_keys_sorted_regardless_of_insertion_order() {
        let forward = canonicalize(&[("symbol", "BTRUSDT"), ("side", "BUY"), ("price", "1.23")]);
        let reverse = canonicalize(&[("price", "1.23"), ("side", "BUY"), ("symbol", "BTRUSDT")]);

        assert_eq!(forward, "price=1.23&side=BUY&symbol=BTRUSDT");
        assert_eq!(forward, reverse);
    }

    #[test]
    fn test_keys_compare_bytewise() {
        // Uppercase sorts before lowercase in byte order
        let canonical = canonicalize(&[("b", "1"), ("B", "2"), ("a", "3"), ("aa", "4")]);
        assert_eq!(canonical, "B=2&a=3&aa=4&b=1");
    }

    #[test]
    fn test_values_are_not_escaped() {
        let canonical = canonicalize(&[("note", "a b&c"), ("id", "x/y")]);
        assert_eq!(canonical, "id=x/y&note=a b&c");
    }

    #[test]
    fn test_numeric_values_render_plain() {
        let params = RequestParams::new()
            .with("small", 0.000_000_1_f64)
            .with("big", 12_345_678_901_u64)
            .with("dec", Decimal::from_str("1.2300").unwrap())
            .with("neg", -5_i64);

        assert_eq!(params.get("small").unwrap().as_str(), "0.0000001");
        assert_eq!(params.get("big").unwrap().as_str(), "12345678901");
        assert_eq!(params.get("dec").unwrap().as_str(), "1.2300");
        assert_eq!(params.get("neg").unwrap().as_str(), "-5");
    }

    #[test]
    fn test_duplicate_key_keeps_last_value() {
        let params: RequestParams = vec![("symbol", "A"), ("symbol", "B")].into_iter().collect();
        assert_eq!(params.len(), 1);
        assert_eq!(params.canonical_string(), "symbol=B");
    }

    #[test]
    fn test_with_opt_skips_missing() {
        let params = RequestParams::new()
            .with("symbol", "BTRUSDT")
            .with_opt("orderId", None::<u64>)
            .with_opt("limit", Some(5_u32));
        assert_eq!(params.canonical_string(), "limit=5&symbol=BTRUSDT");
    }
}
