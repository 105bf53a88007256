//! The format library: maps a format name to a predicate over string/number
//! instances. Ships a table of Draft-4-era built-ins (plus a handful of
//! Swagger-style numeric formats) and lets callers register or remove
//! entries through [`crate::config::Configuration`].
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::{fmt, net::Ipv6Addr, str::FromStr, sync::Arc};

/// A format predicate. Receives the raw instance; implementations that only
/// make sense for one JSON kind (e.g. `date` only applies to strings) should
/// return `true` for any other kind, leaving kind mismatches to the `type`
/// keyword.
pub type FormatPredicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// The installed name → predicate mapping consulted by the `format` keyword.
#[derive(Clone)]
pub struct FormatTable {
    entries: ahash::AHashMap<String, FormatPredicate>,
}

impl fmt::Debug for FormatTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatTable")
            .field("names", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FormatTable {
    /// An empty table: every `format` keyword is treated as unknown.
    #[must_use]
    pub fn empty() -> Self {
        FormatTable {
            entries: ahash::AHashMap::new(),
        }
    }

    /// The built-in Draft-4 format table, including the `hostname` and `ipv6`
    /// entries (which a caller may remove via [`FormatTable::remove`] to
    /// simulate "no such library is available", per the spec's optionality
    /// note on those two).
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut table = Self::empty();
        table.insert("byte", is_byte);
        table.insert("date", is_date);
        table.insert("date-time", is_date_time);
        table.insert("email", is_email);
        table.insert("hostname", is_hostname);
        table.insert("ipv4", is_ipv4);
        table.insert("ipv6", is_ipv6);
        table.insert("uri", is_uri);
        table.insert("int32", is_int32);
        table.insert("int64", is_int64);
        table.insert("float", is_any_number);
        table.insert("double", is_any_number);
        table
    }

    /// Register or replace the predicate for `name`.
    pub fn insert(&mut self, name: impl Into<String>, predicate: impl Fn(&Value) -> bool + Send + Sync + 'static) {
        self.entries.insert(name.into(), Arc::new(predicate));
    }

    /// Remove `name` from the table, simulating the absence of the library
    /// backing it.
    pub fn remove(&mut self, name: &str) {
        self.entries.remove(name);
    }

    #[must_use]
    pub(crate) fn get(&self, name: &str) -> Option<&FormatPredicate> {
        self.entries.get(name)
    }
}

impl Default for FormatTable {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn as_str(instance: &Value) -> Option<&str> {
    instance.as_str()
}

static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"));
static DATE_TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}[Tt]\d{2}:\d{2}:\d{2}(\.\d+)?([Zz]|[+-]\d{2}:\d{2})$")
        .expect("valid regex")
});
static URI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+:(/?/?))?[^#\\\s]*(#[^\\\s]*)?$").expect("valid regex"));

fn is_byte(instance: &Value) -> bool {
    use base64::Engine as _;
    match as_str(instance) {
        Some(s) => {
            let standard = base64::engine::general_purpose::STANDARD;
            let no_pad = base64::engine::general_purpose::STANDARD_NO_PAD;
            standard.decode(s).is_ok() || no_pad.decode(s).is_ok()
        }
        None => true,
    }
}

fn is_date(instance: &Value) -> bool {
    match as_str(instance) {
        Some(s) => DATE_RE.is_match(s) && day_in_month_range(s),
        None => true,
    }
}

fn day_in_month_range(s: &str) -> bool {
    let parts: Vec<&str> = s.split('-').collect();
    if parts.len() != 3 {
        return false;
    }
    let month: u32 = match parts[1].parse() {
        Ok(m) => m,
        Err(_) => return false,
    };
    let day: u32 = match parts[2].parse() {
        Ok(d) => d,
        Err(_) => return false,
    };
    (1..=12).contains(&month) && (1..=31).contains(&day)
}

fn is_date_time(instance: &Value) -> bool {
    match as_str(instance) {
        Some(s) => DATE_TIME_RE.is_match(s),
        None => true,
    }
}

fn is_email(instance: &Value) -> bool {
    match as_str(instance) {
        Some(s) => s.parse::<email_address::EmailAddress>().is_ok(),
        None => true,
    }
}

fn is_hostname(instance: &Value) -> bool {
    match as_str(instance) {
        Some(s) => !s.is_empty() && s.len() <= 255 && idna::domain_to_ascii(s).is_ok(),
        None => true,
    }
}

fn is_ipv4(instance: &Value) -> bool {
    match as_str(instance) {
        Some(s) => {
            let parts: Vec<&str> = s.split('.').collect();
            parts.len() == 4
                && parts.iter().all(|part| {
                    !part.is_empty()
                        && part.chars().all(|c| c.is_ascii_digit())
                        && (part == &"0" || !part.starts_with('0'))
                        && part.parse::<u16>().map(|n| n <= 255).unwrap_or(false)
                })
        }
        None => true,
    }
}

fn is_ipv6(instance: &Value) -> bool {
    match as_str(instance) {
        Some(s) => Ipv6Addr::from_str(s).is_ok(),
        None => true,
    }
}

fn is_uri(instance: &Value) -> bool {
    match as_str(instance) {
        Some(s) => URI_RE.is_match(s) && percent_encoding::percent_decode_str(s).decode_utf8().is_ok(),
        None => true,
    }
}

fn is_int32(instance: &Value) -> bool {
    match instance.as_i64() {
        Some(n) => i32::try_from(n).is_ok(),
        None => !instance.is_number(),
    }
}

fn is_int64(instance: &Value) -> bool {
    #[cfg(target_pointer_width = "32")]
    {
        let _ = instance;
        true
    }
    #[cfg(not(target_pointer_width = "32"))]
    {
        match instance.as_i64() {
            Some(_) => true,
            None => !instance.is_number(),
        }
    }
}

fn is_any_number(instance: &Value) -> bool {
    let _ = instance;
    true
}

#[cfg(test)]
mod tests {
    use super::FormatTable;
    use serde_json::json;

    fn check(format: &str, instance: &Value) -> bool {
        FormatTable::with_builtins().get(format).unwrap()(instance)
    }
    use serde_json::Value;

    #[test]
    fn email_format() {
        assert!(check("email", &json!("user@example.com")));
        assert!(!check("email", &json!("not-an-email")));
    }

    #[test]
    fn ipv4_rejects_leading_zeroes() {
        assert!(check("ipv4", &json!("127.0.0.1")));
        assert!(!check("ipv4", &json!("127.0.0.01")));
        assert!(!check("ipv4", &json!("256.0.0.1")));
    }

    #[test]
    fn date_requires_shape() {
        assert!(check("date", &json!("2021-01-30")));
        assert!(!check("date", &json!("2021-13-01")));
        assert!(!check("date", &json!("01-30-2021")));
    }

    #[test]
    fn date_time_accepts_offset_and_zulu() {
        assert!(check("date-time", &json!("2021-01-30T10:00:00Z")));
        assert!(check("date-time", &json!("2021-01-30T10:00:00.123+02:00")));
        assert!(!check("date-time", &json!("2021-01-30 10:00:00")));
    }

    #[test]
    fn non_string_is_left_to_the_type_keyword() {
        assert!(check("email", &json!(42)));
    }

    #[test]
    fn removing_an_entry_simulates_absent_library() {
        let mut table = FormatTable::with_builtins();
        table.remove("hostname");
        assert!(table.get("hostname").is_none());
    }
}
