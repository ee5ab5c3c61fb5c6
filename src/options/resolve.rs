//! Option layer merging, classification and name translation.

use super::{Opt, OptionMap, OptionSet, OptionValue};
use crate::error::{ClientError, Result};
use serde_json::Value;

/// Merge option layers; later layers win on identical keys.
pub fn resolve(layers: &[&OptionMap]) -> OptionMap {
    let mut merged = OptionMap::new();
    for layer in layers {
        merged.merge_from(layer);
    }
    merged
}

/// Merge the three standard layers: `one_time > persistent > defaults`.
pub fn resolve_layers(defaults: &OptionMap, persistent: &OptionMap, one_time: &OptionMap) -> OptionMap {
    resolve(&[defaults, persistent, one_time])
}

/// Whether changing `opt` invalidates a cached transport.
#[inline]
pub fn affects_transport(opt: Opt) -> bool {
    OptionSet::TRANSPORT.contains(opt)
}

/// Whether changing `opt` invalidates a cached cookie jar.
#[inline]
pub fn affects_jar(opt: Opt) -> bool {
    OptionSet::JAR.contains(opt)
}

/// Translate a loose option name (`"timeout"`, `"connecttimeout_ms"`,
/// `"OPT_PROXY"`) to an option.
pub fn lookup_name(name: &str) -> Option<Opt> {
    let upper = name.trim().to_uppercase();
    if upper.starts_with("OPT_") {
        Opt::from_name(&upper)
    } else {
        Opt::from_name(&format!("OPT_{upper}"))
    }
}

/// Convert a string-keyed option map to the canonical form.
///
/// Unrecognized names are dropped so configuration files may carry keys this
/// client does not know about.
pub fn options_from_names<I, K, V>(options: I) -> OptionMap
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<OptionValue>,
{
    let mut map = OptionMap::new();
    for (name, value) in options {
        match lookup_name(name.as_ref()) {
            Some(opt) => {
                map.set(opt, value);
            }
            None => tracing::debug!(name = name.as_ref(), "dropping unknown option"),
        }
    }
    map
}

/// Like [`options_from_names`], but an unrecognized name is an error.
pub fn strict_options_from_names<I, K, V>(options: I) -> Result<OptionMap>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<OptionValue>,
{
    let mut map = OptionMap::new();
    for (name, value) in options {
        let opt = lookup_name(name.as_ref())
            .ok_or_else(|| ClientError::UnknownOption(name.as_ref().to_string()))?;
        map.set(opt, value);
    }
    Ok(map)
}

/// Convert a JSON object (`{"timeout": 5, "proxy": "host:3128"}`) to an option
/// map. Unknown names and values that are not bools, integers or strings are
/// dropped.
pub fn options_from_json(object: &serde_json::Map<String, Value>) -> OptionMap {
    let values = object.iter().filter_map(|(name, value)| {
        let value = match value {
            Value::Bool(b) => OptionValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(n) => OptionValue::Int(n),
                None => {
                    tracing::debug!(name = name.as_str(), "dropping non-integer option value");
                    return None;
                }
            },
            Value::String(s) => OptionValue::Str(s.clone()),
            _ => {
                tracing::debug!(name = name.as_str(), "dropping option with unsupported JSON type");
                return None;
            }
        };
        Some((name, value))
    });
    options_from_names(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_precedence() {
        let defaults = OptionMap::new()
            .with(Opt::Timeout, 1)
            .with(Opt::MaxRedirs, 10)
            .with(Opt::UserAgent, "default");
        let persistent = OptionMap::new().with(Opt::Timeout, 2).with(Opt::MaxRedirs, 20);
        let one_time = OptionMap::new().with(Opt::Timeout, 3);

        let merged = resolve_layers(&defaults, &persistent, &one_time);
        assert_eq!(merged.get(Opt::Timeout).and_then(|v| v.as_int()), Some(3));
        assert_eq!(merged.get(Opt::MaxRedirs).and_then(|v| v.as_int()), Some(20));
        assert_eq!(merged.get(Opt::UserAgent).and_then(|v| v.as_str()), Some("default"));
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn test_resolve_empty_layers() {
        let empty = OptionMap::new();
        assert!(resolve_layers(&empty, &empty, &empty).is_empty());
        assert!(resolve(&[]).is_empty());
    }

    #[test]
    fn test_classification() {
        assert!(affects_transport(Opt::Proxy));
        assert!(affects_transport(Opt::ConnectTimeout));
        assert!(!affects_transport(Opt::Referer));
        assert!(!affects_transport(Opt::UserAgent));
        assert!(!affects_transport(Opt::RedirectPolicy));
        assert!(affects_jar(Opt::CookieJar));
        assert!(!affects_jar(Opt::Timeout));
    }

    #[test]
    fn test_lookup_name() {
        assert_eq!(lookup_name("timeout"), Some(Opt::Timeout));
        assert_eq!(lookup_name("connecttimeout_ms"), Some(Opt::ConnectTimeoutMs));
        assert_eq!(lookup_name("OPT_PROXY"), Some(Opt::Proxy));
        assert_eq!(lookup_name("time"), None);
    }

    #[test]
    fn test_options_from_names_drops_unknown() {
        let map = options_from_names([("timeout", OptionValue::Int(5)), ("bogus", OptionValue::Int(1))]);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(Opt::Timeout).and_then(|v| v.as_int()), Some(5));
    }

    #[test]
    fn test_strict_options_rejects_unknown() {
        let err = strict_options_from_names([("bogus", 1)]).unwrap_err();
        assert!(matches!(err, ClientError::UnknownOption(name) if name == "bogus"));

        let map = strict_options_from_names([("maxredirs", 3)]).unwrap();
        assert_eq!(map.get(Opt::MaxRedirs).and_then(|v| v.as_int()), Some(3));
    }

    #[test]
    fn test_options_from_json() {
        let value = json!({
            "timeout": 5,
            "followlocation": false,
            "proxy": "127.0.0.1:3128",
            "unknown": 1,
            "referer": ["not", "a", "string"],
        });
        let map = options_from_json(value.as_object().unwrap());
        assert_eq!(map.len(), 3);
        assert_eq!(map.get(Opt::FollowLocation).and_then(|v| v.as_bool()), Some(false));
        assert_eq!(map.get(Opt::Proxy).and_then(|v| v.as_str()), Some("127.0.0.1:3128"));
    }
}
