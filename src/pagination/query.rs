//! Query string building for resource paths

use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use url::form_urlencoded;

/// Replace the query of `path` with one encoded from `opts`
///
/// `opts` must serialize to a flat object. Null and empty-string fields are
/// skipped, arrays repeat the key, and keys are emitted in sorted order.
pub fn add_options<O: Serialize + ?Sized>(path: &str, opts: &O) -> Result<String> {
    let Value::Object(map) = serde_json::to_value(opts)? else {
        return Err(Error::options("query options must serialize to an object"));
    };

    let mut pairs: Vec<(String, String)> = Vec::with_capacity(map.len());
    for (key, value) in map {
        match value {
            Value::Array(items) => {
                for item in items {
                    if let Some(v) = scalar(&key, item)? {
                        pairs.push((key.clone(), v));
                    }
                }
            }
            other => {
                if let Some(v) = scalar(&key, other)? {
                    pairs.push((key, v));
                }
            }
        }
    }
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    let base = path.split_once('?').map_or(path, |(base, _)| base);
    if pairs.is_empty() {
        return Ok(base.to_string());
    }

    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    Ok(format!("{base}?{query}"))
}

fn scalar(key: &str, value: Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Array(_) | Value::Object(_) => Err(Error::options(format!(
            "query option '{key}' must be a scalar"
        ))),
    }
}
