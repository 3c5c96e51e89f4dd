//! Lookup paths into JSON payloads.
//!
//! Grammar: an optional leading `$`, then any number of segments, each either
//! `.key`, `[n]` (array index) or a quoted key `['k']` / `["k"]` for keys that
//! contain dots or brackets. Without `$`, the first key may be written bare
//! (`test.strategy`). Parsing or resolution failures yield `None`, never an
//! error, and resolved scalars are compared by their string form.

use serde_json::Value;

/// One step of a parsed lookup path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Object member access (`.name` or `['name']`).
    Key(String),
    /// Array element access (`[3]`).
    Index(usize),
}

/// Parse a lookup path such as `$.test.strategy`, `items[0].name` or `$['a.b']`.
///
/// The leading `$` is optional, as is the dot before the first key. An empty
/// path (or a bare `$`) addresses the whole document. Returns `None` when the
/// path is malformed.
pub fn parse_path(path: &str) -> Option<Vec<Segment>> {
    let path = path.trim();
    let (rooted, rest) = match path.strip_prefix('$') {
        Some(rest) => (true, rest),
        None => (false, path),
    };
    let chars: Vec<char> = rest.chars().collect();
    let mut segments = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '.' => {
                let (key, next) = read_key(&chars, i + 1)?;
                segments.push(Segment::Key(key));
                i = next;
            }
            '[' => {
                let close = chars[i + 1..].iter().position(|c| *c == ']')? + i + 1;
                let inner: String = chars[i + 1..close].iter().collect();
                segments.push(parse_bracket(inner.trim())?);
                i = close + 1;
            }
            // A bare key is only valid at the very start (`test.strategy`).
            _ if i == 0 && !rooted => {
                let (key, next) = read_key(&chars, 0)?;
                segments.push(Segment::Key(key));
                i = next;
            }
            _ => return None,
        }
    }

    Some(segments)
}

fn read_key(chars: &[char], start: usize) -> Option<(String, usize)> {
    let mut end = start;
    while end < chars.len() && !matches!(chars[end], '.' | '[' | ']') {
        end += 1;
    }
    if end == start {
        return None;
    }
    Some((chars[start..end].iter().collect(), end))
}

fn parse_bracket(inner: &str) -> Option<Segment> {
    let quoted = inner
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| inner.strip_prefix('"').and_then(|s| s.strip_suffix('"')));
    if let Some(key) = quoted {
        return Some(Segment::Key(key.to_string()));
    }
    if inner.is_empty() || !inner.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    inner.parse().ok().map(Segment::Index)
}

/// Walk `value` along `segments`. Missing members, out-of-range indices and
/// type mismatches all yield `None`.
pub fn resolve<'a>(value: &'a Value, segments: &[Segment]) -> Option<&'a Value> {
    segments.iter().try_fold(value, |current, seg| match (seg, current) {
        (Segment::Key(k), Value::Object(map)) => map.get(k),
        (Segment::Index(i), Value::Array(items)) => items.get(*i),
        _ => None,
    })
}

/// Parse `path` and resolve it against `value` in one step.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let segments = parse_path(path)?;
    resolve(value, &segments)
}

/// Render a JSON value for string comparison:
/// - Strings are returned as-is.
/// - Numbers/bools/null are rendered via to_string().
/// - Arrays/objects are serialized as compact JSON.
pub fn value_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
