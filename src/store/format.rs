/*!
 * On-disk encodings for per-scope catalog files.
 *
 * Both encodings hold a flat key -> value mapping with keys in sorted order,
 * so rewriting an unchanged catalog produces a byte-identical file.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use super::Snapshot;

/// Anchored matcher for one `'key' => 'value',` entry of a code-array body
static ARRAY_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^\s*(?:'((?:[^'\\]|\\.)*)'|(-?\d+))\s*=>\s*'((?:[^'\\]|\\.)*)'\s*(?:,|$)"#,
    )
    .expect("Invalid array entry regex")
});

/// Header and footer around the array literal
static ARRAY_ENVELOPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)^\s*<\?php\s+return\s*(?:\[(.*)\]|array\s*\((.*)\))\s*;\s*$"#)
        .expect("Invalid array envelope regex")
});

/// Serialization format of a file store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreFormat {
    /// Pretty-printed JSON object, unescaped unicode
    Json,
    /// Source file returning a keyed array literal
    CodeArray {
        /// File extension, without the dot
        extension: String,
    },
}

impl StoreFormat {
    pub fn extension(&self) -> &str {
        match self {
            Self::Json => "json",
            Self::CodeArray { extension } => extension,
        }
    }

    /// Short name used in log lines
    pub fn name(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::CodeArray { .. } => "code_array",
        }
    }

    /// Encode a snapshot into a file body
    pub fn encode(&self, snapshot: &Snapshot) -> Result<String, String> {
        match self {
            Self::Json => {
                let mut body = serde_json::to_string_pretty(snapshot).map_err(|e| e.to_string())?;
                body.push('\n');
                Ok(body)
            }
            Self::CodeArray { .. } => Ok(encode_code_array(snapshot)),
        }
    }

    /// Decode a file body into a snapshot
    ///
    /// A blank body decodes to an empty snapshot.
    pub fn decode(&self, body: &str) -> Result<Snapshot, String> {
        if body.trim().is_empty() {
            return Ok(Snapshot::new());
        }

        match self {
            Self::Json => decode_json(body),
            Self::CodeArray { .. } => decode_code_array(body),
        }
    }
}

fn decode_json(body: &str) -> Result<Snapshot, String> {
    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| e.to_string())?;

    let object = match value {
        serde_json::Value::Object(object) => object,
        // `[]` is what an empty PHP array serializes to
        serde_json::Value::Array(items) if items.is_empty() => return Ok(Snapshot::new()),
        other => return Err(format!("expected a JSON object, found {}", json_kind(&other))),
    };

    let mut snapshot = Snapshot::new();
    for (key, value) in object {
        let text = match value {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            other => {
                return Err(format!("value for '{}' is a {}, not a string", key, json_kind(&other)));
            }
        };
        snapshot.insert(key, text);
    }

    Ok(snapshot)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn encode_code_array(snapshot: &Snapshot) -> String {
    let mut body = String::from("<?php\n\nreturn [\n");
    for (key, value) in snapshot {
        body.push_str("  '");
        body.push_str(&escape_single_quoted(key));
        body.push_str("' => '");
        body.push_str(&escape_single_quoted(value));
        body.push_str("',\n");
    }
    body.push_str("];\n");
    body
}

fn decode_code_array(body: &str) -> Result<Snapshot, String> {
    let captures = ARRAY_ENVELOPE
        .captures(body)
        .ok_or_else(|| "expected '<?php return [...];'".to_string())?;

    let mut rest = captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|m| m.as_str())
        .unwrap_or_default();

    let mut snapshot = Snapshot::new();
    while !rest.trim().is_empty() {
        let entry = ARRAY_ENTRY
            .captures(rest)
            .ok_or_else(|| format!("unexpected array entry near '{}'", preview(rest)))?;

        let key = match (entry.get(1), entry.get(2)) {
            (Some(quoted), _) => unescape_single_quoted(quoted.as_str()),
            (None, Some(number)) => number.as_str().to_string(),
            (None, None) => return Err("array entry without a key".to_string()),
        };
        let value = entry.get(3).map(|m| unescape_single_quoted(m.as_str())).unwrap_or_default();
        snapshot.insert(key, value);

        let consumed = entry.get(0).map(|m| m.end()).unwrap_or(rest.len());
        rest = &rest[consumed..];
    }

    Ok(snapshot)
}

fn escape_single_quoted(text: &str) -> String {
    text.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Single-quoted literals only recognise `\\` and `\'`
fn unescape_single_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some('\\') | Some('\'') => {
                    if let Some(next) = chars.next() {
                        out.push(next);
                    }
                    continue;
                }
                _ => {}
            }
        }
        out.push(c);
    }

    out
}

fn preview(text: &str) -> String {
    text.trim_start().chars().take(24).collect()
}
