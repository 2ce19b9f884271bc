// JSON documents on disk: configuration files read for `configure`/`launch`
// and responses written for `getinfo`/`getconfig`/`monitor`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{CgError, Result};

/// What counts as an unusable configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigPolicy {
    /// Reject only an empty file, invalid JSON or `null`.
    #[default]
    Lenient,
    /// Also reject `{}`, `[]`, `""`, `0` and `false`.
    Strict,
}

impl ConfigPolicy {
    fn rejects(self, value: &Value) -> bool {
        match self {
            ConfigPolicy::Lenient => value.is_null(),
            ConfigPolicy::Strict => is_falsy(value),
        }
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// A configuration document that passed the policy check.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument(Value);

impl ConfigDocument {
    pub fn from_value(value: Value, policy: ConfigPolicy) -> Result<Self> {
        if policy.rejects(&value) {
            return Err(CgError::invalid_config(
                None,
                format!("empty configuration ({value})"),
            ));
        }
        Ok(ConfigDocument(value))
    }

    pub fn parse(text: &str, policy: ConfigPolicy) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(CgError::invalid_config(None, "file is empty"));
        }
        let value: Value = serde_json::from_str(text)
            .map_err(|e| CgError::invalid_config(None, format!("not valid JSON: {e}")))?;
        Self::from_value(value, policy)
    }

    pub fn load(path: &Path, policy: ConfigPolicy) -> Result<Self> {
        debug!("config file: \"{}\"", path.display());
        if !path.is_file() {
            return Err(CgError::invalid_config(
                Some(path.to_path_buf()),
                "file doesn't exist",
            ));
        }
        let text = fs::read_to_string(path).map_err(|e| CgError::io(path, e))?;
        Self::parse(&text, policy).map_err(|e| match e {
            CgError::InvalidConfig { reason, .. } => {
                CgError::invalid_config(Some(path.to_path_buf()), reason)
            }
            other => other,
        })
    }

    #[cfg(test)]
    pub(crate) fn value(&self) -> &Value {
        &self.0
    }

    /// Compact JSON, as sent in request parameters.
    pub fn to_compact(&self) -> String {
        self.0.to_string()
    }
}

/// Serialize with 4-space indentation, plus a trailing newline.
pub fn to_pretty_string(value: &Value) -> Result<String> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value
        .serialize(&mut ser)
        .map_err(|e| CgError::malformed(format!("cannot serialize response: {e}")))?;
    let mut out = String::from_utf8(buf)
        .map_err(|e| CgError::malformed(format!("cannot serialize response: {e}")))?;
    out.push('\n');
    Ok(out)
}

pub fn write_json(path: &Path, value: &Value) -> Result<()> {
    let text = to_pretty_string(value)?;
    fs::write(path, text).map_err(|e| CgError::io(path, e))?;
    info!("response written to \"{}\"", path.display());
    Ok(())
}

pub fn read_json(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).map_err(|e| CgError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| {
        CgError::invalid_config(Some(path.to_path_buf()), format!("not valid JSON: {e}"))
    })
}

/// Where to write a response: the explicit path, else `default` as long as
/// nothing is there yet.
pub fn output_path(explicit: Option<&Path>, default: &str) -> Result<PathBuf> {
    if let Some(p) = explicit {
        return Ok(p.to_path_buf());
    }
    let p = PathBuf::from(default);
    if p.exists() {
        return Err(CgError::InvalidArgument(format!(
            "no destination file specified and \"{default}\" already exists"
        )));
    }
    Ok(p)
}
