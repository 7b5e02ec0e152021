//! Typed parameter lists: JSON Schema rendering and argument validation.

use chrono::NaiveDate;
use serde_json::{json, Map, Value};
use url::Url;

use super::ToolError;

/// Expected shape of a single argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Non-blank string
    String,
    /// Integer no smaller than `minimum`
    Integer { minimum: i64 },
    /// Calendar date, `YYYY-MM-DD`
    Date,
    /// Absolute `http` or `https` URL
    Url,
}

/// One parameter of a tool
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub description: &'static str,
    pub required: bool,
    pub default: Option<Value>,
}

impl ParamSpec {
    pub fn required(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            required: true,
            default: None,
        }
    }

    pub fn optional(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }

    /// Advertise a default value in the schema
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// JSON Schema of this parameter
    pub fn schema(&self) -> Value {
        let mut schema = match self.kind {
            ParamKind::String => json!({ "type": "string", "minLength": 1 }),
            ParamKind::Integer { minimum } => json!({ "type": "integer", "minimum": minimum }),
            ParamKind::Date => json!({
                "type": "string",
                "format": "date",
                "pattern": "^\\d{4}-\\d{2}-\\d{2}$"
            }),
            ParamKind::Url => json!({ "type": "string", "format": "uri" }),
        };

        if let Value::Object(map) = &mut schema {
            map.insert("description".into(), Value::from(self.description));
            if let Some(default) = &self.default {
                map.insert("default".into(), default.clone());
            }
        }
        schema
    }

    fn check(&self, value: &Value) -> Result<(), String> {
        match self.kind {
            ParamKind::String => {
                let text = value
                    .as_str()
                    .ok_or_else(|| format!("`{}` must be a string", self.name))?;
                if text.trim().is_empty() {
                    return Err(format!("`{}` must not be blank", self.name));
                }
            }
            ParamKind::Integer { minimum } => {
                let number = value
                    .as_i64()
                    .ok_or_else(|| format!("`{}` must be an integer", self.name))?;
                if number < minimum {
                    return Err(format!(
                        "`{}` must be at least {}, got {}",
                        self.name, minimum, number
                    ));
                }
            }
            ParamKind::Date => {
                parse_date(self.name, value)?;
            }
            ParamKind::Url => {
                let raw = value
                    .as_str()
                    .ok_or_else(|| format!("`{}` must be a string", self.name))?;
                let url = Url::parse(raw.trim())
                    .map_err(|e| format!("`{}` is not a valid URL: {}", self.name, e))?;
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(format!(
                        "`{}` must use http or https, got {}",
                        self.name,
                        url.scheme()
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Parse a `YYYY-MM-DD` argument
pub fn parse_date(name: &str, value: &Value) -> Result<NaiveDate, String> {
    let raw = value
        .as_str()
        .ok_or_else(|| format!("`{}` must be a date string", name))?;
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| format!("`{}` must be a date in YYYY-MM-DD form, got {:?}", name, raw))
}

/// JSON Schema object for a whole parameter list
pub fn object_schema(params: &[ParamSpec]) -> Value {
    let properties: Map<String, Value> = params
        .iter()
        .map(|p| (p.name.to_string(), p.schema()))
        .collect();
    let required: Vec<&str> = params.iter().filter(|p| p.required).map(|p| p.name).collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Check `arguments` against `params`.
///
/// Explicit `null` counts as absent. Fields not named in `params` are
/// ignored.
pub fn validate_arguments(
    tool: &str,
    params: &[ParamSpec],
    arguments: &Value,
) -> Result<(), ToolError> {
    let object = arguments.as_object().ok_or_else(|| {
        ToolError::InvalidArguments(format!("{}: arguments must be a JSON object", tool))
    })?;

    for param in params {
        match object.get(param.name) {
            None | Some(Value::Null) => {
                if param.required {
                    return Err(ToolError::InvalidArguments(format!(
                        "{}: missing required field `{}`",
                        tool, param.name
                    )));
                }
            }
            Some(value) => param
                .check(value)
                .map_err(|msg| ToolError::InvalidArguments(format!("{}: {}", tool, msg)))?,
        }
    }

    for key in object.keys() {
        if !params.iter().any(|p| p.name == key.as_str()) {
            tracing::debug!(tool, field = %key, "ignoring unknown argument");
        }
    }

    check_date_order(tool, params, object)
}

/// `start_date` must not follow `end_date`, for tools that declare both
fn check_date_order(
    tool: &str,
    params: &[ParamSpec],
    object: &Map<String, Value>,
) -> Result<(), ToolError> {
    let declares = |name: &str| params.iter().any(|p| p.name == name);
    if !(declares("start_date") && declares("end_date")) {
        return Ok(());
    }

    let date = |name: &str| {
        object
            .get(name)
            .filter(|v| !v.is_null())
            .and_then(|v| parse_date(name, v).ok())
    };

    if let (Some(start), Some(end)) = (date("start_date"), date("end_date")) {
        if start > end {
            return Err(ToolError::InvalidArguments(format!(
                "{}: start_date {} is after end_date {}",
                tool, start, end
            )));
        }
    }
    Ok(())
}
