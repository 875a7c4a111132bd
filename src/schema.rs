//! Normalization of interface schemas across build-tool revisions.

use semver::Version;
use serde_json::Value;

/// Build tools older than this did not tag array outputs, so an array-typed
/// `Output` from one of them has to be assumed to be an iterator.
const ARRAY_TYPE_INTRODUCED: Version = Version::new(0, 3, 9);

/// Patch schemas produced by old build-tool versions so that callers can
/// always rely on `components.schemas.Output` carrying its `type` and
/// `x-cog-array-type` markers. Schemas from modern build tools (and from
/// version strings that do not parse, such as `"0.1"`) pass through
/// untouched.
pub fn make_schema_backwards_compatible(mut schema: Value, cog_version: &str) -> Value {
    if !version_predates_array_type(cog_version) {
        return schema;
    }

    if let Some(output) = schema.pointer_mut("/components/schemas/Output") {
        let is_array = output.get("type").and_then(Value::as_str) == Some("array");
        if is_array {
            if let Some(fields) = output.as_object_mut() {
                fields.insert(
                    "x-cog-array-type".to_owned(),
                    Value::String("iterator".to_owned()),
                );
            }
        }
    }

    schema
}

fn version_predates_array_type(cog_version: &str) -> bool {
    match Version::parse(cog_version) {
        Ok(version) => version < ARRAY_TYPE_INTRODUCED,
        Err(_) => false,
    }
}

/// Whether a normalized schema declares a streamed, incrementally-consumed
/// output.
pub fn output_is_iterator(schema: &Value) -> bool {
    let output = match schema.pointer("/components/schemas/Output") {
        Some(output) => output,
        None => return false,
    };

    output.get("type").and_then(Value::as_str) == Some("array")
        && output.get("x-cog-array-type").and_then(Value::as_str) == Some("iterator")
}
