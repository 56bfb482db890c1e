//! Parsing of `terraform output -json <name>` and `terraform state list`.

use serde_json::Value;

use super::TerraformError;

/// Converts the JSON printed for a single output into a plain string.
///
/// Strings are returned verbatim; lists, maps, numbers, and booleans are
/// returned as compact JSON so callers can decide how to interpret them.
pub(super) fn parse_output(name: &str, stdout: &str) -> Result<String, TerraformError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Err(empty(name));
    }

    let value = serde_json::from_str::<Value>(trimmed).map_err(|err| TerraformError::Parse {
        name: name.to_owned(),
        message: err.to_string(),
    })?;

    let rendered = match value {
        Value::Null => return Err(empty(name)),
        Value::String(text) => text,
        other => other.to_string(),
    };

    if rendered.trim().is_empty() {
        return Err(empty(name));
    }
    Ok(rendered)
}

/// Splits `terraform state list` output into resource addresses.
pub(super) fn parse_state_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

fn empty(name: &str) -> TerraformError {
    TerraformError::EmptyOutput {
        name: name.to_owned(),
    }
}
