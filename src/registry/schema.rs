//! JSON Schema contract for registry documents.
//!
//! The YAML registry is converted to JSON by the restricted parser and then
//! checked against `schema/registry.schema.json`, which is compiled into the
//! binary so the contract cannot drift from the code that consumes it.

use crate::error::RegistryError;
use jsonschema::JSONSchema;
use serde_json::Value;
use std::path::Path;

const REGISTRY_SCHEMA: &str = include_str!("../../schema/registry.schema.json");

pub(crate) fn validate_document(path: &Path, document: &Value) -> Result<(), RegistryError> {
    let schema_error = |details: String| RegistryError::Schema {
        path: path.to_path_buf(),
        details,
    };

    let schema: Value = serde_json::from_str(REGISTRY_SCHEMA)
        .map_err(|err| schema_error(format!("parsing bundled registry schema: {err}")))?;
    let compiled = JSONSchema::compile(&schema)
        .map_err(|err| schema_error(format!("compiling bundled registry schema: {err}")))?;

    if let Err(errors) = compiled.validate(document) {
        let details = errors
            .map(|err| err.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        return Err(schema_error(details));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_mixed_entry_shapes() {
        let doc = json!({
            "version": "1.0.0",
            "command_namespaces": ["dev"],
            "commands": ["/dev:commit", {"id": "/dev:review", "description": "review"}],
            "skills": null
        });
        assert!(validate_document(Path::new("registry.yaml"), &doc).is_ok());
    }

    #[test]
    fn rejects_missing_version_and_bad_entries() {
        let missing_version = json!({"agents": ["tester"]});
        assert!(validate_document(Path::new("registry.yaml"), &missing_version).is_err());

        let numeric_entry = json!({"version": "1", "agents": [3]});
        let err = validate_document(Path::new("registry.yaml"), &numeric_entry).unwrap_err();
        assert!(matches!(err, RegistryError::Schema { .. }));
    }
}
