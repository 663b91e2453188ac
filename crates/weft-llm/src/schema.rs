use serde_json::{json, Value};

/// JSON schema for the structured artifact output: `{plan, title, content,
/// description}`, all strings. Field descriptions steer the model.
pub fn artifact_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "plan": {
                "type": "string",
                "description": "How you think about the content of the artefact (purpose, structure, essentials) and how you intend to output it"
            },
            "title": {
                "type": "string",
                "description": "The title of the artefact"
            },
            "content": {
                "type": "string",
                "description": "The content of the artefact formatted markdown."
            },
            "description": {
                "type": "string",
                "description": "Explanation of the Artifact and what the intention was in creating this Artifact. Add any suggestions for making it even better."
            }
        },
        "required": ["plan", "title", "content", "description"]
    })
}
