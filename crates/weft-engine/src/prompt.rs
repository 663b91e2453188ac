use weft_core::error::Result;
use weft_core::graph::ExecutionSource;
use weft_core::traits::{PromptBindings, PromptRenderer};

/// Default system template for text-generation nodes. Used when the node
/// carries no template override.
pub const TEXT_GENERATION_TEMPLATE: &str = "\
You are tasked with generating an artifact based on the following instruction. \
Read the requirement and the provided sources carefully before you write.

## Instruction

{{instruction}}

## Requirement

{{requirement}}

## Sources

{{sources}}
";

/// Placeholder-substitution renderer.
///
/// Understands exactly the three bindings the dispatcher provides:
/// `{{instruction}}`, `{{requirement}}`, and `{{sources}}`. Sources expand
/// into tagged blocks so the model can attribute excerpts to nodes.
pub struct TemplateRenderer;

impl TemplateRenderer {
    fn sources_block(sources: &[ExecutionSource]) -> String {
        let mut out = String::new();
        for source in sources {
            let (kind, title, content, node_id) = match source {
                ExecutionSource::Text { content, node_id } => ("text", "", content, node_id),
                ExecutionSource::File {
                    title,
                    content,
                    node_id,
                } => ("file", title.as_str(), content, node_id),
                ExecutionSource::TextGeneration {
                    title,
                    content,
                    node_id,
                } => ("textGeneration", title.as_str(), content, node_id),
            };
            out.push_str(&format!(
                "<source type=\"{kind}\" node=\"{node_id}\" title=\"{title}\">\n{content}\n</source>\n"
            ));
        }
        out
    }
}

impl PromptRenderer for TemplateRenderer {
    fn render(&self, template: &str, bindings: &PromptBindings) -> Result<String> {
        let rendered = template
            .replace("{{instruction}}", &bindings.instruction)
            .replace(
                "{{requirement}}",
                bindings.requirement.as_deref().unwrap_or(""),
            )
            .replace("{{sources}}", &Self::sources_block(&bindings.sources));
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::types::NodeId;

    #[test]
    fn test_render_binds_all_placeholders() {
        let bindings = PromptBindings {
            instruction: "Summarize the notes".into(),
            requirement: Some("Keep it short".into()),
            sources: vec![ExecutionSource::File {
                title: "notes.md".into(),
                content: "meeting notes".into(),
                node_id: NodeId::from_str("nd_1"),
            }],
        };
        let prompt = TemplateRenderer
            .render(TEXT_GENERATION_TEMPLATE, &bindings)
            .unwrap();

        assert!(prompt.contains("Summarize the notes"));
        assert!(prompt.contains("Keep it short"));
        assert!(prompt.contains("<source type=\"file\" node=\"nd_1\" title=\"notes.md\">"));
        assert!(prompt.contains("meeting notes"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_render_missing_requirement_is_empty() {
        let bindings = PromptBindings {
            instruction: "Write".into(),
            requirement: None,
            sources: vec![],
        };
        let prompt = TemplateRenderer
            .render("{{instruction}}|{{requirement}}|{{sources}}", &bindings)
            .unwrap();
        assert_eq!(prompt, "Write||");
    }

    #[test]
    fn test_custom_template_override() {
        let bindings = PromptBindings {
            instruction: "Translate".into(),
            requirement: None,
            sources: vec![],
        };
        let prompt = TemplateRenderer
            .render("SYSTEM: {{instruction}}", &bindings)
            .unwrap();
        assert_eq!(prompt, "SYSTEM: Translate");
    }
}
