//! Output path template rendering.
//!
//! Supports `{{.BuildName}}` and `{{.BuilderType}}` placeholders; the leading
//! dot and inner whitespace are optional.

use std::sync::OnceLock;

use regex::Regex;

pub const KNOWN_VARIABLES: &[&str] = &["BuildName", "BuilderType"];

/// Values substituted into the output path template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateVars {
    pub build_name: String,
    pub builder_type: String,
}

impl TemplateVars {
    fn get(&self, name: &str) -> Option<&str> {
        match name {
            "BuildName" => Some(&self.build_name),
            "BuilderType" => Some(&self.builder_type),
            _ => None,
        }
    }
}

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*\.?([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder regex")
    })
}

/// Check the template is well formed and only names known variables.
pub fn validate(template: &str) -> Result<(), String> {
    for caps in placeholder().captures_iter(template) {
        let name = &caps[1];
        if !KNOWN_VARIABLES.contains(&name) {
            return Err(format!(
                "unknown variable '{}' (expected one of: {})",
                name,
                KNOWN_VARIABLES.join(", ")
            ));
        }
    }

    let stripped = placeholder().replace_all(template, "");
    if stripped.contains("{{") || stripped.contains("}}") {
        return Err("unbalanced '{{' / '}}' in template".to_string());
    }
    Ok(())
}

/// Render the template with the given variables.
pub fn render(template: &str, vars: &TemplateVars) -> Result<String, String> {
    validate(template)?;
    let rendered = placeholder().replace_all(template, |caps: &regex::Captures| {
        vars.get(&caps[1]).unwrap_or_default().to_string()
    });
    Ok(rendered.into_owned())
}
