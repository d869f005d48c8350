// src/formatting/templates.rs
//! The handlebars templates bundled into the binary.

use crate::error::AppError;
use handlebars::Handlebars;
use serde::Serialize;

const BUNDLED: &[(&str, &str)] = &[
    ("announcement", include_str!("../../templates/announcement.hbs")),
    ("digest", include_str!("../../templates/digest.hbs")),
    ("nothing_found", include_str!("../../templates/nothing_found.hbs")),
    ("error_notice", include_str!("../../templates/error_notice.hbs")),
    ("stale_count", include_str!("../../templates/stale_count.hbs")),
    ("stale_summary", include_str!("../../templates/stale_summary.md.hbs")),
];

/// A registry of every bundled template.
///
/// Output is Slack mrkdwn or markdown, never HTML, so handlebars' HTML
/// escaping is switched off and callers escape values themselves.
pub struct TemplateSet {
    engine: Handlebars<'static>,
}

impl TemplateSet {
    pub fn new() -> Result<Self, AppError> {
        let mut engine = Handlebars::new();
        engine.set_strict_mode(true);
        engine.register_escape_fn(handlebars::no_escape);

        for (name, content) in BUNDLED {
            engine
                .register_template_string(name, content)
                .map_err(|e| AppError::TemplateRenderError {
                    name: name.to_string(),
                    message: e.to_string(),
                })?;
        }

        Ok(Self { engine })
    }

    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String, AppError> {
        self.engine
            .render(name, data)
            .map_err(|e| AppError::TemplateRenderError {
                name: name.to_string(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bundled_templates_compile() {
        assert!(TemplateSet::new().is_ok());
    }

    #[test]
    fn missing_values_are_render_errors() {
        let templates = TemplateSet::new().unwrap();
        let err = templates.render("error_notice", &json!({})).unwrap_err();
        assert!(matches!(err, AppError::TemplateRenderError { ref name, .. } if name == "error_notice"));
    }

    #[test]
    fn values_are_not_html_escaped() {
        let templates = TemplateSet::new().unwrap();
        let text = templates
            .render("error_notice", &json!({ "error": "a < b & \"c\"" }))
            .unwrap();
        assert_eq!(text.trim_end(), "❌ Script error: a < b & \"c\"");
    }
}
