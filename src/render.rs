//! Jinja template rendering
//!
//! Templates are loaded from a directory and rendered strictly: a reference
//! to an undefined variable is an error, never an empty string.

use crate::mt::error::{MtError, MtResult};
use minijinja::{AutoEscape, Environment, UndefinedBehavior, path_loader};
use serde_json::{Value, json};
use std::path::Path;
use tracing::{debug, info};

/// Template file extensions rendered with HTML auto-escaping
const HTML_EXTENSIONS: [&str; 3] = [".html", ".htm", ".j2"];

fn auto_escape_for(name: &str) -> AutoEscape {
    if HTML_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
        AutoEscape::Html
    } else {
        AutoEscape::None
    }
}

/// Upper-case the first character, leave the rest alone
fn first_upper(value: String) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => value,
    }
}

/// Build a strict environment over `templates_dir`
pub fn environment(templates_dir: &Path) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_loader(path_loader(templates_dir));
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_auto_escape_callback(auto_escape_for);
    env.add_filter("first_upper", first_upper);
    env
}

/// Render `template_name` from `templates_dir` against `context`
pub fn render_template(
    templates_dir: &Path,
    template_name: &str,
    context: &Value,
) -> MtResult<String> {
    let env = environment(templates_dir);
    let template = env.get_template(template_name)?;
    let rendered = template.render(context)?;
    info!(
        template = template_name,
        bytes = rendered.len(),
        "Rendered template"
    );
    Ok(rendered)
}

/// Load the render context from a JSON file, or use the sample context
pub fn load_context(path: Option<&Path>) -> MtResult<Value> {
    let Some(path) = path else {
        debug!("No context file given; using sample context");
        return Ok(sample_context());
    };

    let text = std::fs::read_to_string(path).map_err(|e| {
        MtError::Io(format!("Failed to read context {}: {}", path.display(), e))
    })?;
    let value: Value = serde_json::from_str(&text)?;
    if !value.is_object() {
        return Err(MtError::TemplateError(format!(
            "Context {} must be a JSON object",
            path.display()
        )));
    }
    Ok(value)
}

/// Product sheet context used when no data file is given
pub fn sample_context() -> Value {
    json!({
        "company": { "name": "Emidat", "country": "Norway" },
        "product": {
            "name": "Low-Carbon AAC powder",
            "slug": "low-carbon-aac-block",
            "is_premium": true,
            "features": [
                "High thermal efficiency",
                "Lightweight and easy to install",
                "Lower embodied carbon than conventional alternatives"
            ],
            "specs": {
                "Density": "525 kg/m³",
                "Compressive strength": "4.0 MPa",
                "Declared unit": "1 m² wall, 100 mm thickness"
            }
        }
    })
}
