//! Runtime configuration script
//!
//! Renders the `/config.js` body that hands the backend URL to the browser
//! bundle, so a new backend address does not require rebuilding the bundle.
//! An unusable URL is replaced by an empty string plus a `console.warn`.

use crate::config::RuntimeConfig;

/// Why a configured backend URL cannot be handed to the browser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiUrlProblem {
    Missing,
    NotHttp,
}

impl ApiUrlProblem {
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Missing => "is not set",
            Self::NotHttp => "must start with http:// or https://",
        }
    }
}

/// Check the basic URL shape, returning the problem if there is one
pub fn check_api_url(url: &str) -> Result<&str, ApiUrlProblem> {
    let url = url.trim();
    if url.is_empty() {
        Err(ApiUrlProblem::Missing)
    } else if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url)
    } else {
        Err(ApiUrlProblem::NotHttp)
    }
}

/// Render the script assigning the backend URL to `window.<global_name>`
pub fn render_script(runtime: &RuntimeConfig) -> String {
    let target = global_target(&runtime.global_name);

    match check_api_url(&runtime.api_url) {
        Ok(url) => format!("{target} = {};", js_string(url)),
        Err(problem) => {
            let warning = format!(
                "[config.js] {} {}; API requests will fail",
                runtime.global_name,
                problem.describe()
            );
            format!("console.warn({});\n{target} = \"\";", js_string(&warning))
        }
    }
}

/// JavaScript string literal; JSON strings are valid JS literals
fn js_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

/// `window.NAME` for plain identifiers, `window["..."]` otherwise
fn global_target(name: &str) -> String {
    let mut chars = name.chars();
    let is_identifier = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');

    if is_identifier {
        format!("window.{name}")
    } else {
        format!("window[{}]", js_string(name))
    }
}
