//! Server port detection from Spring Boot project configuration.
//!
//! Read-only and best effort: each source is matched by a single pattern and
//! anything unreadable or unmatched falls through to the next one.

use std::sync::OnceLock;

use regex::Regex;

/// Port used when no project configuration declares one.
pub const DEFAULT_PORT: &str = "8080";

/// Properties file, relative to the workspace root.
pub const PROPERTIES_FILE: &str = "src/main/resources/application.properties";

/// YAML candidates, relative to the workspace root, in lookup order.
pub const YAML_FILES: [&str; 2] = [
    "src/main/resources/application.yml",
    "src/main/resources/application.yaml",
];

fn properties_port_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*server\.port[ \t]*=[ \t]*(\d+)").expect("properties pattern is valid")
    })
}

fn yaml_port_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^server:[ \t]*\r?\n[ \t]+port:[ \t]*(\d+)").expect("yaml pattern is valid")
    })
}

/// `server.port = <digits>` from a properties file.
pub fn port_from_properties(text: &str) -> Option<String> {
    properties_port_re()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// `server:` directly followed by an indented `port: <digits>`.
pub fn port_from_yaml(text: &str) -> Option<String> {
    yaml_port_re()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Resolve the runtime port: properties file, then the YAML files, then
/// [`DEFAULT_PORT`]. `read` returns the text of a workspace-relative file.
pub fn resolve_port<F>(read: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = read(PROPERTIES_FILE).as_deref().and_then(port_from_properties) {
        return port;
    }
    YAML_FILES
        .into_iter()
        .find_map(|file| read(file).as_deref().and_then(port_from_yaml))
        .unwrap_or_else(|| DEFAULT_PORT.to_string())
}

/// Base URL used when none is configured.
pub fn default_base_url(port: &str) -> String {
    format!("https://localhost:{port}")
}
