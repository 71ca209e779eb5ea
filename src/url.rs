//! Endpoint URL composition.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::params::MethodParameters;
use crate::type_map::FriendlyType;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{(\w+)\}").expect("placeholder pattern is valid"))
}

fn scheme_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://").expect("scheme pattern is valid"))
}

fn slash_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/{2,}").expect("slash pattern is valid"))
}

/// Rewrite `{name}` placeholders as `{name:<tag>}` using the declared type
/// of the matching path variable.
pub fn type_placeholders(path: &str, params: &MethodParameters) -> String {
    placeholder_re()
        .replace_all(path, |caps: &Captures<'_>| {
            let name = &caps[1];
            let tag = FriendlyType::from_declared(params.path_variable_type(name));
            format!("{{{name}:{tag}}}")
        })
        .into_owned()
}

/// Serialize query parameters as `name:tag` pairs joined by `&`, sorted by
/// name. Empty when there are none.
pub fn query_string(params: &MethodParameters) -> String {
    let mut pairs: Vec<(&str, FriendlyType)> = params
        .query_parameters
        .iter()
        .map(|q| {
            (
                q.effective_name.as_str(),
                FriendlyType::from_declared(Some(&q.declared_type)),
            )
        })
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    pairs
        .iter()
        .map(|(name, tag)| format!("{name}:{tag}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Collapse runs of `/` into one, leaving a leading `scheme://` intact.
pub fn collapse_slashes(url: &str) -> String {
    let scheme_len = scheme_re().find(url).map_or(0, |m| m.end());
    let (scheme, rest) = url.split_at(scheme_len);
    format!("{scheme}{}", slash_run_re().replace_all(rest, "/"))
}

/// Compose the full URL of one endpoint.
///
/// Pure: equal inputs always produce the same string. Empty base-path and
/// method-path segments are omitted from the join.
pub fn compose_url(
    base_url: &str,
    base_path: &str,
    method_path: &str,
    params: &MethodParameters,
) -> String {
    let method_path = type_placeholders(method_path, params);

    let mut segments = vec![base_url.trim_end_matches('/')];
    for segment in [base_path, method_path.as_str()] {
        let segment = segment.trim_start_matches('/');
        if !segment.is_empty() {
            segments.push(segment);
        }
    }

    let mut url = segments.join("/");
    let query = query_string(params);
    if !query.is_empty() {
        url.push('?');
        url.push_str(&query);
    }

    collapse_slashes(&url)
}
