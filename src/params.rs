//! Method parameter extraction.
//!
//! Reads `@PathVariable` and `@RequestParam` bindings out of the textual
//! signature that follows a route annotation.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A declared Java type: qualified name, optional generic arguments and
/// array brackets.
const TYPE_PATTERN: &str = r"[\w.$]+(?:\s*<[^()]*?>)?(?:\s*\[\s*\])*";

/// Zero or more annotations (`@NotNull`, `@Valid(...)`) preceding the type.
const NESTED_ANNOTATIONS: &str = r"(?:@[\w.]+(?:\s*\([^)]*\))?\s+)*";

fn path_variable_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"@PathVariable\b(?:\s*\(([^)]*)\))?\s+{NESTED_ANNOTATIONS}(?:final\s+)?({TYPE_PATTERN})\s+(\w+)"
        ))
        .expect("path variable pattern is valid")
    })
}

fn request_param_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"@RequestParam\b(?:\s*\(([^)]*)\))?\s+{NESTED_ANNOTATIONS}(?:final\s+)?({TYPE_PATTERN})\s+(\w+)"
        ))
        .expect("request param pattern is valid")
    })
}

fn positional_alias_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^\s*"([^"]*)"\s*$"#).expect("alias pattern is valid"))
}

fn name_alias_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\bname\s*=\s*"([^"]*)""#).expect("alias pattern is valid"))
}

fn value_alias_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\bvalue\s*=\s*"([^"]*)""#).expect("alias pattern is valid"))
}

fn access_modifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:public|private|protected)\b").expect("modifier pattern is valid")
    })
}

/// A `@PathVariable` binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathVariableBinding {
    /// Alias from the annotation, else the bound identifier. Never empty.
    pub name: String,
    pub declared_type: Option<String>,
}

/// A `@RequestParam` binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParameterBinding {
    pub effective_name: String,
    pub declared_type: String,
}

/// Parameters bound by one method signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodParameters {
    /// In declaration order.
    pub path_variables: Vec<PathVariableBinding>,

    /// One entry per effective name, sorted by name. A later declaration
    /// with the same name replaces an earlier one.
    pub query_parameters: Vec<QueryParameterBinding>,
}

impl MethodParameters {
    /// Declared type of the path variable bound to `name`, if any.
    pub fn path_variable_type(&self, name: &str) -> Option<&str> {
        self.path_variables
            .iter()
            .rev()
            .find(|binding| binding.name == name)
            .and_then(|binding| binding.declared_type.as_deref())
    }
}

/// Resolve an alias from annotation arguments: a lone positional literal,
/// then `name = "..."`, then `value = "..."`. Empty literals do not count.
fn annotation_alias(args: &str) -> Option<String> {
    [positional_alias_re(), name_alias_re(), value_alias_re()]
        .into_iter()
        .filter_map(|re| re.captures(args).and_then(|caps| caps.get(1)))
        .map(|m| m.as_str().trim())
        .find(|alias| !alias.is_empty())
        .map(str::to_string)
}

/// Extract path-variable and query-parameter bindings from a signature span.
pub fn extract_parameters(signature: &str) -> MethodParameters {
    let path_variables = path_variable_re()
        .captures_iter(signature)
        .filter_map(|caps| {
            let declared = caps.get(2)?.as_str();
            let ident = caps.get(3)?.as_str();
            let alias = caps.get(1).and_then(|args| annotation_alias(args.as_str()));
            Some(PathVariableBinding {
                name: alias.unwrap_or_else(|| ident.to_string()),
                declared_type: Some(declared.to_string()),
            })
        })
        .collect();

    let mut query: BTreeMap<String, String> = BTreeMap::new();
    for caps in request_param_re().captures_iter(signature) {
        let (Some(declared), Some(ident)) = (caps.get(2), caps.get(3)) else {
            continue;
        };
        let name = caps
            .get(1)
            .and_then(|args| annotation_alias(args.as_str()))
            .unwrap_or_else(|| ident.as_str().to_string());
        query.insert(name, declared.as_str().to_string());
    }

    MethodParameters {
        path_variables,
        query_parameters: query
            .into_iter()
            .map(|(effective_name, declared_type)| QueryParameterBinding {
                effective_name,
                declared_type,
            })
            .collect(),
    }
}

/// Collect the signature text that follows a route annotation.
///
/// Lines are accumulated from `start` until an access modifier has been seen
/// and a line at or after it contains `{`. Reaching the end of the document
/// first returns whatever was accumulated.
pub fn signature_span<S: AsRef<str>>(lines: &[S], start: usize) -> String {
    let mut span: Vec<&str> = Vec::new();
    let mut modifier_seen = false;

    for line in lines.iter().skip(start) {
        let line = line.as_ref();
        span.push(line);

        if !modifier_seen && access_modifier_re().is_match(line) {
            modifier_seen = true;
        }
        if modifier_seen && line.contains('{') {
            break;
        }
    }

    span.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(params: &MethodParameters) -> Vec<(&str, &str)> {
        params
            .query_parameters
            .iter()
            .map(|q| (q.effective_name.as_str(), q.declared_type.as_str()))
            .collect()
    }

    #[test]
    fn test_path_variable_identifier_and_alias() {
        let params = extract_parameters(
            r#"public String get(@PathVariable Long userId, @PathVariable("cid") java.util.UUID commentId) {"#,
        );
        assert_eq!(
            params.path_variables,
            vec![
                PathVariableBinding {
                    name: "userId".into(),
                    declared_type: Some("Long".into())
                },
                PathVariableBinding {
                    name: "cid".into(),
                    declared_type: Some("java.util.UUID".into())
                },
            ]
        );
        assert_eq!(params.path_variable_type("cid"), Some("java.util.UUID"));
        assert_eq!(params.path_variable_type("missing"), None);
    }

    #[test]
    fn test_path_variable_keyed_alias_and_modifiers() {
        let params = extract_parameters(r#"public void x(@PathVariable final Long id) {"#);
        assert_eq!(params.path_variables[0].name, "id");
        assert_eq!(params.path_variables[0].declared_type.as_deref(), Some("Long"));

        let params =
            extract_parameters(r#"public void x(@PathVariable(value = "id") @NotNull final Integer key) {"#);
        assert_eq!(params.path_variables[0].name, "id");
        assert_eq!(params.path_variables[0].declared_type.as_deref(), Some("Integer"));
    }

    #[test]
    fn test_query_alias_precedence() {
        let params = extract_parameters(
            r#"public List<Film> search(@RequestParam("q") String search, @RequestParam Integer page,
                   @RequestParam(name = "sz", value = "ignored") int size,
                   @RequestParam(value = "sort", required = false) String order) {"#,
        );
        assert_eq!(
            names(&params),
            [
                ("page", "Integer"),
                ("q", "String"),
                ("sort", "String"),
                ("sz", "int")
            ]
        );
    }

    #[test]
    fn test_query_nested_annotations_tolerated() {
        let params = extract_parameters(
            r#"public void x(@RequestParam @Min(1) @Max(value = 10) Long limit, @RequestParam Map<String, List<Long>> filters) {"#,
        );
        assert_eq!(
            names(&params),
            [("filters", "Map<String, List<Long>>"), ("limit", "Long")]
        );
    }

    #[test]
    fn test_query_duplicate_names_last_wins() {
        let params = extract_parameters(
            r#"public void x(@RequestParam("id") Long a, @RequestParam(name = "id") Boolean b) {"#,
        );
        assert_eq!(names(&params), [("id", "Boolean")]);
    }

    #[test]
    fn test_no_bindings() {
        let params = extract_parameters("public String home(Model model) {");
        assert_eq!(params, MethodParameters::default());
        assert_eq!(extract_parameters(""), MethodParameters::default());
    }

    #[test]
    fn test_signature_span_multiline() {
        let lines = [
            "    @GetMapping(\"/{id}\")",
            "    @ResponseBody",
            "    public Film get(",
            "            @PathVariable Long id)",
            "    {",
            "        return null;",
            "    }",
        ];
        let span = signature_span(&lines, 0);
        assert_eq!(span, lines[..5].join("\n"));
    }

    #[test]
    fn test_signature_span_brace_before_modifier_ignored() {
        let lines = ["@PostMapping(value={\"/a\",\"/b\"})", "public void x() {", "}"];
        assert_eq!(signature_span(&lines, 0), lines[..2].join("\n"));
    }

    #[test]
    fn test_signature_span_runs_to_end() {
        let lines = ["@GetMapping", "String noModifier() {", "}"];
        assert_eq!(signature_span(&lines, 0), lines.join("\n"));
        assert_eq!(signature_span(&lines, 7), "");
    }
}
