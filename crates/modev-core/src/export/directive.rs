//! Export tags and the `default_exp` directive.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::graph::Language;

/// Extension every exported module ends with.
pub const MODULE_EXTENSION: &str = ".py";

static PIPE_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^#\|[ \t]*default_exp\b[ \t]*(\S*)").expect("pipe directive pattern")
});

static HEADING_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^##[ \t]*default_exp\b[ \t]*(\S*)").expect("heading directive pattern")
});

/// Tagging convention used to mark cells for export.
///
/// One convention is chosen per run; the two are never mixed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagStyle {
    /// `#| export` and `#| default_exp name`
    #[default]
    Pipe,
    /// `## Export` and `## default_exp name`
    Heading,
}

impl TagStyle {
    /// Substring that marks a cell for export.
    pub fn export_marker(self) -> &'static str {
        match self {
            TagStyle::Pipe => "#| export",
            TagStyle::Heading => "## Export",
        }
    }

    fn directive_pattern(self) -> &'static Regex {
        match self {
            TagStyle::Pipe => &*PIPE_DIRECTIVE,
            TagStyle::Heading => &*HEADING_DIRECTIVE,
        }
    }
}

impl std::fmt::Display for TagStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagStyle::Pipe => f.write_str("pipe"),
            TagStyle::Heading => f.write_str("heading"),
        }
    }
}

/// Outcome of scanning a cell for a `default_exp` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// No directive line.
    Absent,
    /// A directive line without a filename.
    Unnamed,
    /// Requested output filename, always ending in [`MODULE_EXTENSION`].
    Target(String),
}

impl Directive {
    pub fn filename(&self) -> Option<&str> {
        match self {
            Directive::Target(name) => Some(name),
            _ => None,
        }
    }

    pub fn into_filename(self) -> Option<String> {
        match self {
            Directive::Target(name) => Some(name),
            _ => None,
        }
    }
}

/// Whether a cell is tagged for export.
///
/// Only Python cells qualify. The marker may appear anywhere in the source,
/// not just at the start of a line.
pub fn is_exportable(source: &str, language: Language, style: TagStyle) -> bool {
    language == Language::Python && source.contains(style.export_marker())
}

/// Whether any line of `source` is a `default_exp` directive.
pub fn has_directive_line(source: &str, style: TagStyle) -> bool {
    style.directive_pattern().is_match(source)
}

/// Find the `default_exp` directive in a cell's source.
///
/// The first directive line wins. A name without the module extension gets
/// it appended.
pub fn parse_directive(source: &str, style: TagStyle) -> Directive {
    let Some(captures) = style.directive_pattern().captures(source) else {
        return Directive::Absent;
    };

    let name = captures.get(1).map_or("", |m| m.as_str()).trim();
    if name.is_empty() {
        return Directive::Unnamed;
    }

    if name.ends_with(MODULE_EXTENSION) {
        Directive::Target(name.to_string())
    } else {
        Directive::Target(format!("{name}{MODULE_EXTENSION}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_directive_appends_extension() {
        assert_eq!(
            parse_directive("#| default_exp core", TagStyle::Pipe),
            Directive::Target("core.py".to_string())
        );
        assert_eq!(
            parse_directive("#| default_exp core.py", TagStyle::Pipe),
            Directive::Target("core.py".to_string())
        );
        assert_eq!(
            parse_directive("#|default_exp utils/io", TagStyle::Pipe),
            Directive::Target("utils/io.py".to_string())
        );
    }

    #[test]
    fn test_parse_directive_anchored_to_line_start() {
        assert_eq!(
            parse_directive("x = 1  #| default_exp core", TagStyle::Pipe),
            Directive::Absent
        );
        assert_eq!(
            parse_directive("import os\n#| default_exp core\n", TagStyle::Pipe),
            Directive::Target("core.py".to_string())
        );
    }

    #[test]
    fn test_parse_directive_first_line_wins() {
        let source = "#| default_exp first\n#| default_exp second";
        assert_eq!(
            parse_directive(source, TagStyle::Pipe).filename(),
            Some("first.py")
        );
    }

    #[test]
    fn test_parse_directive_without_name() {
        assert_eq!(
            parse_directive("#| default_exp\nx = 1", TagStyle::Pipe),
            Directive::Unnamed
        );
        assert_eq!(
            parse_directive("#| default_exp   ", TagStyle::Pipe),
            Directive::Unnamed
        );
    }

    #[test]
    fn test_parse_directive_ignores_similar_words() {
        assert_eq!(
            parse_directive("#| default_exporter core", TagStyle::Pipe),
            Directive::Absent
        );
        assert_eq!(parse_directive("#| export", TagStyle::Pipe), Directive::Absent);
    }

    #[test]
    fn test_heading_style() {
        assert_eq!(
            parse_directive("## default_exp core", TagStyle::Heading),
            Directive::Target("core.py".to_string())
        );
        assert_eq!(
            parse_directive("#| default_exp core", TagStyle::Heading),
            Directive::Absent
        );
        assert!(is_exportable("## Export\nx = 1", Language::Python, TagStyle::Heading));
        assert!(!is_exportable("#| export\nx = 1", Language::Python, TagStyle::Heading));
    }

    #[test]
    fn test_is_exportable() {
        assert!(is_exportable("#| export\nx = 1", Language::Python, TagStyle::Pipe));
        assert!(is_exportable("x = 1  #| export", Language::Python, TagStyle::Pipe));
        assert!(!is_exportable("x = 1", Language::Python, TagStyle::Pipe));
        assert!(!is_exportable("#| export\n_df = mo.sql('SELECT 1')", Language::Sql, TagStyle::Pipe));
    }

    #[test]
    fn test_tag_style_config_names() {
        assert_eq!(TagStyle::default(), TagStyle::Pipe);
        assert_eq!(TagStyle::Heading.to_string(), "heading");
    }
}
