//! Keyword classifier for problem descriptions.
//!
//! Categories are checked in a fixed priority order and the first match wins:
//! syntax, type, dependency, build, complex. Anything else is `unknown`.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// The category assigned to a problem description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemCategory {
    Syntax,
    Type,
    Build,
    Dependency,
    Complex,
    Unknown,
}

impl ProblemCategory {
    /// All categories, in declaration order.
    pub const ALL: [ProblemCategory; 6] = [
        ProblemCategory::Syntax,
        ProblemCategory::Type,
        ProblemCategory::Build,
        ProblemCategory::Dependency,
        ProblemCategory::Complex,
        ProblemCategory::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemCategory::Syntax => "syntax",
            ProblemCategory::Type => "type",
            ProblemCategory::Build => "build",
            ProblemCategory::Dependency => "dependency",
            ProblemCategory::Complex => "complex",
            ProblemCategory::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ProblemCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

const SYNTAX_KEYWORDS: &[&str] = &[
    "unexpected token",
    "unterminated",
    "missing >",
    "jsx",
    "parsing error",
    "syntax error",
    "unexpected end of input",
];

const TYPE_KEYWORDS: &[&str] = &[
    "type error",
    "does not exist on type",
    "is not assignable",
    "cannot find name",
    "implicitly has an 'any' type",
];

const DEPENDENCY_KEYWORDS: &[&str] = &[
    "module not found",
    "cannot find module",
    "npm install",
    "npm i ",
    "yarn add",
    "pnpm add",
    "bun add",
    "peer dep",
    "version mismatch",
    "eresolve",
];

const BUILD_KEYWORDS: &[&str] = &[
    "build",
    "compile",
    "webpack",
    "vite",
    "rollup",
    "esbuild",
    "turbopack",
    "babel",
    "tsc",
];

const COMPLEX_KEYWORDS: &[&str] = &["architecture", "refactor", "circular", "design"];

/// TypeScript diagnostic codes such as `TS2339` (matched on lowercased text).
static TS_DIAGNOSTIC_CODE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\bts\d{4,5}\b").ok());

fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| haystack.contains(k))
}

fn has_type_pattern(lower: &str) -> bool {
    contains_any(lower, TYPE_KEYWORDS)
        || TS_DIAGNOSTIC_CODE
            .as_ref()
            .is_some_and(|re| re.is_match(lower))
}

/// Classify a free-text problem description.
///
/// Matching is case-insensitive substring search; there is no scoring.
pub fn classify(text: &str) -> ProblemCategory {
    let lower = text.to_lowercase();

    if contains_any(&lower, SYNTAX_KEYWORDS) {
        return ProblemCategory::Syntax;
    }

    if has_type_pattern(&lower) {
        return ProblemCategory::Type;
    }

    if contains_any(&lower, DEPENDENCY_KEYWORDS) {
        return ProblemCategory::Dependency;
    }

    if contains_any(&lower, BUILD_KEYWORDS) {
        return ProblemCategory::Build;
    }

    if contains_any(&lower, COMPLEX_KEYWORDS) {
        return ProblemCategory::Complex;
    }

    ProblemCategory::Unknown
}
