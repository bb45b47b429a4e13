//! Compile-time options

use esql_ir::ParameterMode;
use serde::{Deserialize, Serialize};

/// Naming applied to members of anonymous output shapes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingPolicy {
    Preserve,
    #[default]
    CamelCase,
    SnakeCase,
}

impl NamingPolicy {
    pub fn apply(&self, name: &str) -> String {
        match self {
            NamingPolicy::Preserve => name.to_string(),
            NamingPolicy::CamelCase => {
                let mut chars = name.chars();
                match chars.next() {
                    Some(first) => first.to_lowercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
            NamingPolicy::SnakeCase => {
                let mut out = String::with_capacity(name.len() + 4);
                let mut prev_lower = false;
                for c in name.chars() {
                    if c.is_uppercase() {
                        if prev_lower {
                            out.push('_');
                        }
                        out.extend(c.to_lowercase());
                        prev_lower = false;
                    } else {
                        out.push(c);
                        prev_lower = c.is_lowercase() || c.is_ascii_digit();
                    }
                }
                out
            }
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "preserve" => Some(NamingPolicy::Preserve),
            "camel_case" | "camelcase" | "camel" => Some(NamingPolicy::CamelCase),
            "snake_case" | "snakecase" | "snake" => Some(NamingPolicy::SnakeCase),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileOptions {
    pub mode: ParameterMode,
    /// Exact-match sub-field appended to full-text fields
    pub keyword_suffix: String,
    pub naming: NamingPolicy,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            mode: ParameterMode::Inline,
            keyword_suffix: ".keyword".to_string(),
            naming: NamingPolicy::default(),
        }
    }
}

impl CompileOptions {
    pub fn parameterized() -> Self {
        Self {
            mode: ParameterMode::Parameterized,
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: ParameterMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_naming(mut self, naming: NamingPolicy) -> Self {
        self.naming = naming;
        self
    }
}
