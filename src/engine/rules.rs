//! Line-oriented reference engine
//!
//! Pattern rules come from a TOML rule library (the built-in one, or a custom
//! library supplied by the user). Layout checks are switched on through
//! engine options:
//!
//! | option     | value                 | effect                              |
//! |------------|-----------------------|-------------------------------------|
//! | `maxlen`   | integer, 0 = off      | flag lines longer than the limit    |
//! | `trailing` | bool                  | flag trailing whitespace            |
//! | `tabs`     | bool                  | flag tabs in indentation            |
//! | `disable`  | comma-separated names | drop library rules by name          |

use std::collections::{BTreeMap, HashSet};
use std::fmt::Display;
use std::io::Read;
use std::str::FromStr;

use regex::Regex;
use serde::Deserialize;

use super::{Engine, EngineFactory, EngineFault, Problem, ProblemHandler, Severity};
use crate::error::ConfigurationError;
use crate::resource::Text;

const DEFAULT_LIBRARY: &str = include_str!("default-rules.toml");

#[derive(Debug, Deserialize)]
struct RuleLibrary {
    #[serde(default)]
    rules: Vec<RuleSpec>,
}

#[derive(Debug, Deserialize)]
struct RuleSpec {
    name: String,
    pattern: String,
    message: String,
    #[serde(default = "default_severity")]
    severity: Severity,
}

fn default_severity() -> Severity {
    Severity::Warning
}

#[derive(Debug)]
struct PatternRule {
    name: String,
    regex: Regex,
    message: String,
    severity: Severity,
}

#[derive(Debug)]
pub struct RuleEngine {
    patterns: Vec<PatternRule>,
    max_line_length: usize,
    trailing_whitespace: bool,
    forbid_tabs: bool,
}

impl RuleEngine {
    /// Build an engine from rule library source and engine options
    pub fn from_library(
        source: &str,
        options: &BTreeMap<String, String>,
    ) -> Result<Self, ConfigurationError> {
        let library: RuleLibrary =
            toml::from_str(source).map_err(ConfigurationError::LibraryParse)?;

        let mut engine = RuleEngine {
            patterns: Vec::new(),
            max_line_length: 0,
            trailing_whitespace: false,
            forbid_tabs: false,
        };
        let mut disabled = HashSet::new();

        for (key, value) in options {
            match key.as_str() {
                "maxlen" => engine.max_line_length = parse_option(key, value)?,
                "trailing" => engine.trailing_whitespace = parse_option(key, value)?,
                "tabs" => engine.forbid_tabs = parse_option(key, value)?,
                "disable" => disabled.extend(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|name| !name.is_empty())
                        .map(str::to_string),
                ),
                _ => return Err(ConfigurationError::UnknownOption(key.clone())),
            }
        }

        for spec in library.rules {
            if disabled.contains(&spec.name) {
                continue;
            }
            let regex = Regex::new(&spec.pattern).map_err(|source| {
                ConfigurationError::InvalidPattern {
                    rule: spec.name.clone(),
                    source,
                }
            })?;
            engine.patterns.push(PatternRule {
                name: spec.name,
                regex,
                message: spec.message,
                severity: spec.severity,
            });
        }

        Ok(engine)
    }

    /// Names of the active library rules, in library order
    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|rule| rule.name.as_str())
    }

    fn check_layout(&self, number: usize, line: &str, handler: &mut dyn ProblemHandler) {
        if self.max_line_length > 0 {
            let length = line.chars().count();
            if length > self.max_line_length {
                handler.handle_problem(Problem {
                    line: number,
                    character: self.max_line_length + 1,
                    code: "maxlen".to_string(),
                    message: format!("Line is too long ({length} > {})", self.max_line_length),
                    severity: Severity::Warning,
                });
            }
        }

        if self.trailing_whitespace {
            let trimmed = line.trim_end();
            if trimmed.len() < line.len() {
                handler.handle_problem(Problem {
                    line: number,
                    character: trimmed.chars().count() + 1,
                    code: "trailing".to_string(),
                    message: "Trailing whitespace".to_string(),
                    severity: Severity::Warning,
                });
            }
        }

        if self.forbid_tabs {
            let indent = &line[..line.len() - line.trim_start().len()];
            if let Some(position) = indent.find('\t') {
                handler.handle_problem(Problem {
                    line: number,
                    character: indent[..position].chars().count() + 1,
                    code: "tabs".to_string(),
                    message: "Tab used for indentation".to_string(),
                    severity: Severity::Warning,
                });
            }
        }
    }
}

fn parse_option<T>(key: &str, value: &str) -> Result<T, ConfigurationError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigurationError::InvalidOption {
            key: key.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

impl Engine for RuleEngine {
    fn check(&mut self, text: &Text, handler: &mut dyn ProblemHandler) -> Result<(), EngineFault> {
        for (index, line) in text.lines().enumerate() {
            let number = index + 1;
            self.check_layout(number, line, handler);

            for rule in &self.patterns {
                for found in rule.regex.find_iter(line) {
                    handler.handle_problem(Problem {
                        line: number,
                        character: line[..found.start()].chars().count() + 1,
                        code: rule.name.clone(),
                        message: rule.message.clone(),
                        severity: rule.severity,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Builds [`RuleEngine`]s from the built-in library or a custom one
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEngineFactory;

impl EngineFactory for RuleEngineFactory {
    fn create(
        &self,
        library: Option<&mut dyn Read>,
        options: &BTreeMap<String, String>,
    ) -> Result<Box<dyn Engine>, ConfigurationError> {
        let engine = match library {
            Some(reader) => {
                let mut source = String::new();
                reader
                    .read_to_string(&mut source)
                    .map_err(ConfigurationError::LibraryRead)?;
                RuleEngine::from_library(&source, options)?
            }
            None => RuleEngine::from_library(DEFAULT_LIBRARY, options)?,
        };
        Ok(Box::new(engine))
    }
}
