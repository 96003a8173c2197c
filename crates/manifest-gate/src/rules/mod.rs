//! Validation rule registry.
//!
//! Parameter rules check one value against a type and a constraint. Cross
//! rules are named checks that read several parameters of a section (or the
//! whole manifest) through a [`RuleContext`].

mod context;
mod standard;

pub use context::RuleContext;

use crate::error::ValidationError;
use crate::validator::placement::check_placement_constraint;
use crate::validator::security::{check_thumbprint, check_thumbprint_list};
use crate::value::{is_digits_only, ValueKind};

/// Which parameters a rule applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKey {
    Exact {
        section: String,
        parameter: String,
    },
    /// Applies to every parameter in `section` whose name starts with
    /// `prefix`. With `require_suffix`, the bare prefix is rejected.
    Prefix {
        section: String,
        prefix: String,
        require_suffix: bool,
    },
}

impl RuleKey {
    pub fn exact(section: &str, parameter: &str) -> Self {
        Self::Exact {
            section: section.to_string(),
            parameter: parameter.to_string(),
        }
    }

    pub fn prefix(section: &str, prefix: &str, require_suffix: bool) -> Self {
        Self::Prefix {
            section: section.to_string(),
            prefix: prefix.to_string(),
            require_suffix,
        }
    }

    /// Every parameter in a section.
    pub fn section(section: &str) -> Self {
        Self::prefix(section, "", false)
    }

    pub fn matches(&self, section: &str, name: &str) -> bool {
        match self {
            RuleKey::Exact {
                section: s,
                parameter,
            } => s.eq_ignore_ascii_case(section) && parameter.eq_ignore_ascii_case(name),
            RuleKey::Prefix {
                section: s, prefix, ..
            } => {
                s.eq_ignore_ascii_case(section)
                    && name.len() >= prefix.len()
                    && name.is_char_boundary(prefix.len())
                    && name[..prefix.len()].eq_ignore_ascii_case(prefix)
            }
        }
    }
}

/// String formats that need more than a type check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatCheck {
    Thumbprint,
    /// Comma-separated thumbprints.
    ThumbprintList,
    PlacementConstraint,
    DigitsOnly,
}

impl FormatCheck {
    fn check(&self, value: &str) -> Result<(), String> {
        match self {
            FormatCheck::Thumbprint => check_thumbprint(value),
            FormatCheck::ThumbprintList => check_thumbprint_list(value),
            FormatCheck::PlacementConstraint => check_placement_constraint(value),
            FormatCheck::DigitsOnly => {
                if is_digits_only(value) {
                    Ok(())
                } else {
                    Err(format!("'{}' must contain digits only", value))
                }
            }
        }
    }
}

/// Constraint on a value that already passed its type check.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Any,
    /// Closed interval.
    Range(f64, f64),
    AtLeast(f64),
    GreaterThan(f64),
    Exactly(f64),
    OneOf(Vec<f64>),
    MultipleOf(f64),
    AnyOf(Vec<Constraint>),
    AllOf(Vec<Constraint>),
    Format(FormatCheck),
}

impl Constraint {
    pub fn describe(&self) -> String {
        match self {
            Constraint::Any => "any value".to_string(),
            Constraint::Range(lo, hi) => format!("in the range [{}, {}]", lo, hi),
            Constraint::AtLeast(lo) => format!(">= {}", lo),
            Constraint::GreaterThan(lo) => format!("> {}", lo),
            Constraint::Exactly(v) => format!("{}", v),
            Constraint::OneOf(values) => {
                let list: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                format!("one of {{{}}}", list.join(", "))
            }
            Constraint::MultipleOf(m) => format!("a multiple of {}", m),
            Constraint::AnyOf(options) => options
                .iter()
                .map(Constraint::describe)
                .collect::<Vec<_>>()
                .join(" or "),
            Constraint::AllOf(parts) => parts
                .iter()
                .map(Constraint::describe)
                .collect::<Vec<_>>()
                .join(" and "),
            Constraint::Format(format) => format!("{:?} format", format),
        }
    }

    fn holds(&self, number: Option<f64>, raw: &str) -> bool {
        match self {
            Constraint::Any => true,
            Constraint::Format(format) => format.check(raw).is_ok(),
            Constraint::AnyOf(options) => options.iter().any(|c| c.holds(number, raw)),
            Constraint::AllOf(parts) => parts.iter().all(|c| c.holds(number, raw)),
            numeric => {
                let Some(n) = number else {
                    return false;
                };
                match numeric {
                    Constraint::Range(lo, hi) => n >= *lo && n <= *hi,
                    Constraint::AtLeast(lo) => n >= *lo,
                    Constraint::GreaterThan(lo) => n > *lo,
                    Constraint::Exactly(v) => n == *v,
                    Constraint::OneOf(values) => values.contains(&n),
                    Constraint::MultipleOf(m) => *m != 0.0 && n % m == 0.0,
                    _ => false,
                }
            }
        }
    }

    /// Checks a raw value read as `kind`, returning a message on failure.
    pub fn check(&self, kind: ValueKind, raw: &str) -> Result<(), String> {
        // A lone format check gets its own, more specific message.
        if let Constraint::Format(format) = self {
            if raw.is_empty() {
                return Ok(());
            }
            return format.check(raw);
        }
        if self.holds(kind.numeric(raw), raw) {
            Ok(())
        } else {
            Err(format!("value '{}' must be {}", raw, self.describe()))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRule {
    pub key: RuleKey,
    pub kind: ValueKind,
    pub constraint: Constraint,
}

impl ParameterRule {
    pub fn new(key: RuleKey, kind: ValueKind, constraint: Constraint) -> Self {
        Self {
            key,
            kind,
            constraint,
        }
    }

    pub fn check(&self, section: &str, name: &str, value: &str) -> Result<(), ValidationError> {
        if let RuleKey::Prefix {
            prefix,
            require_suffix: true,
            ..
        } = &self.key
        {
            if name.len() <= prefix.len() {
                return Err(ValidationError::range(
                    section,
                    name,
                    format!("'{}' must be followed by a name", prefix),
                ));
            }
        }

        if !self.kind.accepts(value) {
            return Err(ValidationError::range(
                section,
                name,
                format!("Invalid value '{}'; {} expected", value, self.kind.describe()),
            ));
        }

        self.constraint
            .check(self.kind, value)
            .map_err(|message| ValidationError::range(section, name, message))
    }
}

pub type CheckFn = fn(&RuleContext<'_>) -> Result<(), ValidationError>;

/// A named composite check, run once per listed section. An empty section
/// list means the check runs once against the whole manifest.
#[derive(Clone)]
pub struct CrossRule {
    pub name: &'static str,
    pub sections: Vec<String>,
    pub check: CheckFn,
}

impl std::fmt::Debug for CrossRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrossRule")
            .field("name", &self.name)
            .field("sections", &self.sections)
            .finish()
    }
}

impl CrossRule {
    pub fn document(name: &'static str, check: CheckFn) -> Self {
        Self {
            name,
            sections: Vec::new(),
            check,
        }
    }

    pub fn per_section(name: &'static str, sections: &[&str], check: CheckFn) -> Self {
        Self {
            name,
            sections: sections.iter().map(|s| s.to_string()).collect(),
            check,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationRuleSet {
    parameter_rules: Vec<ParameterRule>,
    cross_rules: Vec<CrossRule>,
}

impl ValidationRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// All built-in rules.
    pub fn standard() -> Self {
        let mut rules = Self::new();
        standard::register(&mut rules);
        rules
    }

    pub fn add(&mut self, rule: ParameterRule) -> &mut Self {
        self.parameter_rules.push(rule);
        self
    }

    /// Shorthand for an exact rule registered in every listed section.
    pub fn add_each(
        &mut self,
        sections: &[&str],
        parameter: &str,
        kind: ValueKind,
        constraint: Constraint,
    ) -> &mut Self {
        for section in sections {
            self.add(ParameterRule::new(
                RuleKey::exact(section, parameter),
                kind,
                constraint.clone(),
            ));
        }
        self
    }

    pub fn add_cross(&mut self, rule: CrossRule) -> &mut Self {
        self.cross_rules.push(rule);
        self
    }

    pub fn parameter_rules(&self) -> &[ParameterRule] {
        &self.parameter_rules
    }

    pub fn cross_rules(&self) -> &[CrossRule] {
        &self.cross_rules
    }

    /// Exact rules win over prefix rules; among prefix rules the longest prefix wins.
    pub fn find(&self, section: &str, name: &str) -> Option<&ParameterRule> {
        let mut best_prefix: Option<(&ParameterRule, usize)> = None;
        for rule in &self.parameter_rules {
            if !rule.key.matches(section, name) {
                continue;
            }
            match &rule.key {
                RuleKey::Exact { .. } => return Some(rule),
                RuleKey::Prefix { prefix, .. } => {
                    if best_prefix.map_or(true, |(_, len)| prefix.len() > len) {
                        best_prefix = Some((rule, prefix.len()));
                    }
                }
            }
        }
        best_prefix.map(|(rule, _)| rule)
    }
}
