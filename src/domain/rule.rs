//! Rule AST data structures.
//!
//! This module defines the named predicates a strategy evaluates:
//! - `Fact`: A scalar read from the latest one or two bars
//! - `Operand`: What can be compared (facts, indicators, constants, scaled operands)
//! - `Comparison`: Strict or inclusive greater-than
//! - `Rule`: A named comparison

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fact {
    LastClose,
    PrevClose,
    /// Close `n` bars before the latest one.
    CloseBarsAgo(usize),
    VolumeToday,
    PrevVolume,
    HighToday,
    /// last_close * volume_today
    ValueToday,
    /// (last_close / prev_close - 1) * 100
    DailyChangePct,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Fact(Fact),
    Indicator(String),
    Constant(f64),
    Scaled { factor: f64, operand: Box<Operand> },
}

impl Operand {
    pub fn indicator(name: &str) -> Self {
        Operand::Indicator(name.to_string())
    }

    pub fn scaled(factor: f64, operand: Operand) -> Self {
        Operand::Scaled {
            factor,
            operand: Box::new(operand),
        }
    }
}

impl From<Fact> for Operand {
    fn from(fact: Fact) -> Self {
        Operand::Fact(fact)
    }
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Operand::Constant(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `left > right`
    Above,
    /// `left >= right`
    AtLeast,
}

impl Comparison {
    pub fn apply(self, left: f64, right: f64) -> bool {
        match self {
            Comparison::Above => left > right,
            Comparison::AtLeast => left >= right,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub name: String,
    pub left: Operand,
    pub cmp: Comparison,
    pub right: Operand,
}

impl Rule {
    pub fn above(name: &str, left: impl Into<Operand>, right: impl Into<Operand>) -> Self {
        Self {
            name: name.to_string(),
            left: left.into(),
            cmp: Comparison::Above,
            right: right.into(),
        }
    }

    pub fn at_least(name: &str, left: impl Into<Operand>, right: impl Into<Operand>) -> Self {
        Self {
            name: name.to_string(),
            left: left.into(),
            cmp: Comparison::AtLeast,
            right: right.into(),
        }
    }
}

/// Collects every indicator name referenced by `rules`, in first-seen order.
pub fn extract_indicators(rules: &[Rule]) -> Vec<String> {
    fn walk(operand: &Operand, out: &mut Vec<String>) {
        match operand {
            Operand::Indicator(name) => {
                if !out.contains(name) {
                    out.push(name.clone());
                }
            }
            Operand::Scaled { operand, .. } => walk(operand, out),
            Operand::Fact(_) | Operand::Constant(_) => {}
        }
    }

    let mut out = Vec::new();
    for rule in rules {
        walk(&rule.left, &mut out);
        walk(&rule.right, &mut out);
    }
    out
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fact::LastClose => write!(f, "last_close"),
            Fact::PrevClose => write!(f, "prev_close"),
            Fact::CloseBarsAgo(n) => write!(f, "close_{}_bars_ago", n),
            Fact::VolumeToday => write!(f, "volume_today"),
            Fact::PrevVolume => write!(f, "prev_volume"),
            Fact::HighToday => write!(f, "high_today"),
            Fact::ValueToday => write!(f, "value_today"),
            Fact::DailyChangePct => write!(f, "daily_change_pct"),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Fact(fact) => write!(f, "{}", fact),
            Operand::Indicator(name) => write!(f, "{}", name),
            Operand::Constant(v) => write!(f, "{}", v),
            Operand::Scaled { factor, operand } => write!(f, "{} * {}", factor, operand),
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparison::Above => write!(f, ">"),
            Comparison::AtLeast => write!(f, ">="),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {} {}", self.name, self.left, self.cmp, self.right)
    }
}
