use crate::activity::AuditStamp;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*([A-Za-z0-9.\-]+)\s*(?:\[\s*([A-Za-z]{2})\s*(?:([+-]?[0-9]+)([dh]))?\s*\])?\s*$",
    )
    .expect("predecessor pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelationshipError {
    #[error("invalid relationship format: '{0}'")]
    Malformed(String),
    #[error("invalid relationship type '{kind}' in '{token}'")]
    UnknownType { kind: String, token: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RelationType {
    #[default]
    FinishToStart,
    StartToStart,
    FinishToFinish,
    StartToFinish,
}

impl RelationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::FinishToStart => "FS",
            RelationType::StartToStart => "SS",
            RelationType::FinishToFinish => "FF",
            RelationType::StartToFinish => "SF",
        }
    }

    /// Value stored in `TASKPRED.pred_type`.
    pub fn p6_code(&self) -> &'static str {
        match self {
            RelationType::FinishToStart => "PR_FS",
            RelationType::StartToStart => "PR_SS",
            RelationType::FinishToFinish => "PR_FF",
            RelationType::StartToFinish => "PR_SF",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_uppercase().as_str() {
            "FS" => Some(RelationType::FinishToStart),
            "SS" => Some(RelationType::StartToStart),
            "FF" => Some(RelationType::FinishToFinish),
            "SF" => Some(RelationType::StartToFinish),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LagUnit {
    Days,
    #[default]
    Hours,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Lag {
    pub amount: i64,
    pub unit: LagUnit,
}

impl Lag {
    pub fn days(amount: i64) -> Self {
        Self {
            amount,
            unit: LagUnit::Days,
        }
    }

    pub fn hours(amount: i64) -> Self {
        Self {
            amount,
            unit: LagUnit::Hours,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    pub fn to_hours(&self, hours_per_day: f64) -> f64 {
        match self.unit {
            LagUnit::Days => self.amount as f64 * hours_per_day,
            LagUnit::Hours => self.amount as f64,
        }
    }
}

impl fmt::Display for Lag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            LagUnit::Days => 'd',
            LagUnit::Hours => 'h',
        };
        write!(f, "{:+}{}", self.amount, unit)
    }
}

/// One entry of a predecessor field, e.g. `A1000[SS+5d]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredecessorLink {
    pub code: String,
    pub relation: RelationType,
    pub lag: Lag,
}

impl PredecessorLink {
    pub fn new(code: impl Into<String>, relation: RelationType, lag: Lag) -> Self {
        Self {
            code: code.into(),
            relation,
            lag,
        }
    }
}

impl FromStr for PredecessorLink {
    type Err = RelationshipError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        parse_predecessor(token)
    }
}

impl fmt::Display for PredecessorLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)?;
        // `+0d` is kept so the unit survives a reparse.
        if self.lag.is_zero() && self.lag.unit == LagUnit::Hours {
            if self.relation != RelationType::FinishToStart {
                write!(f, "[{}]", self.relation.as_str())?;
            }
            return Ok(());
        }
        write!(f, "[{}{}]", self.relation.as_str(), self.lag)
    }
}

pub fn parse_predecessor(token: &str) -> Result<PredecessorLink, RelationshipError> {
    let caps = LINK_PATTERN
        .captures(token)
        .ok_or_else(|| RelationshipError::Malformed(token.to_string()))?;

    let code = caps[1].to_string();

    let relation = match caps.get(2) {
        Some(kind) => RelationType::from_code(kind.as_str()).ok_or_else(|| {
            RelationshipError::UnknownType {
                kind: kind.as_str().to_ascii_uppercase(),
                token: token.to_string(),
            }
        })?,
        None => RelationType::default(),
    };

    let lag = match (caps.get(3), caps.get(4)) {
        (Some(amount), Some(unit)) => {
            let amount = amount
                .as_str()
                .parse::<i64>()
                .map_err(|_| RelationshipError::Malformed(token.to_string()))?;
            if unit.as_str() == "d" {
                Lag::days(amount)
            } else {
                Lag::hours(amount)
            }
        }
        _ => Lag::default(),
    };

    Ok(PredecessorLink {
        code,
        relation,
        lag,
    })
}

/// Splits a comma separated predecessor field and parses every entry on its own.
///
/// Blank entries (for example a trailing comma) are dropped. A bad entry
/// yields an `Err` in its slot and never affects its neighbours.
pub fn parse_predecessor_list(
    field: &str,
) -> Vec<(String, Result<PredecessorLink, RelationshipError>)> {
    field
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| (token.to_string(), parse_predecessor(token)))
        .collect()
}

/// A `TASKPRED` row.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub task_pred_id: i64,
    pub task_id: i64,
    pub pred_task_id: i64,
    pub proj_id: i64,
    pub pred_proj_id: i64,
    pub relation: RelationType,
    pub lag_hours: f64,
    pub audit: AuditStamp,
}
