use std::fmt::{self, Display};
use std::str::FromStr;

use crate::errors::PipelineError;

///
/// Strand of an interval record or gene. Parsed from either `+`/`-` or the
/// `1`/`-1` integer encoding found in some gene catalogs; always written as `+`/`-`.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone, Copy)]
pub enum Strand {
    Plus,
    Minus,
}

impl Strand {
    pub fn symbol(&self) -> &'static str {
        match self {
            Strand::Plus => "+",
            Strand::Minus => "-",
        }
    }

    pub fn flip(&self) -> Strand {
        match self {
            Strand::Plus => Strand::Minus,
            Strand::Minus => Strand::Plus,
        }
    }

    /// Word appended to a track name, e.g. `sample Plus`.
    pub fn track_label(&self) -> &'static str {
        match self {
            Strand::Plus => "Plus",
            Strand::Minus => "Minus",
        }
    }

    /// Filename marker for strand specific coverage, `-cov-pos` or `-cov-neg`.
    pub fn coverage_marker(&self) -> &'static str {
        match self {
            Strand::Plus => "-cov-pos",
            Strand::Minus => "-cov-neg",
        }
    }
}

impl FromStr for Strand {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "+" | "1" | "+1" => Ok(Strand::Plus),
            "-" | "-1" => Ok(Strand::Minus),
            other => Err(PipelineError::invalid(format!(
                "Unrecognized strand: {:?}",
                other
            ))),
        }
    }
}

impl Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
