use std::fmt;

// ---------------------------------------------------------------------------
// ValidationPhase
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationPhase {
    Requirements,
    Design,
    Tasks,
    All,
}

impl ValidationPhase {
    /// Every phase, in the order the choice prompt lists them.
    pub fn all() -> &'static [ValidationPhase] {
        &[
            ValidationPhase::Requirements,
            ValidationPhase::Design,
            ValidationPhase::Tasks,
            ValidationPhase::All,
        ]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<ValidationPhase> {
        ValidationPhase::all().get(index).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValidationPhase::Requirements => "requirements",
            ValidationPhase::Design => "design",
            ValidationPhase::Tasks => "tasks",
            ValidationPhase::All => "all",
        }
    }
}

impl fmt::Display for ValidationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ValidationPhase {
    type Err = crate::error::KiroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requirements" => Ok(ValidationPhase::Requirements),
            "design" => Ok(ValidationPhase::Design),
            "tasks" => Ok(ValidationPhase::Tasks),
            "all" => Ok(ValidationPhase::All),
            _ => Err(crate::error::KiroError::InvalidPhase(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ValidationScript
// ---------------------------------------------------------------------------

/// The two validation entry points shipped in a project's scripts directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationScript {
    /// Validates one named feature.
    Named,
    /// Validates whichever spec was touched most recently.
    Latest,
}

impl ValidationScript {
    pub fn filename(self) -> &'static str {
        match self {
            ValidationScript::Named => "kiro-spec-validate.sh",
            ValidationScript::Latest => "kiro-spec-validate-latest.sh",
        }
    }
}
