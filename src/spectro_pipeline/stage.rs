//! Named acquisition stages and their exposure expectations.

use std::fmt;

/// What kind of scene a stage expects in front of the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Light source off or blocked
    Dark,
    /// Bright, unobstructed light path
    White,
    /// Blank cuvette (solvent only)
    Reference,
    /// Cuvette holding a standard or the unknown
    Sample,
}

impl StageKind {
    /// Infers the kind from a stage name; unknown names are treated as samples.
    pub fn from_name(name: &str) -> Self {
        // Standard stages carry the kind after the last '/'.
        let tail = name.rsplit('/').next().unwrap_or(name).to_ascii_lowercase();
        if tail.contains("dark") {
            StageKind::Dark
        } else if tail.contains("white") || tail.contains("bright") {
            StageKind::White
        } else if tail.contains("ref") || tail.contains("blank") {
            StageKind::Reference
        } else {
            StageKind::Sample
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Dark => "dark",
            StageKind::White => "white",
            StageKind::Reference => "reference",
            StageKind::Sample => "sample",
        }
    }

    /// The four stages acquired for every standard and for the unknown, in order.
    pub const QUARTET: [StageKind; 4] = [
        StageKind::Dark,
        StageKind::White,
        StageKind::Reference,
        StageKind::Sample,
    ];
}

/// One named acquisition step.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub name: String,
    pub kind: StageKind,
}

impl Stage {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let kind = StageKind::from_name(&name);
        Self { name, kind }
    }

    pub fn of_kind(kind: StageKind) -> Self {
        let name = match kind {
            StageKind::Dark => "dark_noise",
            StageKind::White => "white_noise",
            StageKind::Reference => "reference",
            StageKind::Sample => "sample",
        };
        Self { name: name.to_string(), kind }
    }

    /// Stage of the standard at `index` with known `concentration`, named
    /// `std<index>@<concentration>/<kind>`.
    pub fn standard(index: usize, concentration: f64, kind: StageKind) -> Self {
        Self {
            name: format!("std{index}@{concentration}/{}", kind.as_str()),
            kind,
        }
    }

    /// Concentration embedded in a standard stage name, if any.
    pub fn concentration(&self) -> Option<f64> {
        let (_, rest) = self.name.split_once('@')?;
        let value = rest.split('/').next()?;
        value.parse().ok()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
