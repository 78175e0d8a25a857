use serde::{Deserialize, Serialize};

/// Width of the sector on either side of a compass point.
const HALF_SECTOR_DEG: f64 = 22.5;
const SECTOR_DEG: f64 = 45.0;

/// The eight compass points, clockwise from north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompassDirection {
    North,
    Northeast,
    East,
    Southeast,
    South,
    Southwest,
    West,
    Northwest,
}

impl CompassDirection {
    pub const ALL: [CompassDirection; 8] = [
        CompassDirection::North,
        CompassDirection::Northeast,
        CompassDirection::East,
        CompassDirection::Southeast,
        CompassDirection::South,
        CompassDirection::Southwest,
        CompassDirection::West,
        CompassDirection::Northwest,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Compass angle in degrees, north = 0, clockwise.
    pub fn angle(self) -> f64 {
        self.index() as f64 * SECTOR_DEG
    }

    pub fn opposite(self) -> Self {
        Self::ALL[(self.index() + 4) % 8]
    }

    /// Direction whose sector contains `deg`. North covers [337.5, 360) and [0, 22.5).
    pub fn from_angle(deg: f64) -> Self {
        let mut a = deg % 360.0;
        if a < 0.0 {
            a += 360.0;
        }
        let idx = ((a + HALF_SECTOR_DEG) / SECTOR_DEG).floor() as usize % 8;
        Self::ALL[idx]
    }

    pub fn name(self) -> &'static str {
        match self {
            CompassDirection::North => "North",
            CompassDirection::Northeast => "Northeast",
            CompassDirection::East => "East",
            CompassDirection::Southeast => "Southeast",
            CompassDirection::South => "South",
            CompassDirection::Southwest => "Southwest",
            CompassDirection::West => "West",
            CompassDirection::Northwest => "Northwest",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            CompassDirection::North => "north",
            CompassDirection::Northeast => "northeast",
            CompassDirection::East => "east",
            CompassDirection::Southeast => "southeast",
            CompassDirection::South => "south",
            CompassDirection::Southwest => "southwest",
            CompassDirection::West => "west",
            CompassDirection::Northwest => "northwest",
        }
    }

    fn abbreviation(self) -> &'static str {
        match self {
            CompassDirection::North => "n",
            CompassDirection::Northeast => "ne",
            CompassDirection::East => "e",
            CompassDirection::Southeast => "se",
            CompassDirection::South => "s",
            CompassDirection::Southwest => "sw",
            CompassDirection::West => "w",
            CompassDirection::Northwest => "nw",
        }
    }

    /// Parse a single token such as `Northeast`, `north-east`, `NE` or `northeastern`.
    pub fn parse(token: &str) -> Option<Self> {
        let norm: String = token
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        if norm.is_empty() {
            return None;
        }
        if let Some(d) = Self::ALL.into_iter().find(|d| d.abbreviation() == norm) {
            return Some(d);
        }
        // Longest names first so "northeastern" is not read as "north".
        let mut by_len = Self::ALL;
        by_len.sort_by_key(|d| std::cmp::Reverse(d.slug().len()));
        by_len.into_iter().find(|d| norm.starts_with(d.slug()))
    }
}

impl std::fmt::Display for CompassDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The leading direction of an entry point name. Falls back to the raw first token
/// when no compass word is recognized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryHeading {
    Known(CompassDirection),
    Unknown(String),
}

impl EntryHeading {
    pub fn from_entry_point(name: &str) -> Self {
        let mut tokens = name.split_whitespace();
        let Some(first) = tokens.next() else {
            return EntryHeading::Unknown(String::new());
        };
        match CompassDirection::parse(first) {
            Some(d) => {
                // "North East Gate" reads as northeast.
                let second = tokens.next().and_then(exact_direction);
                EntryHeading::Known(combine(d, second))
            }
            None => EntryHeading::Unknown(first.to_string()),
        }
    }

    /// Placement angle. Unrecognized headings are placed due north.
    pub fn angle(&self) -> f64 {
        match self {
            EntryHeading::Known(d) => d.angle(),
            EntryHeading::Unknown(_) => 0.0,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            EntryHeading::Known(d) => EntryHeading::Known(d.opposite()),
            EntryHeading::Unknown(s) => EntryHeading::Unknown(s.clone()),
        }
    }

    /// Lowercase key for asset lookup.
    pub fn slug(&self) -> String {
        match self {
            EntryHeading::Known(d) => d.slug().to_string(),
            EntryHeading::Unknown(s) => s.to_lowercase(),
        }
    }
}

fn exact_direction(token: &str) -> Option<CompassDirection> {
    CompassDirection::ALL
        .into_iter()
        .find(|d| d.name().eq_ignore_ascii_case(token))
}

fn combine(first: CompassDirection, second: Option<CompassDirection>) -> CompassDirection {
    use CompassDirection::*;
    match (first, second) {
        (North, Some(East)) => Northeast,
        (North, Some(West)) => Northwest,
        (South, Some(East)) => Southeast,
        (South, Some(West)) => Southwest,
        (d, _) => d,
    }
}
