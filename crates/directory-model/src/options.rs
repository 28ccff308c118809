use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Designation {
    Developer,
    Designer,
    Manager,
    Tester,
    DevOps,
}

impl Designation {
    pub const ALL: [Designation; 5] = [
        Designation::Developer,
        Designation::Designer,
        Designation::Manager,
        Designation::Tester,
        Designation::DevOps,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Designation::Developer => "Developer",
            Designation::Designer => "Designer",
            Designation::Manager => "Manager",
            Designation::Tester => "Tester",
            Designation::DevOps => "DevOps",
        }
    }
}

impl fmt::Display for Designation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Designation {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Designation::ALL
            .into_iter()
            .find(|d| d.as_str() == s.trim())
            .ok_or_else(|| UnknownOption(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Favorite {
    Reading,
    Sports,
    Music,
    Movies,
    Travel,
    Cooking,
}

impl Favorite {
    pub const ALL: [Favorite; 6] = [
        Favorite::Reading,
        Favorite::Sports,
        Favorite::Music,
        Favorite::Movies,
        Favorite::Travel,
        Favorite::Cooking,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Favorite::Reading => "Reading",
            Favorite::Sports => "Sports",
            Favorite::Music => "Music",
            Favorite::Movies => "Movies",
            Favorite::Travel => "Travel",
            Favorite::Cooking => "Cooking",
        }
    }
}

impl fmt::Display for Favorite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Favorite {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Favorite::ALL
            .into_iter()
            .find(|f| f.as_str() == s.trim())
            .ok_or_else(|| UnknownOption(s.to_string()))
    }
}

/// Returned when a string does not name one of the fixed options.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown option: {0}")]
pub struct UnknownOption(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_names_parse_back() {
        for d in Designation::ALL {
            assert_eq!(d.as_str().parse::<Designation>(), Ok(d));
        }
        for f in Favorite::ALL {
            assert_eq!(f.as_str().parse::<Favorite>(), Ok(f));
        }
    }

    #[test]
    fn unknown_designation_is_rejected() {
        assert_eq!(
            "Astronaut".parse::<Designation>(),
            Err(UnknownOption("Astronaut".to_string()))
        );
    }

    #[test]
    fn designation_serializes_as_plain_name() {
        let json = serde_json::to_string(&Designation::DevOps).unwrap();
        assert_eq!(json, "\"DevOps\"");
    }
}
