use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed palette. Unknown tokens from older data round-trip untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TagColor {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Unknown(String),
}

impl TagColor {
    pub const PALETTE: [TagColor; 6] = [
        TagColor::Red,
        TagColor::Orange,
        TagColor::Yellow,
        TagColor::Green,
        TagColor::Blue,
        TagColor::Purple,
    ];

    pub fn parse(s: &str) -> Self {
        match s {
            "red" => TagColor::Red,
            "orange" => TagColor::Orange,
            "yellow" => TagColor::Yellow,
            "green" => TagColor::Green,
            "blue" => TagColor::Blue,
            "purple" => TagColor::Purple,
            other => TagColor::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TagColor::Red => "red",
            TagColor::Orange => "orange",
            TagColor::Yellow => "yellow",
            TagColor::Green => "green",
            TagColor::Blue => "blue",
            TagColor::Purple => "purple",
            TagColor::Unknown(s) => s,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub color: TagColor,
}

impl Tag {
    pub fn new(name: impl Into<String>, color: TagColor) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_round_trip() {
        for color in TagColor::PALETTE {
            assert_eq!(TagColor::parse(color.as_str()), color);
        }
    }

    #[test]
    fn test_unknown_color_preserved() {
        let color = TagColor::parse("magenta");
        assert_eq!(color, TagColor::Unknown("magenta".into()));
        assert_eq!(color.as_str(), "magenta");
    }
}
