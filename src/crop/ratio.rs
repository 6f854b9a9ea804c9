use crate::geometry::parse_ratio;

/// Ratio choices offered by the crop ratio selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RatioPreset {
    #[default]
    Free,
    Ratio1x1,
    Ratio4x3,
    Ratio3x4,
    Ratio19x9,
    Square,
}

impl RatioPreset {
    pub const ALL: [RatioPreset; 6] = [
        Self::Free,
        Self::Ratio1x1,
        Self::Ratio4x3,
        Self::Ratio3x4,
        Self::Ratio19x9,
        Self::Square,
    ];

    pub const fn is_free(self) -> bool {
        matches!(self, Self::Free)
    }

    /// Value carried by the selector option, parsed with [`parse_ratio`].
    pub const fn token(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Ratio1x1 => "1-1",
            Self::Ratio4x3 => "4-3",
            Self::Ratio3x4 => "3-4",
            Self::Ratio19x9 => "19-9",
            Self::Square => "square",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Free => "Free",
            Self::Ratio1x1 => "1:1",
            Self::Ratio4x3 => "4:3",
            Self::Ratio3x4 => "3:4",
            Self::Ratio19x9 => "19:9",
            Self::Square => "Square",
        }
    }

    pub fn ratio(self) -> f64 {
        parse_ratio(self.token())
    }

    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        Self::ALL
            .into_iter()
            .find(|preset| preset.token().eq_ignore_ascii_case(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::approx_eq;

    #[test]
    fn preset_labels_and_tokens() {
        assert_eq!(RatioPreset::Free.label(), "Free");
        assert_eq!(RatioPreset::Ratio4x3.label(), "4:3");
        assert_eq!(RatioPreset::Ratio19x9.token(), "19-9");
        assert_eq!(RatioPreset::from_token("3-4"), Some(RatioPreset::Ratio3x4));
        assert_eq!(RatioPreset::from_token("2-1"), None);
    }

    #[test]
    fn preset_ratios_resolve_through_token_parsing() {
        assert_eq!(RatioPreset::Free.ratio(), 0.0);
        assert_eq!(RatioPreset::Ratio1x1.ratio(), 1.0);
        assert_eq!(RatioPreset::Square.ratio(), 1.0);
        assert!(approx_eq(RatioPreset::Ratio3x4.ratio(), 0.75));
        assert!(approx_eq(RatioPreset::Ratio19x9.ratio(), 19.0 / 9.0));
    }

    #[test]
    fn preset_all_is_unique() {
        for (i, a) in RatioPreset::ALL.iter().enumerate() {
            for (j, b) in RatioPreset::ALL.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "ALL has duplicate at indices {i} and {j}");
                }
            }
        }
    }
}
