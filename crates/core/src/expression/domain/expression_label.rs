use crate::expression::domain::expression_state::ExpressionState;

/// Discrete facial expression, one per overlay asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExpressionLabel {
    Neutral,
    Smile,
    LeftWink,
    RightWink,
    LeftWinkOpen,
    RightWinkOpen,
}

impl ExpressionLabel {
    pub const ALL: [ExpressionLabel; 6] = [
        ExpressionLabel::Neutral,
        ExpressionLabel::Smile,
        ExpressionLabel::LeftWink,
        ExpressionLabel::RightWink,
        ExpressionLabel::LeftWinkOpen,
        ExpressionLabel::RightWinkOpen,
    ];

    /// Fixed precedence: smiling winks, then smile, then plain winks.
    ///
    /// Both eyes closed without a smile resolves to `LeftWink`; there is no
    /// separate "eyes shut" label.
    pub fn from_state(state: &ExpressionState) -> Self {
        match (
            state.has_smile,
            state.left_eye_closed,
            state.right_eye_closed,
        ) {
            (true, true, _) => ExpressionLabel::LeftWinkOpen,
            (true, false, true) => ExpressionLabel::RightWinkOpen,
            (true, false, false) => ExpressionLabel::Smile,
            (false, true, _) => ExpressionLabel::LeftWink,
            (false, false, true) => ExpressionLabel::RightWink,
            (false, false, false) => ExpressionLabel::Neutral,
        }
    }

    /// File stem of the overlay image for this label.
    pub fn asset_name(&self) -> &'static str {
        match self {
            ExpressionLabel::Neutral => "neutral",
            ExpressionLabel::Smile => "smile",
            ExpressionLabel::LeftWink => "left_wink",
            ExpressionLabel::RightWink => "right_wink",
            ExpressionLabel::LeftWinkOpen => "left_wink_open",
            ExpressionLabel::RightWinkOpen => "right_wink_open",
        }
    }

    /// Emoji shown in the text label view.
    pub fn glyph(&self) -> &'static str {
        match self {
            ExpressionLabel::Neutral => "😐",
            ExpressionLabel::Smile => "😃",
            ExpressionLabel::LeftWink | ExpressionLabel::RightWink => "😉",
            ExpressionLabel::LeftWinkOpen | ExpressionLabel::RightWinkOpen => "😜",
        }
    }
}

impl std::fmt::Display for ExpressionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.asset_name())
    }
}

impl std::str::FromStr for ExpressionLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExpressionLabel::ALL
            .into_iter()
            .find(|label| label.asset_name() == s)
            .ok_or_else(|| format!("Unknown expression label '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn state(smile: bool, left: bool, right: bool) -> ExpressionState {
        ExpressionState {
            face_detected: true,
            has_smile: smile,
            left_eye_closed: left,
            right_eye_closed: right,
            ..ExpressionState::default()
        }
    }

    #[rstest]
    #[case::smile_left(true, true, false, ExpressionLabel::LeftWinkOpen)]
    #[case::smile_both(true, true, true, ExpressionLabel::LeftWinkOpen)]
    #[case::smile_right(true, false, true, ExpressionLabel::RightWinkOpen)]
    #[case::smile(true, false, false, ExpressionLabel::Smile)]
    #[case::left(false, true, false, ExpressionLabel::LeftWink)]
    #[case::both_closed(false, true, true, ExpressionLabel::LeftWink)]
    #[case::right(false, false, true, ExpressionLabel::RightWink)]
    #[case::neutral(false, false, false, ExpressionLabel::Neutral)]
    fn test_precedence(
        #[case] smile: bool,
        #[case] left: bool,
        #[case] right: bool,
        #[case] expected: ExpressionLabel,
    ) {
        assert_eq!(
            ExpressionLabel::from_state(&state(smile, left, right)),
            expected
        );
    }

    #[test]
    fn test_asset_names_roundtrip_through_from_str() {
        for label in ExpressionLabel::ALL {
            assert_eq!(label.asset_name().parse::<ExpressionLabel>(), Ok(label));
        }
    }

    #[test]
    fn test_unknown_name_rejected() {
        assert!("sleep".parse::<ExpressionLabel>().is_err());
    }

    #[test]
    fn test_glyphs() {
        assert_eq!(ExpressionLabel::Neutral.glyph(), "😐");
        assert_eq!(ExpressionLabel::RightWink.glyph(), "😉");
        assert_eq!(ExpressionLabel::LeftWinkOpen.glyph(), "😜");
    }
}
