//! Declarative render values handed to the host shell.

use std::ops::Range;

use hex_color::HexColor;

/// Relative size applied to de-emphasised spans (day-of-week and AM/PM
/// markers).
pub const REDUCED_EMPHASIS: f32 = 0.7;

/// Text size the shell should use for the whole instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSize {
    /// One line of text.
    Single,
    /// Two stacked lines (both transfer directions shown).
    Multi,
}

/// Icon the shell should display next to (or instead of) the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    TrafficUp,
    TrafficDown,
    TrafficUpDown,
}

/// Style metadata for a byte range of the instruction text.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledSpan {
    pub range: Range<usize>,
    pub color: Option<HexColor>,
    pub relative_size: f32,
}

impl StyledSpan {
    /// Span carrying only a color override.
    pub fn colored(range: Range<usize>, color: HexColor) -> Self {
        Self {
            range,
            color: Some(color),
            relative_size: 1.0,
        }
    }

    /// Span rendered at [`REDUCED_EMPHASIS`] size.
    pub fn reduced(range: Range<usize>) -> Self {
        Self {
            range,
            color: None,
            relative_size: REDUCED_EMPHASIS,
        }
    }
}

/// Everything the shell needs to render one indicator state.
///
/// Pure value; the shell owns all actual drawing and visibility side effects.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderInstruction {
    pub text: String,
    pub spans: Vec<StyledSpan>,
    /// Base text color; spans may override sub-ranges.
    pub color: HexColor,
    pub text_size: TextSize,
    pub icon: Option<Icon>,
    pub icon_tint: HexColor,
    pub visible: bool,
}

impl RenderInstruction {
    /// Instruction telling the shell to blank the display.
    pub fn hidden() -> Self {
        Self {
            text: String::new(),
            spans: Vec::new(),
            color: HexColor::WHITE,
            text_size: TextSize::Single,
            icon: None,
            icon_tint: HexColor::WHITE,
            visible: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_instruction_is_blank() {
        let instruction = RenderInstruction::hidden();
        assert!(!instruction.visible);
        assert!(instruction.text.is_empty());
        assert!(instruction.spans.is_empty());
        assert!(instruction.icon.is_none());
    }

    #[test]
    fn reduced_span_uses_emphasis_constant() {
        let span = StyledSpan::reduced(0..3);
        assert_eq!(span.relative_size, REDUCED_EMPHASIS);
        assert!(span.color.is_none());
    }
}
