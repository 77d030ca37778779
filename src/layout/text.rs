pub const ELLIPSIS: &str = "...";

/// Width of rendered text, supplied by the drawing backend.
pub trait TextMeasure {
    fn text_width(&self, text: &str) -> f32;
}

/// Every character advances by the same amount. Useful headless and in tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedAdvance(pub f32);

impl TextMeasure for FixedAdvance {
    fn text_width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.0
    }
}

/// Longest prefix of `text` that fits in `available` pixels, with an ellipsis
/// when truncated. Falls back to `"."` and then to `""` when nothing fits.
pub fn fit_text(measure: &dyn TextMeasure, available: f32, text: &str) -> String {
    if measure.text_width(text) <= available {
        return text.to_string();
    }

    let mut fitted: Option<&str> = None;
    for (end, _) in text.char_indices().skip(1) {
        let prefix = &text[..end];
        if measure.text_width(&format!("{prefix}{ELLIPSIS}")) <= available {
            fitted = Some(prefix);
        } else {
            break;
        }
    }

    match fitted {
        Some(prefix) => format!("{prefix}{ELLIPSIS}"),
        None if measure.text_width(".") <= available => ".".to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const M: FixedAdvance = FixedAdvance(10.0);

    #[test]
    fn keeps_text_that_fits() {
        assert_eq!(fit_text(&M, 100.0, "Design"), "Design");
    }

    #[test]
    fn truncates_with_ellipsis() {
        // "Des..." is 60px.
        assert_eq!(fit_text(&M, 65.0, "Design review"), "Des...");
    }

    #[test]
    fn falls_back_to_dot_then_empty() {
        assert_eq!(fit_text(&M, 35.0, "Design"), ".");
        assert_eq!(fit_text(&M, 5.0, "Design"), "");
        assert_eq!(fit_text(&M, 0.0, "Design"), "");
    }

    #[test]
    fn respects_char_boundaries() {
        assert_eq!(fit_text(&M, 50.0, "Übergabe"), "Üb...");
    }
}
