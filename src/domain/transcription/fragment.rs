//! Transcript fragments and their reassembly

/// Separator placed between consecutive fragments
pub const FRAGMENT_SEPARATOR: &str = "\n";

/// Text of one transcribed segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptFragment {
    pub order: u32,
    pub text: String,
}

impl TranscriptFragment {
    pub fn new(order: u32, text: impl Into<String>) -> Self {
        Self {
            order,
            text: text.into(),
        }
    }
}

/// Join fragments in ascending `order`, whatever order they arrived in.
pub fn reassemble(mut fragments: Vec<TranscriptFragment>) -> String {
    fragments.sort_by_key(|f| f.order);
    fragments
        .into_iter()
        .map(|f| f.text)
        .collect::<Vec<_>>()
        .join(FRAGMENT_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_in_order_regardless_of_arrival() {
        let fragments = vec![
            TranscriptFragment::new(2, "c"),
            TranscriptFragment::new(0, "a"),
            TranscriptFragment::new(1, "b"),
        ];
        assert_eq!(reassemble(fragments), "a\nb\nc");
    }

    #[test]
    fn single_fragment_has_no_separator() {
        assert_eq!(reassemble(vec![TranscriptFragment::new(0, "only")]), "only");
    }

    #[test]
    fn empty_input_is_empty_text() {
        assert_eq!(reassemble(Vec::new()), "");
    }
}
