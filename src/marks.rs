use regex::Regex;

/// Mark values recognised when none are configured.
pub const DEFAULT_MARKS: [u8; 5] = [1, 2, 5, 10, 12];

/// Detects an exam-mark weight ("10 marks", "for 2 marks") in a question.
#[derive(Debug, Clone)]
pub struct MarkScheme {
    patterns: Vec<Regex>,
}

impl Default for MarkScheme {
    fn default() -> Self {
        Self::new(&DEFAULT_MARKS)
    }
}

impl MarkScheme {
    pub fn new(marks: &[u8]) -> Self {
        let mut marks = marks.to_vec();
        marks.sort_unstable();
        marks.dedup();

        let alternatives = marks
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join("|");

        let patterns = if marks.is_empty() {
            Vec::new()
        } else {
            // Both patterns are built from digits only, so they always compile.
            [
                format!(r"\b({})\b\s*marks?", alternatives),
                format!(r"\bfor\s*({})\s*marks?\b", alternatives),
            ]
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect()
        };

        Self { patterns }
    }

    /// Returns the first mark value found, or `None` when the question does
    /// not specify one.
    pub fn detect_marks(&self, question: &str) -> Option<u8> {
        let lowered = question.to_lowercase();
        self.patterns.iter().find_map(|re| {
            re.captures(&lowered)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<u8>().ok())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_marks() {
        let scheme = MarkScheme::default();
        assert_eq!(scheme.detect_marks("Explain photosynthesis for 10 marks"), Some(10));
        assert_eq!(scheme.detect_marks("What is osmosis?"), None);
        assert_eq!(scheme.detect_marks("2 mark definition of inertia"), Some(2));
        assert_eq!(scheme.detect_marks("What is the mitochondria, 1 mark?"), Some(1));
        assert_eq!(scheme.detect_marks("Describe the cell cycle (12 MARKS)"), Some(12));
        assert_eq!(scheme.detect_marks("Write a 5 mark answer on DNA"), Some(5));
        // digits glued to the word are not a mark value
        assert_eq!(scheme.detect_marks("Write a 5marks answer on DNA"), None);
    }

    #[test]
    fn test_first_match_wins() {
        let scheme = MarkScheme::default();
        assert_eq!(scheme.detect_marks("2 marks or 10 marks?"), Some(2));
    }

    #[test]
    fn test_ignores_unconfigured_values() {
        let scheme = MarkScheme::default();
        assert_eq!(scheme.detect_marks("Explain for 3 marks"), None);
        assert_eq!(scheme.detect_marks("Chapter 12 remarks"), None);
        assert_eq!(scheme.detect_marks("112 marks"), None);

        let without_five = MarkScheme::new(&[1, 2, 10, 12]);
        assert_eq!(without_five.detect_marks("Explain osmosis for 5 marks"), None);
        assert_eq!(without_five.detect_marks("Explain osmosis for 10 marks"), Some(10));
    }

    #[test]
    fn test_empty_scheme_detects_nothing() {
        let scheme = MarkScheme::new(&[]);
        assert_eq!(scheme.detect_marks("Explain for 10 marks"), None);
    }
}
