//! Prompt templates for grounded and direct answers.

/// What the model must say when the context does not contain the answer.
pub const NOT_IN_CONTEXT: &str = "I don't know based on the given syllabus.";

const GENERIC_GUIDANCE: &str = "Give a clear, exam-oriented explanation.";

/// Answer-length instruction for a detected mark value.
pub fn guidance(mark: Option<u8>) -> String {
    match mark {
        None => GENERIC_GUIDANCE.to_string(),
        Some(1) => "Provide a one-line definition suitable for 1 mark.".to_string(),
        Some(2) => "Provide 2-3 concise bullet points suitable for 2 marks.".to_string(),
        Some(5) => {
            "Provide a structured explanation with key points suitable for 5 marks.".to_string()
        }
        Some(10) => "Provide a detailed, structured explanation suitable for 10 marks.".to_string(),
        Some(12) => {
            "Provide a comprehensive, well-structured explanation with headings, points and examples suitable for 12 marks."
                .to_string()
        }
        Some(n) => format!("Provide an answer of appropriate length for {} marks.", n),
    }
}

/// Build the retrieval-augmented prompt. Chunks appear in retrieval order.
pub fn assemble<S: AsRef<str>>(question: &str, chunks: &[S], mark: Option<u8>) -> String {
    let context = chunks
        .iter()
        .map(|c| c.as_ref().trim())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    let marks_line = match mark {
        Some(m) => format!("Marks: {}\n", m),
        None => String::new(),
    };

    format!(
        "You are an intelligent Exam Assistant.\n\
         Answer strictly based on the syllabus context below. Use only the information in the context. \
         If the answer is not in the context, say: \"{not_found}\"\n\
         Keep formatting clean and structured. Do not ask the user to specify marks.\n\
         \n\
         Context:\n\
         {context}\n\
         \n\
         Question:\n\
         {question}\n\
         \n\
         {marks_line}\
         Instruction: {guidance}\n\
         \n\
         Answer:",
        not_found = NOT_IN_CONTEXT,
        context = context,
        question = question.trim(),
        marks_line = marks_line,
        guidance = guidance(mark),
    )
}

/// Prompt used when no document has been indexed.
pub fn direct(question: &str, mark: Option<u8>) -> String {
    match mark {
        Some(m) => format!("{}\n\nMarks: {}\n{}", question.trim(), m, guidance(mark)),
        None => format!("{}\n\n{}", question.trim(), guidance(None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_includes_context_in_order() {
        let prompt = assemble("What is osmosis?", &["first chunk", "second chunk"], None);
        let first = prompt.find("first chunk").unwrap();
        let second = prompt.find("second chunk").unwrap();
        let question = prompt.find("What is osmosis?").unwrap();
        assert!(first < second && second < question);
        assert!(prompt.contains(GENERIC_GUIDANCE));
        assert!(!prompt.contains("Marks:"));
    }

    #[test]
    fn test_assemble_carries_grounding_contract() {
        let prompt = assemble("q", &["ctx"], Some(10));
        assert!(prompt.contains("Answer strictly based on the syllabus context"));
        assert!(prompt.contains(NOT_IN_CONTEXT));
        assert!(prompt.contains("Marks: 10"));
        assert!(prompt.contains("detailed, structured explanation"));
        assert!(prompt.trim_end().ends_with("Answer:"));
    }

    #[test]
    fn test_guidance_per_mark() {
        assert!(guidance(Some(1)).contains("one-line definition"));
        assert!(guidance(Some(2)).contains("bullet points"));
        assert!(guidance(Some(5)).contains("key points"));
        assert!(guidance(Some(12)).contains("comprehensive"));
        assert!(guidance(Some(7)).contains("7 marks"));
        assert_eq!(guidance(None), GENERIC_GUIDANCE);
    }

    #[test]
    fn test_direct_prompt() {
        assert_eq!(
            direct("Define inertia ", Some(1)),
            "Define inertia\n\nMarks: 1\nProvide a one-line definition suitable for 1 mark."
        );
        assert!(direct("Explain Newton's second law", None).starts_with("Explain Newton's second law"));
    }
}
