use regex::Regex;

/// Longer messages are treated as real questions even if they open with a greeting.
pub const SMALL_TALK_MAX_WORDS: usize = 8;

pub const GREETING_REPLY: &str =
    "Hi there! I'm your Exam Assistant. Upload your syllabus PDF and ask me any questions!";
pub const EXAM_PREP_REPLY: &str = "Let's get you ready! Upload your syllabus PDF and I'll help you with quick definitions (1-2 marks) and detailed explanations (10-12 marks). What topic shall we start with?";
pub const THANKS_REPLY: &str =
    "You're welcome! Need help with more questions? I'm here to help you ace your exam!";
pub const FAREWELL_REPLY: &str = "Good luck with your studies! Come back anytime you need help!";

/// Canned replies for greetings, thanks and farewells.
#[derive(Debug, Clone)]
pub struct SmallTalk {
    rules: Vec<(Regex, &'static str)>,
}

impl Default for SmallTalk {
    fn default() -> Self {
        Self::new()
    }
}

impl SmallTalk {
    pub fn new() -> Self {
        let table: [(&str, &'static str); 4] = [
            (
                r"^\W*(hi+|hello|hey|good (morning|afternoon|evening))\b",
                GREETING_REPLY,
            ),
            (
                r"\bexams?\b.*\b(tomorrow|today|help me)\b|\b(tomorrow|today|help me)\b.*\bexams?\b",
                EXAM_PREP_REPLY,
            ),
            (r"\b(thanks|thank you|thank u|thx)\b", THANKS_REPLY),
            (r"\b(bye|goodbye|see you)\b", FAREWELL_REPLY),
        ];

        // Static patterns; a failure here is a typo caught by the tests.
        let rules = table
            .iter()
            .filter_map(|(p, reply)| Regex::new(p).ok().map(|re| (re, *reply)))
            .collect();

        Self { rules }
    }

    /// The canned reply for `input`, or `None` if it should go to the pipeline.
    pub fn reply(&self, input: &str) -> Option<&'static str> {
        let text = input.trim().to_lowercase();
        if text.is_empty() || text.split_whitespace().count() > SMALL_TALK_MAX_WORDS {
            return None;
        }
        self.rules
            .iter()
            .find(|(re, _)| re.is_match(&text))
            .map(|(_, reply)| *reply)
    }

    pub fn is_small_talk(&self, input: &str) -> bool {
        self.reply(input).is_some()
    }
}
