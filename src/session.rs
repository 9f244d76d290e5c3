use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Upload {
    pub name: String,
    pub size_bytes: usize,
    pub pages: usize,
    pub chunks: usize,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub question: String,
    pub answer: String,
    pub saved_at: DateTime<Utc>,
}

/// State of one user's study session. Created when the user starts and
/// dropped when they leave; nothing here is shared between sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudySession {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    max_history: usize,
    messages: Vec<Message>,
    uploads: Vec<Upload>,
    bookmarks: Vec<Bookmark>,
    question_count: usize,
    error_count: usize,
    last_error: Option<String>,
}

impl StudySession {
    pub fn new(max_history: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            max_history: max_history.max(2),
            messages: Vec::new(),
            uploads: Vec::new(),
            bookmarks: Vec::new(),
            question_count: 0,
            error_count: 0,
            last_error: None,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn uploads(&self) -> &[Upload] {
        &self.uploads
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    pub fn question_count(&self) -> usize {
        self.question_count
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Record a question and its answer. Older messages are dropped once
    /// the history cap is reached.
    pub fn record_exchange(&mut self, question: &str, answer: &str) {
        let now = Utc::now();
        self.question_count += 1;
        self.messages.push(Message {
            role: Role::User,
            content: question.to_string(),
            timestamp: now,
        });
        self.messages.push(Message {
            role: Role::Assistant,
            content: answer.to_string(),
            timestamp: now,
        });
        if self.messages.len() > self.max_history {
            let excess = self.messages.len() - self.max_history;
            self.messages.drain(..excess);
        }
    }

    pub fn record_error(&mut self, error: impl Into<String>) {
        self.error_count += 1;
        self.last_error = Some(error.into());
    }

    pub fn record_upload(&mut self, name: &str, size_bytes: usize, pages: usize, chunks: usize) {
        self.uploads.push(Upload {
            name: name.to_string(),
            size_bytes,
            pages,
            chunks,
            uploaded_at: Utc::now(),
        });
    }

    /// The most recent question/answer pair, if any.
    pub fn last_exchange(&self) -> Option<(&str, &str)> {
        let n = self.messages.len();
        if n < 2 {
            return None;
        }
        match (&self.messages[n - 2], &self.messages[n - 1]) {
            (q, a) if q.role == Role::User && a.role == Role::Assistant => {
                Some((q.content.as_str(), a.content.as_str()))
            }
            _ => None,
        }
    }

    /// Bookmark a question/answer pair. Returns `false` if it is already saved.
    pub fn add_bookmark(&mut self, question: &str, answer: &str) -> bool {
        if self
            .bookmarks
            .iter()
            .any(|b| b.question == question && b.answer == answer)
        {
            return false;
        }
        self.bookmarks.push(Bookmark {
            question: question.to_string(),
            answer: answer.to_string(),
            saved_at: Utc::now(),
        });
        true
    }

    pub fn remove_bookmark(&mut self, position: usize) -> Option<Bookmark> {
        if position < self.bookmarks.len() {
            Some(self.bookmarks.remove(position))
        } else {
            None
        }
    }

    pub fn clear_history(&mut self) {
        self.messages.clear();
    }

    /// Plain-text chat transcript.
    pub fn export_text(&self) -> String {
        let mut out = format!(
            "Exam Assistant chat export\nSession: {}\nExported: {}\n\n",
            self.id,
            Utc::now().format("%Y-%m-%d %H:%M")
        );
        for message in &self.messages {
            let speaker = match message.role {
                Role::User => "You",
                Role::Assistant => "Assistant",
            };
            out.push_str(&format!(
                "[{}] {}: {}\n\n",
                message.timestamp.format("%H:%M"),
                speaker,
                message.content
            ));
        }
        out
    }

    /// Study notes: bookmarks first, then the conversation.
    pub fn export_markdown(&self) -> String {
        let mut out = format!(
            "# Study Notes\n\n_Generated {}_\n\n",
            Utc::now().format("%Y-%m-%d %H:%M")
        );

        if !self.bookmarks.is_empty() {
            out.push_str("## Bookmarked Answers\n\n");
            for (i, bookmark) in self.bookmarks.iter().enumerate() {
                out.push_str(&format!(
                    "### {}. {}\n\n{}\n\n",
                    i + 1,
                    bookmark.question,
                    bookmark.answer
                ));
            }
        }

        if !self.messages.is_empty() {
            out.push_str("## Conversation\n\n");
            for message in &self.messages {
                match message.role {
                    Role::User => out.push_str(&format!("**Q:** {}\n\n", message.content)),
                    Role::Assistant => out.push_str(&format!("{}\n\n---\n\n", message.content)),
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_is_capped() {
        let mut session = StudySession::new(4);
        for i in 0..5 {
            session.record_exchange(&format!("q{}", i), &format!("a{}", i));
        }
        assert_eq!(session.question_count(), 5);
        assert_eq!(session.messages().len(), 4);
        assert_eq!(session.messages()[0].content, "q3");
        assert_eq!(session.last_exchange(), Some(("q4", "a4")));
    }

    #[test]
    fn test_bookmarks() {
        let mut session = StudySession::new(50);
        assert!(session.add_bookmark("What is osmosis?", "Diffusion of water."));
        assert!(!session.add_bookmark("What is osmosis?", "Diffusion of water."));
        assert!(session.add_bookmark("Define inertia", "Resistance to change."));
        assert_eq!(session.bookmarks().len(), 2);

        let removed = session.remove_bookmark(0).unwrap();
        assert_eq!(removed.question, "What is osmosis?");
        assert!(session.remove_bookmark(5).is_none());
        assert_eq!(session.bookmarks().len(), 1);
    }

    #[test]
    fn test_errors_and_uploads() {
        let mut session = StudySession::new(50);
        session.record_error("generation timed out");
        session.record_upload("bio.pdf", 2048, 3, 7);
        assert_eq!(session.error_count(), 1);
        assert_eq!(session.last_error(), Some("generation timed out"));
        assert_eq!(session.uploads()[0].pages, 3);
    }

    #[test]
    fn test_exports() {
        let mut session = StudySession::new(50);
        session.record_exchange("What is osmosis?", "Diffusion of water.");
        session.add_bookmark("What is osmosis?", "Diffusion of water.");

        let text = session.export_text();
        assert!(text.contains("You: What is osmosis?"));
        assert!(text.contains("Assistant: Diffusion of water."));

        let markdown = session.export_markdown();
        assert!(markdown.starts_with("# Study Notes"));
        assert!(markdown.contains("### 1. What is osmosis?"));
        assert!(markdown.contains("**Q:** What is osmosis?"));

        session.clear_history();
        assert!(session.messages().is_empty());
        assert!(session.last_exchange().is_none());
        assert_eq!(session.question_count(), 1);
    }
}
