use serde::Serialize;

/// User shown for comments whose author element is missing or empty
pub const ANONYMOUS_USER: &str = "Anonymous";

/// One lettered answer option, in page order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerOption {
    pub letter: char,
    pub text: String,
}

/// A discussion comment under a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    /// Author name, [`ANONYMOUS_USER`] when absent
    pub user: String,

    /// Answer letter the commenter voted for, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_answer: Option<char>,

    /// Comment body with blank lines dropped and each line trimmed
    pub text: String,
}

/// A fully parsed question page
///
/// Built once per successfully fetched link and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionRecord {
    pub title: String,
    pub header: String,
    pub body: String,
    /// Absolute exhibit image URLs, deduplicated, page order
    pub exhibit_urls: Vec<String>,
    /// Options in insertion order; letters are unique
    pub options: Vec<AnswerOption>,
    /// Correct letters in order, no duplicates, never empty
    pub correct_answers: Vec<char>,
    pub timestamp: String,
    /// Absolute URL of the discussion page
    pub source_link: String,
    pub comments: Vec<Comment>,
}

impl QuestionRecord {
    /// Records without a title carry no usable content and are not emitted
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty()
    }

    pub fn option(&self, letter: char) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.letter == letter)
    }

    /// Correct letters joined for display, e.g. "BD"
    pub fn correct_answer_text(&self) -> String {
        self.correct_answers.iter().collect()
    }
}
