//! Record types produced by a harvest
//!
//! - [`QuestionRecord`] and its [`Comment`]s and [`AnswerOption`]s
//! - [`DiscussionLink`], the deduplication and ordering key of a question

mod link;
mod question;

pub use link::{dedup_links, sort_links, DiscussionLink};
pub use question::{AnswerOption, Comment, QuestionRecord, ANONYMOUS_USER};
