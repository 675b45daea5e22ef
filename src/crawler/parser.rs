//! HTML extraction for listing and question pages
//!
//! This module turns raw markup into:
//! - Listing page counts and declared category counts
//! - Provider sets (exam index and discussion index strategies)
//! - Discussion link sets and official exam slugs
//! - Question records with options, answers, exhibits and comments
//!
//! Nothing here fails. Markup that does not have the expected shape degrades
//! to documented defaults (one page, positional options, first-option answer).

use crate::model::{dedup_links, AnswerOption, Comment, DiscussionLink, QuestionRecord, ANONYMOUS_USER};
use crate::url::{first_srcset_url, normalize_discussion_href, normalize_exhibit_url, Site};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Letters assigned to answer options
const OPTION_LETTERS: [char; 6] = ['A', 'B', 'C', 'D', 'E', 'F'];

/// Image attributes that may carry an exhibit URL, in lookup order
const EXHIBIT_ATTRIBUTES: [&str; 4] = ["src", "data-src", "data-original", "data-lazy-src"];

struct Selectors {
    anchor: Selector,
    page_indicator: Selector,
    page_indicator_strong: Selector,
    span: Selector,
    discussion_row: Selector,
    discussion_replies: Selector,
    title: Selector,
    header: Selector,
    body: Selector,
    option: Selector,
    correct_answer: Selector,
    timestamp: Selector,
    exhibit_image: Selector,
    comment: Selector,
    comment_user: Selector,
    comment_answer_strong: Selector,
    comment_answer: Selector,
    comment_content: Selector,
}

fn selectors() -> &'static Selectors {
    static SELECTORS: OnceLock<Selectors> = OnceLock::new();
    SELECTORS.get_or_init(|| {
        let parse = |css: &str| Selector::parse(css).expect("static selector is valid");
        Selectors {
            anchor: parse("a[href]"),
            page_indicator: parse(".discussion-list-page-indicator"),
            page_indicator_strong: parse(".discussion-list-page-indicator strong"),
            span: parse("span"),
            discussion_row: parse(".discussion-row"),
            discussion_replies: parse(".discussion-stats-replies"),
            title: parse("h1"),
            header: parse(".question-discussion-header"),
            body: parse(".card-text"),
            option: parse("li.multi-choice-item"),
            correct_answer: parse(".correct-answer"),
            timestamp: parse(".discussion-meta-data > i"),
            exhibit_image: parse(".card-text img"),
            comment: parse(".discussion-container .comment-container"),
            comment_user: parse(".comment-username"),
            comment_answer_strong: parse(".comment-selected-answers strong"),
            comment_answer: parse(".comment-selected-answers"),
            comment_content: parse(".comment-content"),
        }
    })
}

struct Patterns {
    exam_index_href: Regex,
    discussion_index_href: Regex,
    non_digits: Regex,
    whitespace: Regex,
    option_dot: Regex,
    option_colon: Regex,
    answer_label: Regex,
    suggested_answer: Regex,
    answer_run: Regex,
    comment_letter: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let compile = |re: &str| Regex::new(re).expect("static pattern is valid");
        Patterns {
            exam_index_href: compile(r"^/exams/([a-z0-9-]+)/?$"),
            discussion_index_href: compile(r"^/discussions/([a-z0-9-]+)/?$"),
            non_digits: compile(r"\D+"),
            whitespace: compile(r"\s+"),
            option_dot: compile(r"^([A-F])\.\s*(.*)$"),
            option_colon: compile(r"^([A-F]):\s*(.*)$"),
            answer_label: compile(r"(?i)^\s*(?:correct|suggested)\s+answers?\s*:?\s*"),
            suggested_answer: compile(r"(?i)suggested\s+answer"),
            answer_run: compile(r"\b([A-F]+)\b"),
            comment_letter: compile(r"\b([A-F])\b"),
        }
    })
}

/// Concatenated text of every element matching `selector`
fn select_text(document: &Html, selector: &Selector) -> String {
    document
        .select(selector)
        .flat_map(|element| element.text())
        .collect()
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

fn first_text_within(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element.select(selector).next().map(element_text)
}

fn lowercase_hrefs(document: &Html) -> impl Iterator<Item = String> + '_ {
    document
        .select(&selectors().anchor)
        .filter_map(|a| a.value().attr("href"))
        .map(|href| href.trim().to_lowercase())
}

/// Collapses whitespace and strips vote-box emoji and login boilerplate
///
/// The first "Suggested Answer" label is moved onto its own line so it can
/// be cut from question bodies later.
///
/// # Examples
///
/// ```
/// use exam_harvest::crawler::parser::clean_text;
///
/// assert_eq!(clean_text("  Which\n\tprotocol?  🗳️ "), "Which protocol?");
/// assert_eq!(
///     clean_text("Pick one. Suggested Answer: B"),
///     "Pick one. \nSuggested Answer: B"
/// );
/// ```
pub fn clean_text(raw: &str) -> String {
    let raw = raw.trim().replace("🗳️", "").replace('🗳', "");
    let collapsed = patterns().whitespace.replace_all(&raw, " ");
    collapsed
        .trim()
        .replacen("Suggested Answer", "\nSuggested Answer", 1)
        .replace("Forgot my password", "")
}

/// Cuts everything from the "Suggested Answer" label onwards
pub fn remove_suggested_answer_text(text: &str) -> String {
    match patterns().suggested_answer.find(text) {
        Some(label) => text[..label.start()].trim_end().to_string(),
        None => text.trim().to_string(),
    }
}

/// Unifies line endings, trims every line and drops blank lines
pub fn normalize_comment_text(raw: &str) -> String {
    raw.replace("\r\n", "\n")
        .replace('\r', "\n")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reads the listing page count from the pagination indicator
///
/// The count is the second `<strong>` inside the indicator. A missing,
/// unparseable or zero count yields 1.
pub fn page_count(html: &str) -> u32 {
    let document = Html::parse_document(html);
    document
        .select(&selectors().page_indicator_strong)
        .nth(1)
        .and_then(|strong| element_text(strong).trim().parse::<u32>().ok())
        .filter(|&count| count > 0)
        .unwrap_or(1)
}

/// Parses a reply/discussion counter such as "1,234 discussions"
///
/// Non-digits are stripped; text with no digits reads as 0.
pub fn parse_discussion_count(raw: &str) -> u64 {
    let digits = patterns().non_digits.replace_all(raw, "");
    digits.parse().unwrap_or(0)
}

/// Reads the number of categories the discussion index declares
///
/// Returns the first positive number among the spans of the first
/// pagination indicator, if any.
pub fn discussion_category_count(html: &str) -> Option<u64> {
    let document = Html::parse_document(html);
    let indicator = document.select(&selectors().page_indicator).next()?;
    indicator
        .select(&selectors().span)
        .map(|span| parse_discussion_count(&element_text(span)))
        .find(|&count| count > 0)
}

/// Providers linked from the exam index (`/exams/<provider>/`)
pub fn providers_from_exam_index(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let providers: BTreeSet<String> = lowercase_hrefs(&document)
        .filter_map(|href| capture(&patterns().exam_index_href, &href))
        .collect();
    providers.into_iter().collect()
}

/// Providers listed on the discussion index
///
/// Rows are kept when their reply counter is missing, blank, or a positive
/// number. When no row yields a provider, every `/discussions/<provider>/`
/// link on the page is used instead.
pub fn providers_from_discussions(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let sel = selectors();
    let href_pattern = &patterns().discussion_index_href;

    let mut providers = BTreeSet::new();
    for row in document.select(&sel.discussion_row) {
        let provider = row
            .select(&sel.anchor)
            .filter_map(|a| a.value().attr("href"))
            .find_map(|href| capture(href_pattern, &href.trim().to_lowercase()));
        let Some(provider) = provider else {
            continue;
        };

        if let Some(counter) = first_text_within(row, &sel.discussion_replies) {
            if !counter.trim().is_empty() && parse_discussion_count(&counter) == 0 {
                continue;
            }
        }

        providers.insert(provider);
    }

    if providers.is_empty() {
        providers = lowercase_hrefs(&document)
            .filter_map(|href| capture(href_pattern, &href))
            .collect();
    }

    providers.into_iter().collect()
}

/// Official exam slugs linked from a provider's exam index
/// (`/exams/<provider>/<slug>/`), sorted and deduplicated
pub fn provider_exam_slugs(provider: &str, html: &str) -> Vec<String> {
    let provider = provider.trim().to_lowercase();
    let Ok(pattern) = Regex::new(&format!(
        r"^/exams/{}/([a-z0-9-]+)/?$",
        regex::escape(&provider)
    )) else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let slugs: BTreeSet<String> = lowercase_hrefs(&document)
        .filter_map(|href| capture(&pattern, &href))
        .collect();
    slugs.into_iter().collect()
}

/// Discussion view links on a page, normalized and deduplicated in page order
pub fn discussion_links(html: &str, site: &Site) -> Vec<DiscussionLink> {
    let document = Html::parse_document(html);
    let links = document
        .select(&selectors().anchor)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| normalize_discussion_href(href, site));
    dedup_links(links)
}

fn capture(pattern: &Regex, haystack: &str) -> Option<String> {
    let value = pattern.captures(haystack)?.get(1)?.as_str().trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parses one question discussion page
///
/// # Arguments
///
/// * `html` - The page markup
/// * `source_link` - Absolute URL the page was fetched from
/// * `site` - Resolves root-relative exhibit URLs
///
/// # Returns
///
/// A record; callers drop it when [`QuestionRecord::is_empty`] holds.
pub fn question_record(html: &str, source_link: &str, site: &Site) -> QuestionRecord {
    let document = Html::parse_document(html);
    let sel = selectors();

    let option_lines: Vec<String> = document
        .select(&sel.option)
        .map(|li| clean_text(&element_text(li)))
        .collect();
    let options = parse_options(&option_lines);

    let answer_text = select_text(&document, &sel.correct_answer);
    let correct_answers = extract_correct_answers(answer_text.trim(), &options);

    QuestionRecord {
        title: clean_text(&select_text(&document, &sel.title)),
        header: select_text(&document, &sel.header).trim().replace('\t', ""),
        body: remove_suggested_answer_text(&clean_text(&select_text(&document, &sel.body))),
        exhibit_urls: exhibit_urls(&document, site),
        options,
        correct_answers,
        timestamp: clean_text(&select_text(&document, &sel.timestamp)),
        source_link: source_link.to_string(),
        comments: comments_in(&document),
    }
}

fn exhibit_urls(document: &Html, site: &Site) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut urls = Vec::new();

    for img in document.select(&selectors().exhibit_image) {
        let element = img.value();
        let candidates = EXHIBIT_ATTRIBUTES
            .iter()
            .filter_map(|attr| element.attr(attr))
            .chain(element.attr("srcset").and_then(first_srcset_url));

        for raw in candidates {
            if let Some(url) = normalize_exhibit_url(raw, site) {
                if seen.insert(url.clone()) {
                    urls.push(url);
                }
            }
        }
    }

    urls
}

/// Splits option lines into lettered options
///
/// Tries "A. text" on every line, then "A: text", and otherwise assigns
/// non-blank lines to A–F in order. Letters are never repeated.
pub fn parse_options(lines: &[String]) -> Vec<AnswerOption> {
    let p = patterns();
    for pattern in [&p.option_dot, &p.option_colon] {
        let options = lettered_options(lines, pattern);
        if !options.is_empty() {
            return options;
        }
    }

    lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .zip(OPTION_LETTERS)
        .map(|(text, letter)| AnswerOption {
            letter,
            text: text.to_string(),
        })
        .collect()
}

fn lettered_options(lines: &[String], pattern: &Regex) -> Vec<AnswerOption> {
    let mut options: Vec<AnswerOption> = Vec::new();
    for line in lines {
        let Some(captures) = pattern.captures(line.trim()) else {
            continue;
        };
        let Some(letter) = captures.get(1).and_then(|m| m.as_str().chars().next()) else {
            continue;
        };
        if options.iter().any(|o| o.letter == letter) {
            continue;
        }
        let text = captures.get(2).map_or("", |m| m.as_str()).trim();
        options.push(AnswerOption {
            letter,
            text: text.to_string(),
        });
    }
    options
}

/// Derives the ordered, duplicate-free correct answer letters
///
/// # Fallback Order
///
/// 1. The first run of A–F letters after an optional answer label
/// 2. Options whose text contains, or is contained in, the answer text
/// 3. The first option's letter
/// 4. `A`
///
/// # Examples
///
/// ```
/// use exam_harvest::crawler::parser::{extract_correct_answers, parse_options};
///
/// let lines: Vec<String> = ["A. one", "B. two", "C. three", "D. four"]
///     .iter()
///     .map(|s| s.to_string())
///     .collect();
/// let options = parse_options(&lines);
/// assert_eq!(extract_correct_answers("Correct Answer: BD", &options), vec!['B', 'D']);
/// ```
pub fn extract_correct_answers(raw: &str, options: &[AnswerOption]) -> Vec<char> {
    let p = patterns();
    let answer = p.answer_label.replace(raw.trim(), "");
    let answer = answer.trim();

    if let Some(run) = p.answer_run.captures(answer).and_then(|c| c.get(1)) {
        let mut letters = Vec::new();
        for letter in run.as_str().chars() {
            let known = options.is_empty() || options.iter().any(|o| o.letter == letter);
            if known && !letters.contains(&letter) {
                letters.push(letter);
            }
        }
        if !letters.is_empty() {
            return letters;
        }
    }

    if !answer.is_empty() {
        let lowered = answer.to_lowercase();
        let matched: Vec<char> = options
            .iter()
            .filter(|o| !o.text.is_empty())
            .filter(|o| {
                let text = o.text.to_lowercase();
                text.contains(&lowered) || lowered.contains(&text)
            })
            .map(|o| o.letter)
            .collect();
        if !matched.is_empty() {
            return matched;
        }
    }

    vec![options.first().map_or('A', |o| o.letter)]
}

/// Comments on a question page, in page order
pub fn comments(html: &str) -> Vec<Comment> {
    comments_in(&Html::parse_document(html))
}

fn comments_in(document: &Html) -> Vec<Comment> {
    let sel = selectors();
    let mut comments = Vec::new();

    for container in document.select(&sel.comment) {
        let text = first_text_within(container, &sel.comment_content)
            .map(|raw| normalize_comment_text(&raw))
            .unwrap_or_default();
        if text.is_empty() {
            continue;
        }

        let user = first_text_within(container, &sel.comment_user)
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| ANONYMOUS_USER.to_string());

        let vote = first_text_within(container, &sel.comment_answer_strong)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .or_else(|| first_text_within(container, &sel.comment_answer))
            .unwrap_or_default()
            .to_uppercase();
        let selected_answer = patterns()
            .comment_letter
            .captures(&vote)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().chars().next());

        comments.push(Comment {
            user,
            selected_answer,
            text,
        });
    }

    comments
}
