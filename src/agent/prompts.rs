//! Summarization prompts

use crate::truncate_str;

/// Page text beyond this many bytes (UTF-8) is cut on a char boundary before prompting
pub const MAX_PAGE_BYTES: usize = 30_000;

/// Returned without calling the model when a page had no visible text
pub const EMPTY_PAGE_SUMMARY: &str = "No readable content was found on this page.";

const SUMMARY_INSTRUCTIONS: &str = r#"You are a research assistant. Summarize the web page below with respect to the research question.

Rules:
- Keep only information relevant to the question.
- Be factual; do not add knowledge that is not in the page.
- If the page does not address the question, say so in one sentence.
- Answer in at most 5 short bullet points or a short paragraph."#;

/// Build the user prompt for one page
pub fn build_summary_prompt(text: &str, query: &str) -> String {
    let page = if text.len() > MAX_PAGE_BYTES {
        format!("{}\n[...truncated]", truncate_str(text, MAX_PAGE_BYTES))
    } else {
        text.to_string()
    };

    format!(
        "{}\n\nResearch question: {}\n\n--- PAGE CONTENT ---\n{}\n--- END PAGE CONTENT ---",
        SUMMARY_INSTRUCTIONS,
        query.trim(),
        page.trim()
    )
}
