//! Prompt Rendering
//!
//! Turns a budgeted context into the final user message and carries the
//! fixed analyst system prompt. Documentation items render with their
//! originating title/section; chat items render as anonymous conversational
//! snippets so the model cannot attribute them.

use crosscheck_core::{BudgetedContext, RetrievedItem, SourceKind};

/// Fixed system prompt for every provider. Documentation-sourced content
/// outranks chat-sourced content whenever the two conflict.
pub const SYSTEM_PROMPT: &str = "\
You are an expert data analyst specializing in community feedback analysis and documentation.
Your task is to analyze both official documentation and chat conversations to extract actionable insights.
Focus on identifying patterns, categorizing issues, and providing concrete recommendations.

When creating response documents:
1. Prioritize information from official documentation over community conversations
2. Use community conversations to identify common questions and pain points
3. Format your output in a clear, structured manner with proper headings and sections
4. For technical information, include code examples when relevant
5. For command-line instructions, use proper formatting

Use a professional, analytical tone and organize your findings clearly.";

/// Render one context item with its source-kind label.
pub fn render_item(item: &RetrievedItem) -> String {
    match item.source {
        SourceKind::Documentation => {
            let title = item.metadata_str("title").unwrap_or("Unknown Document");
            let section = item.metadata_str("section").unwrap_or("Unknown Section");
            format!(
                "--- DOCUMENTATION: {} - {} ---\n{}",
                title, section, item.text
            )
        }
        SourceKind::Chat | SourceKind::Unknown => {
            format!("--- CHAT CONVERSATION ---\n{}", item.text)
        }
    }
}

/// Render the final user message: labeled context items followed by the
/// original analysis prompt.
pub fn render_user_message(context: &BudgetedContext, prompt: &str) -> String {
    let chunks: Vec<String> = context.items.iter().map(render_item).collect();
    format!(
        "The following are relevant chunks from documentation and chat conversations:\n\n\
         {}\n\n{}",
        chunks.join("\n\n"),
        prompt
    )
}
