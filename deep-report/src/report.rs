//! Report generation through a grounded LLM provider.

use anyhow::{Context, Result, bail};
use grounded_llm::{GroundingSource, LlmProvider, LlmRequest};

use crate::text::strip_markdown;

/// A generated report and the web sources it was grounded on.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub topic: String,
    pub markdown: String,
    pub sources: Vec<GroundingSource>,
}

impl Report {
    /// The report text with markdown syntax removed.
    pub fn plain_text(&self) -> String {
        strip_markdown(&self.markdown)
    }

    /// Numbered list of sources for terminal display. Empty when there are none.
    pub fn render_sources(&self) -> String {
        if self.sources.is_empty() {
            return String::new();
        }

        let mut out = String::from("Sources:\n");
        for (i, source) in self.sources.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, source.display_title()));
            if source.title.is_some() {
                out.push_str(&format!("   {}\n", source.uri));
            }
        }
        out
    }
}

/// Build the research prompt for a topic.
pub fn build_prompt(topic: &str, instructions: Option<&str>, language: &str) -> String {
    let mut prompt = format!(
        "Act as a world-class expert researcher. Write an in-depth, detailed and \
         well-structured report on the topic: \"{topic}\". The report must be complete \
         and as long as possible, like a textbook chapter or an encyclopedia article. \
         Use your knowledge and the most recent information available to give a thorough \
         analysis. Start the report with a fitting title in bold (e.g. **Report Title**), \
         followed by an introduction, several development paragraphs and a conclusion. \
         Format the text with markdown for clarity (headings, subheadings, bullet lists). \
         Write the report in the language identified by the tag \"{language}\"."
    );

    if let Some(extra) = instructions.map(str::trim).filter(|s| !s.is_empty()) {
        prompt.push_str("\n\nAdditional instructions:\n");
        prompt.push_str(extra);
    }

    prompt
}

/// Ask the provider for a grounded report on `topic`.
pub async fn generate_report(
    provider: &dyn LlmProvider,
    topic: &str,
    instructions: Option<&str>,
    language: &str,
) -> Result<Report> {
    let topic = topic.trim();
    if topic.is_empty() {
        bail!("Please enter a topic.");
    }

    let request = LlmRequest::new(build_prompt(topic, instructions, language)).with_web_search();
    log::info!("Requesting report on \"{}\" from {}", topic, provider.name());

    let response = provider
        .complete(request)
        .await
        .map_err(|e| {
            log::error!("Error calling {}: {}", provider.name(), e);
            e
        })
        .context("Failed to communicate with the generative AI model.")?;

    if response.content.trim().is_empty() {
        bail!("Failed to generate report. The result was empty.");
    }

    log::debug!(
        "Report from {}: {} characters, {} sources",
        response.model,
        response.content.len(),
        response.sources.len()
    );

    Ok(Report {
        topic: topic.to_string(),
        markdown: response.content,
        sources: response.sources,
    })
}
