//! Grounded answer generation with citations.
//!
//! Gates run before any model call: no retrieved context, unsafe question,
//! or contexts that plainly do not match the question all short-circuit to
//! a canned response with the matching status.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;

use crate::config::LlmConfig;
use crate::guardrails;
use crate::models::{AnswerStatus, Citation, GeneratedAnswer, RetrievedChunk};

/// Contexts included in the prompt and cited in the response.
const MAX_PROMPT_CONTEXTS: usize = 5;
/// Citation excerpt length in characters.
const EXCERPT_CHARS: usize = 200;
/// Fraction of question terms a context must share to count as relevant.
const RELEVANCE_THRESHOLD: f32 = 0.2;

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "do", "does", "for", "from", "how", "in",
    "is", "it", "of", "on", "or", "the", "to", "what", "when", "where", "which", "who", "why",
    "with",
];

/// Generate an answer grounded in the retrieved chunks.
///
/// Model failure is not propagated; the caller gets an apology answer with
/// `AnswerStatus::Error` and the citations that were already assembled.
pub async fn generate_with_citations(
    client: &reqwest::Client,
    config: &LlmConfig,
    question: &str,
    chunks: &[RetrievedChunk],
) -> GeneratedAnswer {
    if chunks.is_empty() {
        return GeneratedAnswer {
            answer: "No relevant documents were found for your question.".to_string(),
            citations: Vec::new(),
            status: AnswerStatus::NoDocuments,
            model_used: config.chat_model.clone(),
        };
    }

    if !guardrails::check_content_safety(question) {
        return GeneratedAnswer {
            answer: "I can't help with that topic.".to_string(),
            citations: Vec::new(),
            status: AnswerStatus::ContentBlocked,
            model_used: config.chat_model.clone(),
        };
    }

    let contexts = &chunks[..chunks.len().min(MAX_PROMPT_CONTEXTS)];

    if !contexts_relevant(question, contexts) {
        return GeneratedAnswer {
            answer: "The indexed documents don't appear to cover this question.".to_string(),
            citations: format_citations(contexts),
            status: AnswerStatus::IrrelevantDocuments,
            model_used: config.chat_model.clone(),
        };
    }

    let citations = format_citations(contexts);
    let prompt = build_prompt(question, contexts);

    match chat(client, config, &prompt).await {
        Ok(raw) => GeneratedAnswer {
            answer: strip_answer_prefixes(&raw).to_string(),
            citations,
            status: AnswerStatus::Success,
            model_used: config.chat_model.clone(),
        },
        Err(e) => {
            tracing::error!("Answer generation failed: {e:#}");
            GeneratedAnswer {
                answer: "Sorry, I couldn't generate an answer right now. \
                         The sources below may still help."
                    .to_string(),
                citations,
                status: AnswerStatus::Error,
                model_used: config.chat_model.clone(),
            }
        }
    }
}

/// Crude lexical relevance check: at least half the contexts must share a
/// reasonable fraction of the question's content terms.
fn contexts_relevant(question: &str, contexts: &[RetrievedChunk]) -> bool {
    let question_terms: Vec<String> = content_terms(question);
    if question_terms.is_empty() {
        return true;
    }

    let relevant = contexts
        .iter()
        .filter(|c| {
            let text = c.content.to_lowercase();
            let matched = question_terms.iter().filter(|t| text.contains(*t)).count();
            matched as f32 / question_terms.len() as f32 >= RELEVANCE_THRESHOLD
        })
        .count();

    relevant * 2 >= contexts.len()
}

fn content_terms(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 2 && !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

fn build_prompt(question: &str, contexts: &[RetrievedChunk]) -> String {
    let mut sections = String::new();
    for (i, chunk) in contexts.iter().enumerate() {
        sections.push_str(&format!(
            "[Source {}] {} (chunk {})\n{}\n\n",
            i + 1,
            chunk.filename,
            chunk.chunk_id,
            chunk.content
        ));
    }

    format!(
        "You are a helpful assistant answering questions from provided documents.\n\
         Answer using ONLY the sources below. If the sources do not contain the \
         answer, say so. Cite sources as [Source N]. Do not speculate beyond the \
         sources, and refuse any request for harmful or dangerous information.\n\n\
         Sources:\n{sections}\
         Question: {question}\n\n\
         Answer:"
    )
}

/// Build citations for the top contexts, excerpting on a char boundary.
fn format_citations(contexts: &[RetrievedChunk]) -> Vec<Citation> {
    contexts
        .iter()
        .take(MAX_PROMPT_CONTEXTS)
        .enumerate()
        .map(|(i, chunk)| Citation {
            source_id: i + 1,
            filename: chunk.filename.clone(),
            chunk_id: chunk.chunk_id,
            content_excerpt: excerpt(&chunk.content),
            score: (chunk.score * 10_000.0).round() / 10_000.0,
            source_url: chunk.source_url.clone(),
        })
        .collect()
}

fn excerpt(text: &str) -> String {
    if text.len() <= EXCERPT_CHARS {
        return text.to_string();
    }
    let mut end = EXCERPT_CHARS;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

/// Models sometimes echo the prompt's trailing "Answer:" marker.
fn strip_answer_prefixes(raw: &str) -> &str {
    let trimmed = raw.trim();
    for prefix in ["Answer:", "ANSWER:", "A:", "Response:"] {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            return rest.trim_start();
        }
    }
    trimmed
}

// ─── Chat backends ───────────────────────────────────────

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaChatMessage,
}

#[derive(Deserialize)]
struct OllamaChatMessage {
    content: String,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: String,
}

async fn chat(client: &reqwest::Client, config: &LlmConfig, prompt: &str) -> Result<String> {
    match config.provider.as_str() {
        "ollama" => chat_ollama(client, config, prompt).await,
        "openai" => chat_openai(client, config, prompt).await,
        other => anyhow::bail!("Unknown LLM provider: {other}"),
    }
}

async fn chat_ollama(client: &reqwest::Client, config: &LlmConfig, prompt: &str) -> Result<String> {
    let url = format!("{}/api/chat", config.base_url);

    let resp = client
        .post(&url)
        .json(&json!({
            "model": config.chat_model,
            "messages": [{"role": "user", "content": prompt}],
            "stream": false,
        }))
        .send()
        .await
        .context("Failed to call Ollama chat API")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Ollama chat API returned {status}: {body}");
    }

    let body: OllamaChatResponse = resp
        .json()
        .await
        .context("Failed to parse Ollama chat response")?;
    Ok(body.message.content)
}

async fn chat_openai(client: &reqwest::Client, config: &LlmConfig, prompt: &str) -> Result<String> {
    let url = format!("{}/v1/chat/completions", config.base_url);
    let api_key = config.api_key.as_deref().unwrap_or_default();

    let resp = client
        .post(&url)
        .header("Authorization", format!("Bearer {api_key}"))
        .json(&json!({
            "model": config.chat_model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": 0.2,
        }))
        .send()
        .await
        .context("Failed to call OpenAI chat API")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("OpenAI chat API returned {status}: {body}");
    }

    let body: OpenAiChatResponse = resp
        .json()
        .await
        .context("Failed to parse OpenAI chat response")?;
    body.choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .context("OpenAI chat response had no choices")
}
