//! Model backend interaction: the Ollama client, the prompts, and a
//! conversation session over one assembled analysis context.

pub mod client;
pub mod prompts;

use tracing::info;

use crate::error::Result;

pub use client::{ChatMessage, OllamaClient};

/// A conversation with the model over one analysis context.
///
/// Holds the full history so follow-up questions keep the report and
/// the corpus in scope.
pub struct ChatSession {
    client: OllamaClient,
    history: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new(client: OllamaClient) -> Self {
        Self {
            client,
            history: vec![ChatMessage::system(prompts::BASE_PROMPT)],
        }
    }

    /// Send the assembled context and return the initial forensic
    /// report. Also primes the session for concise Q&A.
    pub fn initial_report(&mut self, total_emails: usize, context: &str) -> Result<String> {
        info!(total_emails, "Requesting initial forensic report");
        self.history
            .push(ChatMessage::user(prompts::report_prompt(total_emails, context)));

        let report = self.client.chat(&self.history)?;
        self.history.push(ChatMessage::assistant(report.clone()));
        self.history.push(ChatMessage::user(prompts::QA_PROMPT));
        Ok(report)
    }

    /// Ask a follow-up question about the corpus.
    pub fn ask(&mut self, question: &str) -> Result<String> {
        self.history.push(ChatMessage::user(format!(
            "Please answer this question directly and concisely: {question}"
        )));

        let answer = self.client.chat(&self.history)?;
        self.history.push(ChatMessage::assistant(answer.clone()));
        Ok(answer)
    }
}
