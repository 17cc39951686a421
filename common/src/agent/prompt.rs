use crate::error::{Result, TalkDbError};
use crate::llm::model::Message;

pub const SQL_RULES_PROMPT: &str = "You are an expert MySQL assistant.\n\
\n\
Rules:\n\
- Generate ONLY a valid SELECT query\n\
- Allowed clauses: WHERE, GROUP BY, HAVING, ORDER BY, LIMIT\n\
- Allowed functions: COUNT, SUM, AVG, MIN, MAX\n\
- DO NOT use INSERT, UPDATE, DELETE, DROP, ALTER, TRUNCATE or any other statement that changes data or schema\n\
- Use ONLY the schema below\n\
- Output ONLY the SQL query, no explanation";

/// one question paired with the schema it should be answered against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub schema_text: String,
    pub user_question: String,
}

impl GenerationRequest {
    pub fn prompt(&self) -> String {
        format!(
            "{}\n\nSchema:\n{}\n\nUser Question:\n{}",
            SQL_RULES_PROMPT, self.schema_text, self.user_question
        )
    }

    pub fn messages(&self) -> Vec<Message> {
        vec![Message::user(self.prompt())]
    }
}

/// trimmed question, or an input error when nothing is left
pub fn normalize_question(question: &str) -> Result<&str> {
    let question = question.trim();
    if question.is_empty() {
        return Err(TalkDbError::InvalidInput(
            "question must not be empty".to_string(),
        ));
    }
    Ok(question)
}

/// an empty question never reaches the model
pub fn build_generation_request(schema_text: &str, question: &str) -> Result<GenerationRequest> {
    let question = normalize_question(question)?;

    Ok(GenerationRequest {
        schema_text: schema_text.to_string(),
        user_question: question.to_string(),
    })
}
