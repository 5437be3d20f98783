// src/prompts/applicant_analyze.rs
//! Resume / portfolio text -> scored applicant profile

use super::PromptTemplate;

pub const PROMPT: PromptTemplate = PromptTemplate {
    name: "applicant_analyze",
    version: "0.3.0",
    system: SYSTEM,
    human: HUMAN,
    input_variables: &["resume_text", "output_schema"],
    schema_file: crate::schema::APPLICANT_SCHEMA,
};

const SYSTEM: &str = "You extract an applicant profile from their own documents.
Use only what the documents say. Missing details are \"unknown\".
Each scoring axis gets a 0-4 score, a one or two sentence summary, a
confidence (low, medium or high) and evidence quotes. No evidence means score 0
and confidence \"low\". Keywords are short tags, never sentences.
Reply with a single JSON object and nothing else.";

const HUMAN: &str = "Applicant documents:

{resume_text}

Fill this JSON schema:
{output_schema}";
