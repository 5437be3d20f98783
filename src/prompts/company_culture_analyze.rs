// src/prompts/company_culture_analyze.rs
//! Collected company facts -> scored company culture profile

use super::PromptTemplate;

pub const PROMPT: PromptTemplate = PromptTemplate {
    name: "company_culture_analyze",
    version: "0.3.0",
    system: SYSTEM,
    human: HUMAN,
    input_variables: &["company_data", "output_schema"],
    schema_file: crate::schema::COMPANY_SCHEMA,
};

const SYSTEM: &str = "You structure a company's stated culture. You do not judge it.
Score every axis of the schema from 0 to 4. A score above 0 needs at least one
short quote from the input as evidence; without evidence the score is 0 and
confidence is \"low\".
Reply with a single JSON object and nothing else.";

const HUMAN: &str = "Collected company data:

{company_data}

Fill this JSON schema:
{output_schema}";
