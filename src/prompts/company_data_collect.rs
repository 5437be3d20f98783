// src/prompts/company_data_collect.rs
//! Scraped company pages -> raw factual company profile

use super::PromptTemplate;

pub const PROMPT: PromptTemplate = PromptTemplate {
    name: "company_data_collect",
    version: "0.3.0",
    system: SYSTEM,
    human: HUMAN,
    input_variables: &["scraped_content", "output_schema"],
    schema_file: crate::schema::COMPANY_SCHEMA,
};

const SYSTEM: &str = "You collect facts about a company from pages that were already scraped.
Only use what the pages state. Do not browse, guess or evaluate.
Fields with no supporting text are set to \"unknown\".
Reply with a single JSON object and nothing else.";

const HUMAN: &str = "Scraped pages, one block per URL:

{scraped_content}

Fill this JSON schema:
{output_schema}";
