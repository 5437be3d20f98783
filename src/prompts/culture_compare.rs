// src/prompts/culture_compare.rs
//! Company profile + applicant profile -> per-axis alignment and match score

use super::PromptTemplate;

pub const PROMPT: PromptTemplate = PromptTemplate {
    name: "culture_compare",
    version: "0.3.0",
    system: SYSTEM,
    human: HUMAN,
    input_variables: &["company_profile", "developer_profile", "output_schema"],
    schema_file: crate::schema::MATCHING_SCHEMA,
};

const SYSTEM: &str = "You compare two JSON profiles: a company and a developer.
Use only what the two objects contain and compare only the axes listed in the
schema. Describe alignment; never call it a good or bad fit.
Axis scores are 0, 25, 50, 75 or 100, or \"unknown\" when either side lacks
evidence. Unknown axes are left out of the overall match_score, which is the
equal-weight average of the scored axes. Quotes stay in their original language.
Reply with a single JSON object and nothing else.";

const HUMAN: &str = "Company profile:
{company_profile}

Developer profile:
{developer_profile}

Fill this JSON schema:
{output_schema}";
