// src/pipeline/full.rs
use serde_json::{json, Value};
use std::time::Instant;
use tracing::info;

use super::compare::without_store_fields;
use super::{ApplicantPipeline, CompanyPipeline, ComparePipeline, PipelineError};

/// Company and applicant analyses run concurrently; the comparison runs once
/// both are done. Any failure fails the whole run.
pub async fn run_full_analysis(
    company: &CompanyPipeline,
    applicant: &ApplicantPipeline,
    compare: &ComparePipeline,
    urls: &[String],
    resume_text: &str,
) -> Result<Value, PipelineError> {
    let started = Instant::now();
    info!("Starting full analysis: {} URLs", urls.len());

    let (company_result, applicant_result) =
        tokio::join!(company.run(urls), applicant.run(resume_text, None));
    let company_profile = company_result?;
    let applicant_profile = applicant_result?;

    let matching = compare
        .run(
            &without_store_fields(company_profile.clone()),
            &without_store_fields(applicant_profile.clone()),
            None,
            None,
        )
        .await?;

    let elapsed = (started.elapsed().as_secs_f64() * 100.0).round() / 100.0;
    info!("Full analysis finished in {:.2}s", elapsed);

    Ok(json!({
        "company": company_profile,
        "applicant": applicant_profile,
        "matching": matching,
        "_meta": {
            "elapsed_seconds": elapsed,
            "parallel_execution": true,
            "company_urls": urls,
        }
    }))
}
