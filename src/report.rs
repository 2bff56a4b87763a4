//! CLI entry points for `analyze`, `list`, and `fingerprint`.
//!
//! Each command prints a human-readable report, or the raw JSON with
//! `--json`.

use anyhow::{anyhow, Result};

use clonetime_core::models::{AnalysisRequest, AnalysisResult, ListQuery, RawAnalysisRequest, StoredAnalysis};

use crate::config::Config;
use crate::pipeline::{fingerprint, Pipeline};

/// Parse and validate CLI input exactly as the HTTP API does.
fn parse_request(url: &str, tier: &str, force: bool) -> Result<AnalysisRequest> {
    let raw = RawAnalysisRequest {
        url: Some(url.to_string()),
        tier: Some(tier.to_string()),
        force: Some(force),
    };
    AnalysisRequest::try_from(raw).map_err(|e| anyhow!(e))
}

pub async fn run_analyze(config: &Config, url: &str, tier: &str, force: bool, json: bool) -> Result<()> {
    let request = parse_request(url, tier, force)?;
    let pipeline = Pipeline::from_config(config).await?;
    let result = pipeline.analyze(&request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&request, &result);
    }
    Ok(())
}

fn print_result(request: &AnalysisRequest, result: &AnalysisResult) {
    println!("--- Estimate ---");
    println!("url:         {}", request.url);
    println!("tier:        {}", request.tier);
    println!("total_hours: {:.1}", result.total_hours);
    println!("confidence:  {:.2}", result.confidence);
    println!("scope:       {}", result.scope);
    if let Some(ref summary) = result.summary {
        println!("summary:     {}", summary);
    }
    println!();

    println!("--- Missions ({}) ---", result.missions.len());
    for m in &result.missions {
        println!(
            "{:>6.1}h  {:<13} {} (confidence {:.2})",
            m.hours,
            m.category.as_str(),
            m.title,
            m.confidence
        );
    }

    if !result.product_map.roles.is_empty() || !result.product_map.objects.is_empty() {
        println!();
        println!("--- Product map ---");
        println!("roles:   {}", result.product_map.roles.join(", "));
        println!("objects: {}", result.product_map.objects.join(", "));
        for story in &result.product_map.stories {
            println!("  As {}, I can {}", story.role, story.i_can);
        }
    }

    if !result.evidence.is_empty() {
        println!();
        println!("--- Evidence ({}) ---", result.evidence.len());
        for e in &result.evidence {
            println!("{}", e.url);
            println!("  {}", e.snippet);
        }
    }
}

pub async fn run_list(config: &Config, limit: Option<i64>, search: Option<String>, json: bool) -> Result<()> {
    let query = ListQuery { limit, search };
    let pipeline = Pipeline::from_config(config).await?;
    let rows = pipeline.list(&query).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No analyses found.");
        return Ok(());
    }
    for row in &rows {
        print_row(row);
    }
    Ok(())
}

fn print_row(row: &StoredAnalysis) {
    println!(
        "{}  {:<9} {:>5.1}h  {}",
        row.created_at.format("%Y-%m-%d %H:%M"),
        row.tier.as_str(),
        row.result.total_hours,
        row.url_canonical
    );
}

/// Print the canonical URL and cache key. Needs no database.
pub fn run_fingerprint(url: &str, tier: &str) -> Result<()> {
    let request = parse_request(url, tier, false)?;
    let key = fingerprint(&request.url, request.tier)?;
    println!("url_canonical: {}", key.url_canonical);
    println!("fingerprint:   {}", key.fingerprint);
    Ok(())
}
