//! `tankobon updates <source> --record CARD=UNIT ...`

use crate::cli::{output, runtime_config, sources};
use crate::model::UpdateRecord;
use anyhow::{Context, Result};
use std::path::Path;
use url::Url;

/// Parse a `CARD_URL=UNIT_URL` pair.
///
/// The separator is the first `=` followed by an absolute URL, so card URLs
/// may carry query strings.
pub fn parse_record(raw: &str) -> Result<UpdateRecord> {
    let (card, unit) = raw
        .match_indices('=')
        .map(|(at, _)| (&raw[..at], &raw[at + 1..]))
        .find(|(card, unit)| !card.trim().is_empty() && Url::parse(unit.trim()).is_ok())
        .with_context(|| format!("expected CARD_URL=UNIT_URL, got '{raw}'"))?;
    Ok(UpdateRecord::new(card.trim(), unit.trim()))
}

pub async fn run(cache_dir: Option<&Path>, source: &str, records: &[String]) -> Result<()> {
    let config = runtime_config(cache_dir);
    let provider = sources(&config)?.require(source)?;
    let records = records
        .iter()
        .map(|r| parse_record(r))
        .collect::<Result<Vec<_>>>()?;

    let diff = provider
        .diff_updates(&records)
        .await
        .with_context(|| format!("update check on {source} failed"))?;

    if output::is_json() {
        output::print_json(&serde_json::to_value(&diff)?);
        return Ok(());
    }
    for url in &diff.updated {
        println!("  [NEW] {url}");
    }
    if !output::is_quiet() {
        for url in &diff.unchanged {
            println!("  [   ] {url}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record() {
        let r = parse_record("https://x/s/a=https://x/s/a/chapter/2").unwrap();
        assert_eq!(r.card_url, "https://x/s/a");
        assert_eq!(r.unit_url, "https://x/s/a/chapter/2");
        assert!(parse_record("no-separator").is_err());
    }

    #[test]
    fn test_parse_record_with_query_in_card_url() {
        let r = parse_record("https://x/series?id=1=https://x/series/chapter?id=2").unwrap();
        assert_eq!(r.card_url, "https://x/series?id=1");
        assert_eq!(r.unit_url, "https://x/series/chapter?id=2");
        assert!(parse_record("https://x/s?id=1=").is_err());
    }
}
