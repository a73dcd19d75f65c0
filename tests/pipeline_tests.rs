//! Integration tests for the full pipeline: corpus loading, date
//! filtering, graph construction, and context assembly.

use std::path::Path;

use mailsleuth::context;
use mailsleuth::corpus::CorpusLoader;
use mailsleuth::error::SleuthError;
use mailsleuth::filter::{self, DateRange};
use mailsleuth::graph;

fn fixtures() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

// ─── Corpus loading ──────────────────────────────────────────────────

#[test]
fn test_scan_integrity_counts() {
    let loader = CorpusLoader::new(fixtures()).unwrap();
    let outcome = loader.scan(None).unwrap();

    // 5 .eml + 1 .mbox discovered; broken.eml fails, everything else parses
    assert_eq!(outcome.discovered, 6);
    assert_eq!(outcome.parsed, 5);
    assert_eq!(outcome.failures.len(), 1);
    assert!(outcome.failures[0].path.ends_with("broken.eml"));

    // 4 parsed .eml records + 2 framed in thread.mbox
    assert_eq!(outcome.records.len(), 6);
    assert_eq!(outcome.integrity_line(), "parsed 5 of 6 files");
}

#[test]
fn test_scan_is_repeatable() {
    let loader = CorpusLoader::new(fixtures()).unwrap();
    let one = loader.scan(None).unwrap();
    let two = loader.scan(None).unwrap();

    let senders = |o: &mailsleuth::corpus::ScanOutcome| -> Vec<String> {
        o.records.iter().map(|r| r.sender.clone()).collect()
    };
    assert_eq!(senders(&one), senders(&two));
    assert_eq!(one.failures.len(), two.failures.len());
}

#[test]
fn test_addresses_normalized_and_dates_utc() {
    let loader = CorpusLoader::new(fixtures()).unwrap();
    let outcome = loader.scan(None).unwrap();

    let alpha = outcome
        .records
        .iter()
        .find(|r| r.source_path.ends_with("alpha.eml"))
        .unwrap();
    // Header says "ALICE@acme-corp.com"
    assert_eq!(alpha.sender, "alice@acme-corp.com");
    assert_eq!(alpha.attachment_names, vec!["manifest.pdf"]);
    assert!(alpha.body.contains("Rotterdam warehouse"));
    assert!(!alpha.body.contains("JVBERi0x"), "attachment content excluded");

    let bravo = outcome
        .records
        .iter()
        .find(|r| r.source_path.ends_with("bravo.eml"))
        .unwrap();
    // 14:30 +0100 normalizes to 13:30 UTC
    let ts = bravo.timestamp.unwrap();
    assert_eq!(ts.format("%Y-%m-%d %H:%M").to_string(), "2024-01-02 13:30");

    let undated = outcome
        .records
        .iter()
        .find(|r| r.source_path.ends_with("undated.eml"))
        .unwrap();
    assert_eq!(undated.timestamp, None);
}

// ─── Filtering and graph: the worked three-party example ────────────

#[test]
fn test_filter_and_graph_worked_example() {
    // alpha: alice→bob (day 1), bravo: bob→carol (day 2),
    // charlie: alice→carol (day 3). Filter to [day 1, day 2].
    let loader = CorpusLoader::new(fixtures()).unwrap();
    let outcome = loader.scan(None).unwrap();

    let range = DateRange::parse("2024-01-01", "2024-01-02").unwrap();
    let filtered = filter::filter_by_range(outcome.records, &range);

    assert_eq!(filtered.records.len(), 2);
    assert_eq!(filtered.undated, 1);
    assert_eq!(filtered.out_of_range, 3); // charlie + both mbox messages

    let g = graph::build(&filtered.records, 2.0).unwrap();
    assert_eq!(g.node_count(), 3);
    assert_eq!(g.edge_count(), 2);
    assert_eq!(g.node("bob@acme-corp.com").unwrap().total_degree(), 2);
    assert_eq!(g.node("alice@acme-corp.com").unwrap().total_degree(), 1);
    assert_eq!(
        g.node("carol@freight-partners.example").unwrap().total_degree(),
        1
    );

    let connectors = g.connectors();
    assert_eq!(connectors[0], ("bob@acme-corp.com", 2));
}

#[test]
fn test_invalid_range_fails_before_scanning() {
    assert!(matches!(
        DateRange::parse("2024-02-01", "2024-01-01").unwrap_err(),
        SleuthError::InvalidRange { .. }
    ));
    // The same failure applies with no records in existence at all:
    // the range itself cannot be constructed
    assert!(DateRange::parse("2024-01-01", "2024-02-01").is_ok());
}

#[test]
fn test_empty_filter_result_is_explicit() {
    let loader = CorpusLoader::new(fixtures()).unwrap();
    let outcome = loader.scan(None).unwrap();

    let range = DateRange::parse("1999-01-01", "1999-12-31").unwrap();
    let filtered = filter::filter_by_range(outcome.records, &range);
    assert!(filtered.records.is_empty());

    assert!(matches!(
        graph::build(&filtered.records, 2.0),
        Err(SleuthError::EmptyCorpus)
    ));
}

// ─── Context assembly over the real corpus ───────────────────────────

#[test]
fn test_context_bounded_and_deterministic() {
    let loader = CorpusLoader::new(fixtures()).unwrap();
    let outcome = loader.scan(None).unwrap();

    let range = DateRange::parse("2024-01-01", "2024-01-31").unwrap();
    let filtered = filter::filter_by_range(outcome.records, &range);
    let g = graph::build(&filtered.records, 2.0).unwrap();

    let full = context::assemble(&filtered.records, &g, 100_000, 10);
    assert!(full.contains("TOTAL EMAILS: 5 (2024-01-01 to 2024-01-11)"));
    assert!(full.contains("Shipment schedule"));

    for budget in [120, 600, 2_000] {
        let ctx = context::assemble(&filtered.records, &g, budget, 10);
        assert!(ctx.chars().count() <= budget);
        let again = context::assemble(&filtered.records, &g, budget, 10);
        assert_eq!(ctx, again, "same input and budget must be byte-identical");
    }

    // Under a tight budget the most recent message survives first
    let tight = context::assemble(&filtered.records, &g, 1_200, 10);
    assert!(tight.contains("Re: Introduction"));
}
