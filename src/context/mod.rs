//! Analysis context assembly.
//!
//! Condenses the filtered record set and graph statistics into one
//! bounded text block for a single model request. The truncation policy
//! is deterministic: most-recent records are retained first, and the
//! body of the oldest-retained record is cut to fit the remaining
//! budget. The same record set and budget always yield byte-identical
//! output.

use std::collections::BTreeMap;

use crate::graph::CommunicationGraph;
use crate::model::record::MessageRecord;

const SAMPLE_SUBJECTS: usize = 10;
const TOP_DOMAINS: usize = 10;

/// Assemble the bounded analysis context.
///
/// `budget` is a hard maximum in characters; the output never exceeds
/// it. `top_connectors` caps the connector list in the summary block.
pub fn assemble(
    records: &[MessageRecord],
    graph: &CommunicationGraph,
    budget: usize,
    top_connectors: usize,
) -> String {
    let mut out = truncate_chars(&summary_block(records, graph, top_connectors), budget);
    let mut used = out.chars().count();

    // Chronological numbering is stable across truncation, so Q&A can
    // cite "EMAIL #3" no matter how much of the corpus fit the budget.
    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by_key(|&i| (records[i].timestamp, i));
    let numbers: BTreeMap<usize, usize> = order
        .iter()
        .enumerate()
        .map(|(pos, &i)| (i, pos + 1))
        .collect();

    // Most-recent first; the first block that does not fit is truncated
    // to the remaining budget and assembly stops there.
    for &i in order.iter().rev() {
        let block = record_block(&records[i], numbers[&i]);
        let block_len = block.chars().count();

        if used + block_len <= budget {
            out.push_str(&block);
            used += block_len;
        } else {
            let remaining = budget - used;
            out.push_str(&truncate_chars(&block, remaining));
            break;
        }
    }

    out
}

/// Corpus-level statistics header, grounded in the investigator's
/// summary sheet: totals, date span, sender domains, connectors,
/// flagged participants, sample subjects.
fn summary_block(
    records: &[MessageRecord],
    graph: &CommunicationGraph,
    top_connectors: usize,
) -> String {
    let mut lines: Vec<String> = Vec::new();

    let dated: Vec<_> = records.iter().filter_map(|r| r.date()).collect();
    match (dated.iter().min(), dated.iter().max()) {
        (Some(first), Some(last)) => {
            lines.push(format!("TOTAL EMAILS: {} ({first} to {last})", records.len()));
        }
        _ => lines.push(format!("TOTAL EMAILS: {}", records.len())),
    }

    let mut domains: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        if let Some(domain) = record.sender_domain() {
            *domains.entry(domain).or_default() += 1;
        }
    }
    let mut ranked_domains: Vec<(&str, usize)> = domains.into_iter().collect();
    ranked_domains.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    lines.push("\nSENDER DOMAINS:".to_string());
    for (domain, count) in ranked_domains.into_iter().take(TOP_DOMAINS) {
        lines.push(format!("- {domain}: {count} emails"));
    }

    lines.push("\nTOP CONNECTORS (by message volume):".to_string());
    for (address, degree) in graph.connectors().into_iter().take(top_connectors) {
        lines.push(format!("- {address} (degree {degree})"));
    }

    let flagged = graph.flagged_nodes();
    if !flagged.is_empty() {
        lines.push("\nFLAGGED PARTICIPANTS:".to_string());
        for (address, flags) in flagged {
            let tags: Vec<String> = flags.iter().map(|f| f.to_string()).collect();
            lines.push(format!("- {address}: {}", tags.join(", ")));
        }
    }

    lines.push("\nSAMPLE SUBJECTS:".to_string());
    for record in records
        .iter()
        .filter(|r| !r.subject.is_empty())
        .take(SAMPLE_SUBJECTS)
    {
        lines.push(format!("- {}", record.subject));
    }

    lines.push(String::new());
    lines.join("\n")
}

/// One record rendered for the model: audit header then body.
fn record_block(record: &MessageRecord, number: usize) -> String {
    let date = record
        .timestamp
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "undated".to_string());

    let mut block = format!(
        "\nEMAIL #{number} ({date}) - File: {}\n{}\nFrom: {}\nTo: {}\nSubject: {}\n",
        record.source_path.display(),
        "=".repeat(72),
        record.sender,
        record.recipients.join(", "),
        record.subject,
    );
    if !record.attachment_names.is_empty() {
        block.push_str(&format!(
            "Attachments: {}\n",
            record.attachment_names.join(", ")
        ));
    }
    block.push('\n');
    block.push_str(&record.body);
    block.push('\n');
    block.push_str(&"-".repeat(72));
    block.push('\n');
    block
}

/// Truncate to at most `n` characters on a char boundary.
fn truncate_chars(s: &str, n: usize) -> String {
    match s.char_indices().nth(n) {
        Some((byte_idx, _)) => s[..byte_idx].to_string(),
        None => s.to_string(),
    }
}
