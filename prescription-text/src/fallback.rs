//! Medication recovery strategies used when the line scan finds nothing.
//!
//! Both run over the original, untrimmed upstream text rather than the located
//! section, since template drift often moves content ahead of "Patient Name:".

use std::sync::LazyLock;

use prescription_core::{ExtractionStrategy, ExtractorConfig, Medication};
use regex::Regex;

use crate::{classify, flush, frequency, Line, MedicationDraft};

/// A pure pass over raw text that returns whatever medications it can find.
pub type MedicationStrategy = fn(&str, &ExtractorConfig) -> Vec<Medication>;

/// Fallbacks in the order they are tried.
pub const FALLBACK_STRATEGIES: [(ExtractionStrategy, MedicationStrategy); 2] = [
    (
        ExtractionStrategy::MarkerTuples,
        scan_marker_tuples as MedicationStrategy,
    ),
    (
        ExtractionStrategy::BlockSplit,
        split_blocks as MedicationStrategy,
    ),
];

static MARKER_TUPLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\*\*Medication \d+:\*\*\s*\*\s*Name:\s*([^\n*]+)\s*\*\s*Dosage:\s*([^\n*]+)\s*\*\s*Frequency:\s*([^\n*]+)",
    )
    .expect("marker tuple pattern")
});

static BLOCK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*{0,2}Medication\s+\d+\s*:\*{0,2}").expect("block header pattern")
});

/// Try each strategy in order; the first non-empty list wins.
pub fn first_non_empty(
    strategies: &[(ExtractionStrategy, MedicationStrategy)],
    raw: &str,
    config: &ExtractorConfig,
) -> Option<(ExtractionStrategy, Vec<Medication>)> {
    strategies.iter().find_map(|(strategy, run)| {
        let medications = run(raw, config);
        tracing::debug!(?strategy, count = medications.len(), "fallback strategy finished");
        if medications.is_empty() {
            None
        } else {
            Some((*strategy, medications))
        }
    })
}

/// Scan for `**Medication N:**` followed by Name, Dosage and Frequency bullets.
///
/// Duration and instructions are never captured here.
pub fn scan_marker_tuples(raw: &str, config: &ExtractorConfig) -> Vec<Medication> {
    MARKER_TUPLE
        .captures_iter(raw)
        .filter_map(|caps| {
            let name = caps[1].trim();
            if name.is_empty() {
                return None;
            }

            let raw_frequency = caps[3].trim();
            let frequency = if config.normalize_frequency {
                frequency::normalize(raw_frequency)
            } else {
                raw_frequency.to_string()
            };

            Some(Medication {
                dosage: non_empty(caps[2].trim()),
                frequency: non_empty(&frequency),
                ..Medication::named(name)
            })
        })
        .collect()
}

/// Split on medication headers and read each block with the medication line rules.
pub fn split_blocks(raw: &str, config: &ExtractorConfig) -> Vec<Medication> {
    let mut medications = Vec::new();

    for block in BLOCK_HEADER.split(raw).skip(1) {
        let mut draft = MedicationDraft::default();

        for line in block.lines() {
            match classify(line.trim()) {
                Line::MedicationField(field, value) => draft.absorb(field, value),
                Line::CloseMedications => break,
                _ => {}
            }
        }

        flush(&mut draft, &mut medications, config.normalize_frequency);
    }

    medications
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
