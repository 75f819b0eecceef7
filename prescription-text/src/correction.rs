//! Medication name correction.
//!
//! Names pass through a [`NameCorrector`]; a failed lookup keeps the extracted
//! name. [`DictionaryCorrector`] is the built-in corrector: each word of at least
//! five characters is matched against common drug names and replaced only on a
//! unique match within edit distance 2. A name with no known or correctable word
//! is reported as [`CorrectionError::NotFound`].

use prescription_core::{CorrectionError, ExtractionResult, Medication, NameCorrector};

/// Lowercase drug names the built-in corrector knows.
const DRUG_NAMES: &[&str] = &[
    "acetaminophen", "albuterol", "allopurinol", "amlodipine", "amoxicillin",
    "atorvastatin", "azithromycin", "bisoprolol", "budesonide", "carvedilol",
    "cefalexin", "cephalexin", "cetirizine", "ciprofloxacin", "citalopram",
    "clopidogrel", "codeine", "colchicine", "diclofenac", "digoxin", "doxycycline",
    "duloxetine", "enalapril", "escitalopram", "esomeprazole", "fluconazole",
    "fluoxetine", "fluticasone", "furosemide", "gabapentin", "hydrochlorothiazide",
    "ibuprofen", "insulin", "levetiracetam", "levothyroxine", "lisinopril",
    "loratadine", "losartan", "metformin", "methotrexate", "metoprolol",
    "metronidazole", "montelukast", "naproxen", "nitrofurantoin", "omeprazole",
    "ondansetron", "pantoprazole", "paracetamol", "prednisolone", "prednisone",
    "pregabalin", "quetiapine", "ramipril", "ranitidine", "rosuvastatin",
    "salbutamol", "sertraline", "simvastatin", "spironolactone", "tamsulosin",
    "tramadol", "valsartan", "venlafaxine", "warfarin",
];

/// Offline corrector backed by [`DRUG_NAMES`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DictionaryCorrector;

impl NameCorrector for DictionaryCorrector {
    fn correct(&self, name: &str) -> Result<String, CorrectionError> {
        let mut corrected = String::with_capacity(name.len());
        let mut word = String::new();
        let mut recognised = false;

        for ch in name.chars() {
            if ch.is_alphanumeric() {
                word.push(ch);
            } else {
                if !word.is_empty() {
                    recognised |= push_corrected(&mut corrected, &word);
                    word.clear();
                }
                corrected.push(ch);
            }
        }

        if !word.is_empty() {
            recognised |= push_corrected(&mut corrected, &word);
        }

        if recognised {
            Ok(corrected)
        } else {
            Err(CorrectionError::NotFound(name.to_string()))
        }
    }
}

/// Run every medication name through `corrector`, keeping the original on failure.
pub fn apply_name_corrections(
    result: ExtractionResult,
    corrector: &dyn NameCorrector,
) -> ExtractionResult {
    let ExtractionResult {
        patient,
        medications,
        refill,
    } = result;

    let medications = medications
        .into_iter()
        .map(|medication| correct_medication(medication, corrector))
        .collect();

    ExtractionResult::new(patient, medications, refill)
}

fn correct_medication(medication: Medication, corrector: &dyn NameCorrector) -> Medication {
    match corrector.correct(&medication.name) {
        Ok(name) if !name.trim().is_empty() => {
            if name != medication.name {
                tracing::debug!(from = %medication.name, to = %name, "medication name corrected");
            }
            Medication { name, ..medication }
        }
        Ok(_) => medication,
        Err(CorrectionError::NotFound(_)) => {
            tracing::debug!(name = %medication.name, "no dictionary match, name kept");
            medication
        }
        Err(err) => {
            tracing::warn!(name = %medication.name, "name correction failed: {err}");
            medication
        }
    }
}

fn push_corrected(out: &mut String, word: &str) -> bool {
    match correct_word(word) {
        Some(corrected) => {
            out.push_str(&corrected);
            true
        }
        None => {
            out.push_str(word);
            false
        }
    }
}

/// The dictionary spelling of `word`, or `None` when it matches no drug name.
fn correct_word(word: &str) -> Option<String> {
    if word.chars().count() < 5 {
        return None;
    }

    let lower = word.to_lowercase();
    if DRUG_NAMES.contains(&lower.as_str()) {
        return Some(word.to_string());
    }

    let mut best: Option<&str> = None;
    let mut best_distance = 3usize;
    let mut ambiguous = false;

    for &term in DRUG_NAMES {
        if lower.chars().count().abs_diff(term.chars().count()) > 2 {
            continue;
        }

        let distance = edit_distance(&lower, term);
        if distance < best_distance {
            best_distance = distance;
            best = Some(term);
            ambiguous = false;
        } else if distance == best_distance && best.is_some() {
            ambiguous = true;
        }
    }

    match best {
        Some(term) if !ambiguous => Some(match_case(word, term)),
        _ => None,
    }
}

fn match_case(original: &str, replacement: &str) -> String {
    if original
        .chars()
        .all(|c| c.is_uppercase() || !c.is_alphabetic())
    {
        return replacement.to_uppercase();
    }

    if original.chars().next().is_some_and(char::is_uppercase) {
        let mut chars = replacement.chars();
        return match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
    }

    replacement.to_string()
}

fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, a_ch) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, b_ch) in b.iter().enumerate() {
            let cost = usize::from(a_ch != b_ch);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
