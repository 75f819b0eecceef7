//! Free-form prescription text to `ExtractionResult` converter with fallback strategies.

pub mod correction;
pub mod fallback;
pub mod frequency;
pub mod prompt;

use std::sync::LazyLock;

use prescription_core::{
    ExtractionReport, ExtractionResult, ExtractionStrategy, ExtractorConfig, Medication,
    NameCorrector, PatientInfo, RefillNotes,
};
use regex::Regex;

pub use correction::{apply_name_corrections, DictionaryCorrector};
pub use frequency::{normalize, normalize_opt};

const RECORD_START: &str = "Patient Name:";
// Each alternate contains RECORD_START, so these only matter if RECORD_START changes.
const ALTERNATE_STARTS: [&str; 3] = ["***Patient Name:", "**Patient Name:", "*Patient Name:"];

const MEDICATIONS_OPEN: &str = "Medication(s):";
const MEDICATIONS_CLOSE: &str = "Other Notes/Instructions:";

static PREAMBLES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)^Here['’]s the extracted information from the prescription image:\s*")
            .expect("preamble pattern"),
        Regex::new(r"(?i)^The extracted information from the prescription:\s*")
            .expect("preamble pattern"),
        Regex::new(r"(?i)^Extracted prescription details:\s*").expect("preamble pattern"),
    ]
});

static MEDICATION_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Medication\s+\d+\s*:").expect("medication header pattern"));

/// Run the whole pipeline: locate, parse, fall back if needed, correct names.
///
/// Uses the built-in [`DictionaryCorrector`] when
/// `config.correct_medication_names` is set.
pub fn extract(raw: &str, config: &ExtractorConfig) -> ExtractionReport {
    if config.correct_medication_names {
        extract_with_corrector(raw, config, &DictionaryCorrector::default())
    } else {
        let (strategy, located, result) = extract_uncorrected(raw, config);
        finish_report(strategy, located, result)
    }
}

/// Same as [`extract`] but with a caller-supplied name correction service.
pub fn extract_with_corrector(
    raw: &str,
    config: &ExtractorConfig,
    corrector: &dyn NameCorrector,
) -> ExtractionReport {
    let (strategy, located, result) = extract_uncorrected(raw, config);
    let result = apply_name_corrections(result, corrector);
    finish_report(strategy, located, result)
}

fn extract_uncorrected<'a>(
    raw: &'a str,
    config: &ExtractorConfig,
) -> (ExtractionStrategy, &'a str, ExtractionResult) {
    let located = locate_section(raw);
    let primary = parse_section(located, config);

    if !primary.medications.is_empty() {
        return (ExtractionStrategy::LineScan, located, primary);
    }

    if !config.fallback_enabled {
        tracing::debug!("line scan found no medications, fallbacks disabled");
        return (ExtractionStrategy::Unresolved, located, primary);
    }

    match fallback::first_non_empty(&fallback::FALLBACK_STRATEGIES, raw, config) {
        Some((strategy, medications)) => {
            tracing::debug!(?strategy, count = medications.len(), "fallback recovered medications");
            let result = ExtractionResult {
                medications,
                ..primary
            };
            (strategy, located, result)
        }
        None => (ExtractionStrategy::Unresolved, located, primary),
    }
}

fn finish_report(
    strategy: ExtractionStrategy,
    located: &str,
    result: ExtractionResult,
) -> ExtractionReport {
    tracing::info!(
        ?strategy,
        medications = result.medications.len(),
        empty = result.is_empty(),
        "prescription text extracted"
    );
    ExtractionReport::new(strategy, located.to_string(), result)
}

/// Find where the prescription record starts and drop any conversational preamble.
///
/// Returns the input unchanged when no start marker is present.
pub fn locate_section(raw: &str) -> &str {
    let start = raw.find(RECORD_START).or_else(|| {
        ALTERNATE_STARTS
            .iter()
            .find_map(|marker| raw.find(*marker))
    });

    let mut section = match start {
        Some(index) => &raw[index..],
        None => raw,
    };

    for preamble in PREAMBLES.iter() {
        if let Some(found) = preamble.find(section) {
            section = &section[found.end()..];
        }
    }

    section
}

/// Line-oriented parse of a located section.
pub fn parse_section(section: &str, config: &ExtractorConfig) -> ExtractionResult {
    let mut scanner = LineScanner::new(config.normalize_frequency);
    for line in section.lines() {
        scanner.feed(line);
    }
    scanner.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScalarField {
    PatientName,
    Doctor,
    Clinic,
    Address,
    Date,
    Refills,
    Label,
}

const SCALAR_LABELS: [(&str, ScalarField); 7] = [
    ("Patient Name:", ScalarField::PatientName),
    ("Doctor Name:", ScalarField::Doctor),
    ("Clinic/Hospital Name:", ScalarField::Clinic),
    ("Address:", ScalarField::Address),
    ("Date of Prescription:", ScalarField::Date),
    ("Refills:", ScalarField::Refills),
    ("Label:", ScalarField::Label),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MedicationField {
    Name,
    Dosage,
    Frequency,
    Duration,
    Instructions,
}

const MEDICATION_LABELS: [(&str, MedicationField); 5] = [
    ("Name:", MedicationField::Name),
    ("Dosage:", MedicationField::Dosage),
    ("Frequency:", MedicationField::Frequency),
    ("Duration:", MedicationField::Duration),
    ("Instructions:", MedicationField::Instructions),
];

/// What a single trimmed line means. Classification order is the rule priority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Line {
    Scalar(ScalarField, Option<String>),
    OpenMedications,
    CloseMedications,
    MedicationHeader,
    MedicationField(MedicationField, Option<String>),
    Other,
}

pub(crate) fn classify(line: &str) -> Line {
    if let Some((label, field)) = SCALAR_LABELS
        .iter()
        .find(|(label, _)| line.contains(*label))
    {
        return Line::Scalar(*field, label_value(line, label));
    }

    if line.contains(MEDICATIONS_OPEN) {
        return Line::OpenMedications;
    }

    if line.contains(MEDICATIONS_CLOSE) {
        return Line::CloseMedications;
    }

    if MEDICATION_HEADER.is_match(line) {
        return Line::MedicationHeader;
    }

    if let Some((label, field)) = MEDICATION_LABELS
        .iter()
        .find(|(label, _)| line.contains(*label))
    {
        return Line::MedicationField(*field, label_value(line, label));
    }

    Line::Other
}

/// Text after the label, emphasis markers removed. Empty results count as absent.
fn label_value(line: &str, label: &str) -> Option<String> {
    let value = line.split(label).nth(1)?.replace('*', "");
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// A medication still being assembled from its lines.
#[derive(Debug, Default)]
pub(crate) struct MedicationDraft {
    name: Option<String>,
    dosage: Option<String>,
    frequency: Option<String>,
    duration: Option<String>,
    instructions: Option<String>,
}

impl MedicationDraft {
    pub(crate) fn absorb(&mut self, field: MedicationField, value: Option<String>) {
        let Some(value) = value else {
            return;
        };

        match field {
            MedicationField::Name => self.name = Some(value),
            MedicationField::Dosage => self.dosage = Some(value),
            MedicationField::Frequency => self.frequency = Some(value),
            MedicationField::Duration | MedicationField::Instructions if value == "N/A" => {}
            MedicationField::Duration => self.duration = Some(value),
            MedicationField::Instructions => self.instructions = Some(value),
        }
    }

    /// The finished medication, or `None` when no name was ever seen.
    pub(crate) fn finish(self, normalize_frequency: bool) -> Option<Medication> {
        let name = self.name.filter(|name| !name.is_empty())?;
        let frequency = if normalize_frequency {
            self.frequency.as_deref().map(frequency::normalize)
        } else {
            self.frequency
        };

        Some(Medication {
            name,
            dosage: self.dosage,
            frequency,
            duration: self.duration,
            instructions: self.instructions,
        })
    }
}

/// Commit the pending draft (if it has a name) and start a fresh one.
pub(crate) fn flush(
    pending: &mut MedicationDraft,
    medications: &mut Vec<Medication>,
    normalize_frequency: bool,
) {
    if let Some(medication) = std::mem::take(pending).finish(normalize_frequency) {
        medications.push(medication);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    BeforeMedications,
    InMedications,
    AfterMedications,
}

struct LineScanner {
    section: Section,
    patient: PatientInfo,
    refill: RefillNotes,
    medications: Vec<Medication>,
    pending: MedicationDraft,
    normalize_frequency: bool,
}

impl LineScanner {
    fn new(normalize_frequency: bool) -> Self {
        Self {
            section: Section::BeforeMedications,
            patient: PatientInfo::default(),
            refill: RefillNotes::default(),
            medications: Vec::new(),
            pending: MedicationDraft::default(),
            normalize_frequency,
        }
    }

    fn feed(&mut self, line: &str) {
        let in_block = self.section == Section::InMedications;

        match classify(line.trim()) {
            Line::Scalar(field, value) => self.assign(field, value),
            Line::OpenMedications => self.section = Section::InMedications,
            Line::CloseMedications => {
                self.flush();
                self.section = Section::AfterMedications;
            }
            Line::MedicationHeader if in_block => self.flush(),
            Line::MedicationField(field, value) if in_block => self.pending.absorb(field, value),
            _ => {}
        }
    }

    fn assign(&mut self, field: ScalarField, value: Option<String>) {
        if value.is_none() {
            return;
        }

        let slot = match field {
            ScalarField::PatientName => &mut self.patient.name,
            ScalarField::Doctor => &mut self.patient.doctor,
            ScalarField::Clinic => &mut self.patient.clinic,
            ScalarField::Address => &mut self.patient.address,
            ScalarField::Date => &mut self.patient.date,
            ScalarField::Refills => &mut self.refill.refills,
            ScalarField::Label => &mut self.refill.label,
        };
        *slot = value;
    }

    fn flush(&mut self) {
        flush(
            &mut self.pending,
            &mut self.medications,
            self.normalize_frequency,
        );
    }

    fn finish(mut self) -> ExtractionResult {
        self.flush();
        ExtractionResult::new(self.patient, self.medications, self.refill)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prescription_core::CorrectionError;

    const WELL_FORMED: &str = "\
**Patient Information:**
Patient Name: John Carter
Doctor Name: Dr. Meera Shah
Clinic/Hospital Name: Riverside Clinic
Address: 12 Elm Street, Springfield
Date of Prescription: 2024-03-02

**Medication(s):**

**Medication 1:**
* Name: Amoxicillin
* Dosage: 500mg - 1 cap
* Frequency: TID
* Duration: 7 days
* Instructions: N/A

**Medication 2:**
* Name: Ibuprofen
* Dosage: 400mg
* Frequency: 1 tab PRN
* Duration: N/A
* Instructions: Take with food

**Other Notes/Instructions:**
Refills: 2
Label: Take with water
";

    fn config() -> ExtractorConfig {
        ExtractorConfig::default()
    }

    #[test]
    fn well_formed_template_parses_fully() {
        let result = parse_section(WELL_FORMED, &config());

        assert_eq!(result.patient.name.as_deref(), Some("John Carter"));
        assert_eq!(result.patient.doctor.as_deref(), Some("Dr. Meera Shah"));
        assert_eq!(result.patient.clinic.as_deref(), Some("Riverside Clinic"));
        assert_eq!(
            result.patient.address.as_deref(),
            Some("12 Elm Street, Springfield")
        );
        assert_eq!(result.patient.date.as_deref(), Some("2024-03-02"));

        assert_eq!(result.medications.len(), 2);
        assert_eq!(result.medications[0].name, "Amoxicillin");
        assert_eq!(result.medications[0].frequency.as_deref(), Some("3 times per day"));
        assert_eq!(result.medications[0].duration.as_deref(), Some("7 days"));
        assert_eq!(result.medications[0].instructions, None);
        assert_eq!(result.medications[1].name, "Ibuprofen");
        assert_eq!(result.medications[1].frequency.as_deref(), Some("1 tab As needed"));
        assert_eq!(result.medications[1].duration, None);
        assert_eq!(
            result.medications[1].instructions.as_deref(),
            Some("Take with food")
        );

        assert_eq!(result.refill.refills.as_deref(), Some("2"));
        assert_eq!(result.refill.label.as_deref(), Some("Take with water"));
    }

    #[test]
    fn medication_without_name_is_dropped() {
        let text = "\
Medication(s):
Medication 1:
* Name: Metformin
* Dosage: 500mg
Medication 2:
* Name: Lisinopril
Medication 3:
* Dosage: 10mg
Other Notes/Instructions:
";
        let result = parse_section(text, &config());
        let names: Vec<&str> = result.medications.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["Metformin", "Lisinopril"]);
    }

    #[test]
    fn last_medication_flushed_without_closing_section() {
        let text = "Medication(s):\nMedication 1:\n* Name: Cetirizine\n* Frequency: QD";
        let result = parse_section(text, &config());
        assert_eq!(result.medications.len(), 1);
        assert_eq!(result.medications[0].frequency.as_deref(), Some("1 time per day"));
    }

    #[test]
    fn medication_fields_outside_block_are_ignored() {
        let text = "* Name: Amoxicillin\n* Dosage: 500mg\nOther Notes/Instructions:\n* Name: Ghost";
        let result = parse_section(text, &config());
        assert!(result.medications.is_empty());
    }

    #[test]
    fn empty_field_does_not_overwrite() {
        let text = "Medication(s):\nMedication 1:\n* Name: Warfarin\n* Name: **\n* Dosage:";
        let result = parse_section(text, &config());
        assert_eq!(result.medications[0].name, "Warfarin");
        assert_eq!(result.medications[0].dosage, None);
    }

    #[test]
    fn patient_labels_win_over_medication_name() {
        let text = "Medication(s):\nMedication 1:\n* Name: Losartan\nPatient Name: Ana Ruiz";
        let result = parse_section(text, &config());
        assert_eq!(result.patient.name.as_deref(), Some("Ana Ruiz"));
        assert_eq!(result.medications[0].name, "Losartan");
    }

    #[test]
    fn not_visible_is_kept_as_present_value() {
        let result = parse_section("Patient Name: Not visible", &config());
        assert_eq!(result.patient.name.as_deref(), Some("Not visible"));
        assert!(!result.is_empty());
    }

    #[test]
    fn frequency_left_raw_when_normalization_disabled() {
        let config = ExtractorConfig {
            normalize_frequency: false,
            ..ExtractorConfig::default()
        };
        let result = parse_section(WELL_FORMED, &config);
        assert_eq!(result.medications[0].frequency.as_deref(), Some("TID"));
    }

    #[test]
    fn locator_strips_preamble() {
        let raw = "Here's the extracted information from the prescription image:\nPatient Name: Jane Doe\n";
        assert!(locate_section(raw).starts_with("Patient Name: Jane Doe"));
    }

    #[test]
    fn locator_strips_preamble_without_start_marker() {
        let raw = "Extracted prescription details:\n\nDoctor Name: Dr. Lee";
        assert_eq!(locate_section(raw), "Doctor Name: Dr. Lee");
    }

    #[test]
    fn locator_strips_third_preamble() {
        let raw = "The extracted information from the prescription:\nDoctor Name: Dr. Okafor";
        assert_eq!(locate_section(raw), "Doctor Name: Dr. Okafor");
    }

    #[test]
    fn locator_preamble_match_ignores_case() {
        let raw = "HERE'S THE EXTRACTED INFORMATION FROM THE PRESCRIPTION IMAGE:\n\nLabel: Keep cold";
        assert_eq!(locate_section(raw), "Label: Keep cold");
    }

    #[test]
    fn locator_accepts_typographic_apostrophe() {
        let raw = "Here\u{2019}s the extracted information from the prescription image: Refills: 1";
        assert_eq!(locate_section(raw), "Refills: 1");
    }

    #[test]
    fn empty_scalar_label_keeps_earlier_value() {
        let text = "Refills: 3\nLabel: Shake well\nRefills:\nLabel: **";
        let result = parse_section(text, &config());
        assert_eq!(result.refill.refills.as_deref(), Some("3"));
        assert_eq!(result.refill.label.as_deref(), Some("Shake well"));
    }

    #[test]
    fn empty_scalar_label_stays_absent() {
        let result = parse_section("Refills:\nDoctor Name:   ", &config());
        assert_eq!(result.refill.refills, None);
        assert_eq!(result.patient.doctor, None);
        assert!(result.is_empty());
    }

    #[test]
    fn locator_keeps_input_without_markers() {
        let raw = "ERROR: Image is not a readable prescription";
        assert_eq!(locate_section(raw), raw);
    }

    #[test]
    fn sentinel_yields_empty_result() {
        let report = extract("ERROR: Image is not a readable prescription", &config());
        assert!(report.is_empty());
        assert_eq!(report.strategy, ExtractionStrategy::Unresolved);
        assert_eq!(serde_json::to_value(&report).unwrap()["strategy"], "none");
    }

    #[test]
    fn address_alone_is_not_empty() {
        let report = extract("Address: 4 Harbour Road", &config());
        assert!(!report.is_empty());
        assert_eq!(report.result.patient.address.as_deref(), Some("4 Harbour Road"));
    }

    #[test]
    fn extract_reports_line_scan() {
        let report = extract(WELL_FORMED, &config());
        assert_eq!(report.strategy, ExtractionStrategy::LineScan);
        assert_eq!(report.result.medications.len(), 2);
    }

    #[test]
    fn fallback_recovers_medications_without_section_opener() {
        let raw = "\
Patient Name: Sam Park
**Medication 1:**
* Name: Azithromycin
* Dosage: 250mg
* Frequency: QD
**Medication 2:**
* Name: Omeprazole
* Dosage: 20mg
* Frequency: AC
";
        let report = extract(raw, &config());
        assert_eq!(report.strategy, ExtractionStrategy::MarkerTuples);
        assert_eq!(report.result.patient.name.as_deref(), Some("Sam Park"));
        let meds = &report.result.medications;
        assert_eq!(meds.len(), 2);
        assert_eq!(meds[0].name, "Azithromycin");
        assert_eq!(meds[0].dosage.as_deref(), Some("250mg"));
        assert_eq!(meds[1].frequency.as_deref(), Some("Before meals"));
    }

    #[test]
    fn fallbacks_can_be_disabled() {
        let raw = "**Medication 1:**\n* Name: Azithromycin\n* Dosage: 250mg\n* Frequency: QD";
        let config = ExtractorConfig {
            fallback_enabled: false,
            ..ExtractorConfig::default()
        };
        let report = extract(raw, &config);
        assert!(report.result.medications.is_empty());
        assert_eq!(report.strategy, ExtractionStrategy::Unresolved);
    }

    struct FailingCorrector;

    impl NameCorrector for FailingCorrector {
        fn correct(&self, name: &str) -> Result<String, CorrectionError> {
            Err(CorrectionError::Lookup(format!("timeout for {name}")))
        }
    }

    #[test]
    fn failing_corrector_keeps_names() {
        let report = extract_with_corrector(WELL_FORMED, &config(), &FailingCorrector);
        assert_eq!(report.result.medications[0].name, "Amoxicillin");
        assert_eq!(report.result.medications[1].name, "Ibuprofen");
    }

    #[test]
    fn dictionary_correction_applies_when_enabled() {
        let raw = "Medication(s):\nMedication 1:\n* Name: Amoxicilin\n* Dosage: 500mg";
        let config = ExtractorConfig {
            correct_medication_names: true,
            ..ExtractorConfig::default()
        };
        let report = extract(raw, &config);
        assert_eq!(report.result.medications[0].name, "Amoxicillin");
    }
}
