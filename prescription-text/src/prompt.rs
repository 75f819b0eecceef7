//! Instructions sent to the upstream image-analysis service.
//!
//! The parser keys on the headers and labels requested here, so the two must
//! change together.

/// Reply the upstream service is told to give for images that are not prescriptions.
pub const NOT_A_PRESCRIPTION: &str = "ERROR: Image is not a readable prescription";

/// Prompt asking for the fixed answer template.
pub const EXTRACTION_PROMPT: &str = r#"Analyze the following prescription image and extract ALL information in EXACTLY this structured format. Follow the format precisely with the exact headers and structure shown below:

**Patient Information:**
Patient Name: [Extract patient name or write "Not visible"]
Doctor Name: [Extract doctor name or write "Not visible"]
Clinic/Hospital Name: [Extract clinic/hospital name or write "Not visible"]
Address: [Extract address or write "Not visible"]
Date of Prescription: [Extract date or write "Not visible"]

**Medication(s):**

**Medication 1:**
* Name: [Medication name or "Not visible"]
* Dosage: [Exact dosage like "100mg - 1 tab" or "Not visible"]
* Frequency: [How often like "BID (twice a day)" or "Not visible"]
* Duration: [How long like "7 days" or "N/A" if not specified]
* Instructions: [Special instructions or "N/A" if none]

**Medication 2:**
* Name: [Medication name or "Not visible"]
* Dosage: [Exact dosage or "Not visible"]
* Frequency: [How often or "Not visible"]
* Duration: [How long or "N/A" if not specified]
* Instructions: [Special instructions or "N/A" if none]

[Continue this pattern for ALL medications found - add Medication 3, 4, 5, etc. as needed]

**Other Notes/Instructions:**
Refills: [Number of refills allowed or "Not visible"]
Label: [Any label instructions or "Not visible"]

IMPORTANT FORMATTING RULES:
1. Use EXACTLY the headers shown above with double asterisks (**)
2. For medications, use the exact format "**Medication X:**" where X is the number
3. Under each medication, use bullet points with single asterisks (*)
4. Always include ALL fields even if "Not visible" or "N/A"
5. If you find more than 2 medications, add them as Medication 3, Medication 4, etc.
6. Do not add any extra text, explanations, or formatting outside this structure
7. If the image is not a prescription or unreadable, write only: "ERROR: Image is not a readable prescription"

Extract every piece of visible text from the prescription, even if handwritten or partially unclear. If text is partially visible, write what you can see followed by "[partially visible]"."#;
