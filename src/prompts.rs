//! Extraction prompt for identity-document images.
//!
//! Centralising the prompt here serves two purposes:
//!
//! 1. **Single source of truth**: tuning a heuristic or an output rule
//!    requires editing exactly one place.
//!
//! 2. **Testability**: unit tests inspect the prompt directly without a
//!    real VLM, so prompt regressions are easy to catch.
//!
//! [`build_prompt`] is a pure function of the field list: no timestamps, no
//! randomness, so the same fields always produce byte-identical text.

use crate::fields::FieldDescriptor;

/// Framing and reading heuristics, placed before the field list.
pub const FRAMING: &str = r#"You are an expert at reading civil-status and identity documents. The image you receive may be a scan or a phone photo of a passport, birth certificate, residence permit, identity card, marriage certificate or proof of address.

Documents are frequently handwritten, faded, skewed or photographed in poor light, and are usually issued by French-speaking Central African civil registries. Apply these heuristics while reading:

1. NAMES
   - Family names are often written in capitals and may precede given names
   - Accept regional spelling variants (e.g. "Mba" / "M'Ba", "Ndong" / "N'Dong") and keep the spelling shown on the document
   - Do not translate or anglicise names

2. DIGITS
   - Disambiguate handwritten digits from context: 1 vs 7, 0 vs 6, 5 vs S, 2 vs Z, 8 vs B
   - Dates are written day first (DD/MM/YYYY) and months may be spelled out in French ("12 janvier 1987")

3. STAMPS AND SEALS
   - Text partially covered by stamps, seals or signatures must be reconstructed only when the remaining letters make it unambiguous

4. HANDWRITING
   - A single document may mix printed form labels, typewriter text and several handwriting styles; read each field from the handwriting next to its label"#;

/// Output-format directives, placed after the field list.
pub const OUTPUT_RULES: &str = r#"OUTPUT FORMAT
- Return ONLY a JSON object whose keys are the field names above
- Dates must use the YYYY-MM-DD format
- Gender must be MALE or FEMALE
- Addresses must be an object: {"firstLine": "...", "secondLine": "...", "city": "...", "zipCode": "...", "country": "..."} (secondLine is optional)
- Countries and nationalities must be lowercase snake_case English country names (e.g. "gabon", "france", "central_african_republic", "cote_d_ivoire")
- Omit any field you cannot find; never invent a value
- Do NOT wrap the JSON in markdown fences
- Do NOT add commentary or explanations before or after the JSON"#;

/// Render one field as `- name - description - (Required|Optional) - [type]`.
///
/// Empty components are omitted rather than rendered as blank separators.
pub fn render_field(field: &FieldDescriptor) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(4);
    if !field.name.is_empty() {
        parts.push(field.name.clone());
    }
    if !field.description.trim().is_empty() {
        parts.push(field.description.trim().to_string());
    }
    parts.push(if field.required {
        "(Required)".to_string()
    } else {
        "(Optional)".to_string()
    });
    if let Some(t) = field.field_type {
        parts.push(format!("[{t}]"));
    }
    format!("- {}", parts.join(" - "))
}

/// Build the extraction instruction for the given fields.
pub fn build_prompt(fields: &[FieldDescriptor]) -> String {
    let field_lines: Vec<String> = fields.iter().map(render_field).collect();
    format!(
        "{FRAMING}\n\nFIELDS TO EXTRACT\n{}\n\n{OUTPUT_RULES}",
        field_lines.join("\n")
    )
}
