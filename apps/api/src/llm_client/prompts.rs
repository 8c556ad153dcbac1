// Prompt fragments for resume field extraction.
// The generative strategy assembles these; no other module builds prompts.

use crate::extraction::types::{FieldType, ResultLimit};

/// Sentinel the model is told to answer with when a single-valued field is absent.
pub const NOT_FOUND: &str = "NOT_FOUND";

/// System prompt shared by every extraction call.
pub const EXTRACTION_SYSTEM: &str = "You are a precise resume data extractor. \
    Answer with the requested value only. \
    Do NOT include explanations, apologies or markdown. \
    Never invent information that is not present in the resume text.";

fn field_instruction(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::Name => "Extract the candidate's full name from the resume text.",
        FieldType::Email => "Extract the candidate's email address from the resume text.",
        FieldType::Skills => {
            "Extract all technical and professional skills mentioned in the resume text."
        }
    }
}

fn answer_format(limit: ResultLimit) -> String {
    match limit {
        ResultLimit::Single => format!(
            "Return only the value itself on a single line. \
             If it is not present, return exactly {NOT_FOUND}."
        ),
        ResultLimit::Unlimited => "Return the result as a valid JSON array of strings. \
             If nothing is found, return an empty array: []"
            .to_string(),
        ResultLimit::AtMost(n) => format!(
            "Return the result as a valid JSON array of at most {n} strings, most relevant first. \
             If nothing is found, return an empty array: []"
        ),
    }
}

/// Builds the field-specific instruction with the resume text embedded.
pub fn build_extraction_prompt(field_type: FieldType, limit: ResultLimit, text: &str) -> String {
    format!(
        "{instruction}\n{format}\n\nResume text:\n{text}\n\nResponse:",
        instruction = field_instruction(field_type),
        format = answer_format(limit),
    )
}
