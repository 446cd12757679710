// Analysis pipeline prompt templates.
// All prompts for the analysis module are defined here.

/// Character cap applied to extracted resume text before it is embedded in
/// the prompt. Bounds request size and model cost; truncation is silent and
/// deliberately lossy.
pub const DEFAULT_PROMPT_CHAR_CAP: usize = 15_000;

const ANALYSIS_PROMPT_TEMPLATE: &str = r#"You are an expert HR Recruiter. Analyze the following document.
IT MAY CONTAIN A SINGLE RESUME OR MULTIPLE RESUMES COMBINED INTO ONE FILE.

DOCUMENT TEXT:
{resume_text}

Task:
1. Identify each distinct candidate in the text.
2. For EACH candidate, extract:
   - Name
   - Key Technical Skills
   - Years of Work Experience (estimate as a number, e.g., 3 for "3 years")
   - Highest Education Level (e.g., "Bachelor's in CS", "Master's in Engineering", "PhD")
   - "Job Fit Score" (0-100) for a Senior Software Engineer role.
   - Suggested Role (based on their specific skills).
   - A short summary.

Return ONLY a JSON ARRAY of objects. No prose, no markdown fences.
Example format:
[
  {
    "name": "Candidate Name",
    "score": 85,
    "skills": ["React", "Node.js"],
    "experience": 5,
    "education": "Bachelor's in Computer Science",
    "role": "Frontend Developer",
    "summary": "Strong experience in..."
  },
  ...
]
"#;

/// Builds the analysis prompt for the given extracted text.
///
/// Pure and deterministic: identical input always produces an identical
/// prompt. The text is truncated to `char_cap` characters before embedding;
/// the cut never lands inside a multi-byte character.
pub fn build_analysis_prompt(text: &str, char_cap: usize) -> String {
    ANALYSIS_PROMPT_TEMPLATE.replace("{resume_text}", truncate_chars(text, char_cap))
}

/// Returns the prefix of `text` holding at most `cap` characters.
fn truncate_chars(text: &str, cap: usize) -> &str {
    match text.char_indices().nth(cap) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_text_verbatim_under_cap() {
        let prompt = build_analysis_prompt("Jane Doe, Rust engineer.", DEFAULT_PROMPT_CHAR_CAP);
        assert!(prompt.contains("Jane Doe, Rust engineer."));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let a = build_analysis_prompt("same input", 100);
        let b = build_analysis_prompt("same input", 100);
        assert_eq!(a, b);
    }

    #[test]
    fn test_prompt_declares_every_schema_field() {
        let prompt = build_analysis_prompt("x", 100);
        for field in ["name", "score", "skills", "experience", "education", "role", "summary"] {
            assert!(prompt.contains(&format!("\"{field}\"")), "missing field {field}");
        }
    }

    #[test]
    fn test_prompt_asks_for_one_or_many_candidates() {
        let prompt = build_analysis_prompt("x", 100);
        assert!(prompt.contains("MULTIPLE RESUMES"));
        assert!(prompt.contains("EACH candidate"));
    }

    #[test]
    fn test_truncation_applies_cap() {
        let text = "a".repeat(50);
        let prompt = build_analysis_prompt(&text, 10);
        assert!(prompt.contains(&"a".repeat(10)));
        assert!(!prompt.contains(&"a".repeat(11)));
    }

    #[test]
    fn test_truncation_counts_chars_not_bytes() {
        // é is two bytes in UTF-8; a byte-indexed cut at 3 would panic.
        let text = "ééé";
        assert_eq!(truncate_chars(text, 2), "éé");
        assert_eq!(truncate_chars(text, 3), "ééé");
        assert_eq!(truncate_chars(text, 10), "ééé");
    }

    #[test]
    fn test_zero_cap_embeds_no_text() {
        assert_eq!(truncate_chars("hello", 0), "");
    }
}
