// Shared prompt fragments. Each use case keeps its own templates in
// analysis/prompts.rs; only cross-cutting instructions live here.

/// Appended to every prompt whose answer is parsed as JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "\n\nCRITICAL: Return ONLY valid JSON. \
    Do NOT add any text before or after it. \
    Do NOT use markdown, code fences, comments, or trailing commas.";

/// Appends the JSON-only instruction to a prompt.
pub fn with_json_instruction(prompt: &str) -> String {
    format!("{prompt}{JSON_ONLY_INSTRUCTION}")
}
