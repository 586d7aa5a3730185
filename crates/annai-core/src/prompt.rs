//! Prompt assembly for the grounded recommendation call.

/// Role/behavior preamble sent as the system message. This is a hard
/// constraint on the model, not a suggestion: exactly three entries,
/// grounded only in the supplied context. The model's compliance is not
/// re-validated downstream; its output is returned verbatim.
pub const SYSTEM_PREAMBLE: &str = "You are an anime recommendation assistant. \
Using ONLY the context provided in the user message, recommend exactly three anime. \
For each recommendation give: the title, a synopsis of two to three sentences, and \
one sentence stating explicitly why it matches the viewer's stated preference. \
Number the entries 1 to 3. Do not use any knowledge outside the provided context, \
and do not invent titles that are not present in it.";

/// Builds the user message: numbered grounding context followed by the raw
/// preference query.
pub fn user_prompt(query: &str, context_chunks: &[String]) -> String {
    let mut prompt = String::from("Context:\n");
    for (i, chunk) in context_chunks.iter().enumerate() {
        prompt.push_str(&format!("[{}] {}\n", i + 1, chunk));
    }
    prompt.push_str("\nViewer preference: ");
    prompt.push_str(query.trim());
    prompt
}
