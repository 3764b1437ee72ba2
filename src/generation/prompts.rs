//! Output-contract instructions appended to caller system text.

use std::fmt::Write;

use crate::util::html::ALLOWED_TAGS;

/// Appended to every JSON-mode system text.
pub const JSON_CONTRACT: &str = "\
ALL OF YOUR RESPONSES MUST BE VALID JSON CAPABLE OF BEING PARSED BY A STRICT JSON PARSER. \
THAT MEANS NO ESCAPE CHARACTERS OR NEW LINES OUTSIDE OF VALID STRING VALUES AND PROPERLY \
FORMED JSON WITH KEY VALUE PAIRS.
DO NOT ADD ANYTHING ELSE TO THE RESPONSE OTHER THAN WHAT IS DESCRIBED ABOVE.
FOR EXAMPLE, A PROPERLY FORMED RESPONSE LOOKS LIKE:
{\"keyone\":\"value one\", \"keytwo\":\"Values can have newlines\\n\\nin them\"}";

/// System text with the JSON contract appended.
pub fn json_system(system_text: &str) -> String {
    format!("{}\n\n{JSON_CONTRACT}", system_text.trim_end())
}

/// System text with the HTML contract appended.
pub fn html_system(system_text: &str) -> String {
    format!(
        "{}\n\nReturn the final answer as HTML using only these tags: {}. \
         Do not use attributes, markdown, code fences, or any commentary outside the HTML.",
        system_text.trim_end(),
        ALLOWED_TAGS.join(", ")
    )
}

/// System text for naming-style previews: one object per style, in order.
pub fn preview_system(styles: &[String]) -> String {
    let count = styles.len();
    let mut out = format!(
        "You are a creative name generator for fictional worlds.\n\
         You will generate {count} objects, each representing a different naming style.\n\
         Each object MUST have two fields:\n\
         1. \"people\": an array of 2 character names (first and last)\n\
         2. \"locations\": an array of 2 place names (e.g. taverns, shops, landmarks)\n\n\
         The {count} naming styles you will use are:"
    );
    for (i, style) in styles.iter().enumerate() {
        let _ = write!(out, "\n{}. \"{style}\"", i + 1);
    }
    let _ = write!(
        out,
        "\n\nYour response MUST be a valid JSON array of {count} objects, in that order. \
         Each object MUST contain exactly two arrays of two strings each, showcasing that naming style.\n\
         Do NOT add any commentary or extra formatting. ONLY return a JSON array that can be parsed by a strict JSON parser."
    );
    out
}
