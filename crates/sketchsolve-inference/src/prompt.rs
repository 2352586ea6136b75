//! Instruction prompt sent alongside each snapshot.
//!
//! The prompt pins down the reply format hard enough that [`crate::reply`]
//! can parse it: a JSON list of `{"expr", "result", "assign"}` objects, no
//! markdown fences. Models still ignore that occasionally, which is why the
//! parser keeps a verbatim fallback.

use std::collections::{BTreeMap, HashMap};

/// Snapshots are always encoded as PNG before upload.
pub const MIME_PNG: &str = "image/png";

const INSTRUCTIONS: &str = r#"You have been given an image with some mathematical expressions, equations, or graphical problems, and you need to solve them.
Note: Use the PEMDAS rule for solving mathematical expressions. PEMDAS stands for the Priority Order: Parentheses, Exponents, Multiplication and Division (from left to right), Addition and Subtraction (from left to right). Parentheses have the highest priority, followed by Exponents, then Multiplication and Division, and lastly Addition and Subtraction.
For example:
Q. 2 + 3 * 4
(3 * 4) => 12, 2 + 12 = 14.
Q. 2 + 3 + 5 * 4 - 8 / 2
5 * 4 => 20, 8 / 2 => 4, 2 + 3 => 5, 5 + 20 => 25, 25 - 4 => 21.
YOU CAN HAVE FIVE TYPES OF EQUATIONS/EXPRESSIONS IN THIS IMAGE, AND ONLY ONE CASE SHALL APPLY EVERY TIME:
Following are the cases:
1. Simple mathematical expressions like 2 + 2, 3 * 4, 5 / 6, 7 - 8, etc.: In this case, solve and return the answer in the format of a LIST OF ONE DICT [{"expr": given expression, "result": calculated answer}].
2. Set of Equations like x^2 + 2x + 1 = 0, 3y + 4x = 0, 5x^2 + 6y + 7 = 12, etc.: In this case, solve for the given variable, and the format should be a COMMA SEPARATED LIST OF DICTS, with dict 1 as {"expr": "x", "result": 2, "assign": true} and dict 2 as {"expr": "y", "result": 5, "assign": true}. This example assumes x was calculated as 2, and y as 5. Include as many dicts as there are variables.
3. Assigning values to variables like x = 4, y = 5, z = 6, etc.: In this case, assign values to variables and return another key in the dict called {"assign": true}, keeping the variable as 'expr' and the value as 'result' in the original dictionary. RETURN AS A LIST OF DICTS.
4. Analyzing Graphical Math problems, which are word problems represented in drawing form, such as cars colliding, trigonometric problems, problems on the Pythagorean theorem, adding runs from a cricket wagon wheel, etc. These will have a drawing representing some scenario and accompanying information with the image. PAY CLOSE ATTENTION TO DIFFERENT COLORS FOR THESE PROBLEMS. You need to return the answer in the format of a LIST OF ONE DICT [{"expr": given expression, "result": calculated answer}].
5. Detecting Abstract Concepts that a drawing might show, such as love, hate, jealousy, patriotism, or a historic reference to war, invention, discovery, quote, etc. USE THE SAME FORMAT AS OTHERS TO RETURN THE ANSWER, where 'expr' will be the explanation of the drawing, and 'result' will be the abstract concept.
Analyze the equation or expression in this image and return the answer according to the given rules.
Make sure to use extra backslashes for escape characters like \f -> \\f, \n -> \\n, etc."#;

const CLOSING: &str = r#"DO NOT USE BACKTICKS OR MARKDOWN FORMATTING.
PROPERLY QUOTE THE KEYS AND VALUES IN THE DICTIONARY FOR EASIER PARSING."#;

/// Assemble the full instruction prompt, injecting previously assigned
/// variables so the model can substitute their values.
pub fn build_prompt(dict_of_vars: &HashMap<String, serde_json::Value>) -> String {
    // BTreeMap gives a stable key order, so identical inputs produce
    // identical prompts.
    let sorted: BTreeMap<&String, &serde_json::Value> = dict_of_vars.iter().collect();
    let vars_json = serde_json::to_string(&sorted).unwrap_or_else(|_| "{}".into());

    format!(
        "{INSTRUCTIONS}\nHere is a dictionary of user-assigned variables. If the given expression has any of these variables, use its actual value from this dictionary accordingly: {vars_json}.\n{CLOSING}"
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_prompt_mentions_all_five_cases() {
        let prompt = build_prompt(&HashMap::new());
        assert!(prompt.contains("PEMDAS"));
        assert!(prompt.contains("1. Simple mathematical expressions"));
        assert!(prompt.contains("2. Set of Equations"));
        assert!(prompt.contains("3. Assigning values to variables"));
        assert!(prompt.contains("4. Analyzing Graphical Math problems"));
        assert!(prompt.contains("5. Detecting Abstract Concepts"));
        assert!(prompt.contains("DO NOT USE BACKTICKS OR MARKDOWN FORMATTING."));
    }

    #[test]
    fn test_prompt_injects_empty_vars() {
        let prompt = build_prompt(&HashMap::new());
        assert!(prompt.contains("from this dictionary accordingly: {}."));
    }

    #[test]
    fn test_prompt_injects_vars_in_stable_order() {
        let mut vars = HashMap::new();
        vars.insert("y".to_string(), json!(5));
        vars.insert("x".to_string(), json!(4));
        let prompt = build_prompt(&vars);
        assert!(prompt.contains(r#"{"x":4,"y":5}"#));
        assert_eq!(prompt, build_prompt(&vars));
    }
}
