// SPDX-License-Identifier: PMPL-1.0-or-later

//! Byteman rule templates and the placeholder filler.

use crate::error::{AttackError, Result};

/// Method-entry rule used by latency, exception and return faults.
pub const RULE_TEMPLATE: &str = "RULE {{Name}}
CLASS {{Class}}
METHOD {{Method}}
AT ENTRY
IF true
DO
\t{{Do}};
ENDRULE
";

pub const STRESS_RULE_TEMPLATE: &str = "RULE {{Name}}
STRESS {{StressType}}
{{StressValueName}} {{StressValue}}
ENDRULE
";

pub const GC_RULE_TEMPLATE: &str = "RULE {{Name}}
GC
ENDRULE
";

/// Fill `{{Key}}` placeholders in a single left-to-right pass.
///
/// Substituted values are never rescanned, so a class or method name that
/// happens to contain braces is copied through untouched.
pub fn fill(template: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<String> {
    let mut out = String::with_capacity(template.len() + 64);
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or_else(|| AttackError::Render("unterminated placeholder".to_string()))?;
        let key = after[..end].trim();
        let value = lookup(key)
            .ok_or_else(|| AttackError::Render(format!("no value for placeholder {}", key)))?;
        out.push_str(&value);
        rest = &after[end + 2..];
    }
    out.push_str(rest);

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(key: &str) -> Option<String> {
        match key {
            "Name" => Some("r1".to_string()),
            "Class" => Some("{{Method}}".to_string()),
            "Method" => Some("run".to_string()),
            "Do" => Some("return 1".to_string()),
            _ => None,
        }
    }

    #[test]
    fn fills_every_placeholder_once() {
        let text = fill(RULE_TEMPLATE, values).unwrap();
        assert!(text.starts_with("RULE r1\n"));
        assert!(text.contains("CLASS {{Method}}\n"));
        assert!(text.contains("METHOD run\n"));
        assert!(text.contains("DO\n\treturn 1;\nENDRULE\n"));
    }

    #[test]
    fn missing_value_is_a_render_error() {
        let err = fill(STRESS_RULE_TEMPLATE, values).unwrap_err();
        assert!(matches!(err, AttackError::Render(ref msg) if msg.contains("StressType")));
    }

    #[test]
    fn unterminated_placeholder_is_rejected() {
        assert!(fill("RULE {{Name", values).is_err());
    }
}
