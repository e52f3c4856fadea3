//! Filesystem-safe text sanitation.
//!
//! Display identities double as folder and file names, so every string that
//! reaches disk flows through [`sanitize`]. The function is total (no failure
//! mode) and idempotent: sanitizing already-sanitized text is a no-op, which
//! matters because folder names scanned back off disk get normalized again
//! when the dedup index is built.

/// Characters that are illegal in file names on at least one supported
/// platform. Replaced with an underscore.
const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Sanitize a display name for use as a file or folder name.
///
/// Two passes:
///
/// 1. Every character in `< > : " / \ | ? *` becomes `_`.
/// 2. `&` becomes `and`, ` - ` separators collapse to `, `, and runs of
///    whitespace collapse to a single space.
///
/// The result is trimmed. `sanitize(sanitize(x)) == sanitize(x)` for all
/// inputs.
pub fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if ILLEGAL_CHARS.contains(&c) {
            out.push('_');
        } else {
            out.push(c);
        }
    }
    let mut out = collapse_whitespace(&out.replace('&', "and"));
    // Fixpoint: adjacent separators ("a - - b") can expose a fresh " - "
    // after one rewrite.
    while out.contains(" - ") {
        out = out.replace(" - ", ", ");
    }
    out
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_illegal_characters_with_underscore() {
        assert_eq!(sanitize("AC/DC: Live"), "AC_DC_ Live");
        assert_eq!(sanitize(r#"a<b>c:d"e/f\g|h?i*j"#), "a_b_c_d_e_f_g_h_i_j");
    }

    #[test]
    fn substitutes_ampersand_and_dash_separators() {
        assert_eq!(
            sanitize("Dead & Company - Folsom Field"),
            "Dead and Company, Folsom Field"
        );
    }

    #[test]
    fn idempotent_on_all_inputs() {
        for input in [
            "Phish 2023-09-03 Madison Square Garden, New York, NY",
            "Dead & Company - Folsom Field",
            r#"<>:"/\|?*"#,
            "",
            "   spaced   out   ",
            "a - - b",
            "x\n-\ny",
        ] {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn no_forbidden_character_survives() {
        let all_forbidden = r#"<<>>::""//\\||??**"#;
        let cleaned = sanitize(all_forbidden);
        assert!(cleaned.chars().all(|c| c == '_'));
    }

    #[test]
    fn empty_string_is_fine() {
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn clean_input_passes_through() {
        let clean = "Phish 2023-09-03 Madison Square Garden, New York, NY";
        assert_eq!(sanitize(clean), clean);
    }
}
