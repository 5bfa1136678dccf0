//! Filename sanitization for downloaded titles.

/// Characters that are unsafe in a filename on at least one desktop OS.
const FORBIDDEN: &[char] = &['\\', '/', ':', '"', '*', '?', '<', '>', '|'];

/// Replaces each of `\ / : " * ? < > |` with `_`.
///
/// Idempotent: the output never contains a forbidden character, so a second
/// pass changes nothing.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if FORBIDDEN.contains(&c) { '_' } else { c })
        .collect()
}

/// Sanitized file stem for a title, falling back to `untitled` when the
/// title is blank.
pub fn file_stem_for(title: &str) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        sanitize_filename(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_every_forbidden_char() {
        assert_eq!(sanitize_filename(r#"a\b/c:d"e*f?g<h>i|j"#), "a_b_c_d_e_f_g_h_i_j");
    }

    #[test]
    fn each_char_maps_to_one_underscore() {
        assert_eq!(sanitize_filename("AC/DC: Live??"), "AC_DC_ Live__");
    }

    #[test]
    fn is_idempotent() {
        for input in [
            "plain title",
            "AC/DC - Back In Black",
            r#"<<weird>> "quoted" name|pipe"#,
            "",
            "日本語/タイトル",
        ] {
            let once = sanitize_filename(input);
            assert_eq!(sanitize_filename(&once), once, "input: {input}");
        }
    }

    #[test]
    fn blank_title_becomes_untitled() {
        assert_eq!(file_stem_for("   "), "untitled");
        assert_eq!(file_stem_for(" Song: Remix "), "Song_ Remix");
    }
}
