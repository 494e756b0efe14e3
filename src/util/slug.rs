//! Slug generation for goal identifiers
//!
//! Slugs are the stable, user-facing identifier for a goal. They are set
//! once at creation and never change, so URLs on the published site stay
//! valid across rebuilds.

/// Create a stable, readable slug from a goal title.
///
/// Example: "Read 12 Books" -> "read_12_books"
pub fn make_slug(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut last_was_sep = true;

    for ch in title.trim().chars() {
        let ch = match ch {
            '&' => {
                push_word(&mut out, "and", &mut last_was_sep);
                continue;
            }
            c if c.is_ascii_alphanumeric() => c.to_ascii_lowercase(),
            _ => {
                if !last_was_sep {
                    out.push('_');
                    last_was_sep = true;
                }
                continue;
            }
        };
        out.push(ch);
        last_was_sep = false;
    }

    out.trim_matches('_').to_string()
}

/// Check that a slug only contains the characters make_slug produces.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn push_word(out: &mut String, word: &str, last_was_sep: &mut bool) {
    if !*last_was_sep {
        out.push('_');
    }
    out.push_str(word);
    *last_was_sep = false;
}
