use html_escape::decode_html_entities;
use scraper::Html;

/// Strips markup remnants and collapses whitespace in a text fragment.
///
/// Returns `None` when nothing printable remains, so callers can treat an
/// empty result as an absent value.
pub fn clean_text(raw: &str) -> Option<String> {
    let fragment = Html::parse_fragment(raw);
    let text = fragment
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ");
    // some sources double-encode entities
    let decoded = decode_html_entities(&decode_html_entities(&text)).into_owned();
    let collapsed = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_collapses_whitespace() {
        assert_eq!(
            clean_text("<b>Jasmine</b>   Rice\n\t(12 oz)"),
            Some("Jasmine Rice (12 oz)".to_string())
        );
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(clean_text("1 Thumb Ginger"), Some("1 Thumb Ginger".to_string()));
    }

    #[test]
    fn decodes_entities() {
        assert_eq!(
            clean_text("Mac &amp;amp; Cheese"),
            Some("Mac & Cheese".to_string())
        );
    }

    #[test]
    fn empty_input_is_absent() {
        assert_eq!(clean_text(""), None);
        assert_eq!(clean_text("   \n "), None);
        assert_eq!(clean_text("<div></div>"), None);
    }
}
