//! Text cleanup before handing report text to a speech engine.

/// Replacement for a typographic character, `None` when it should be kept.
fn replacement(c: char) -> Option<&'static str> {
    let r = match c {
        '\u{2018}' | '\u{2019}' | '\u{2032}' => "'",
        '\u{201c}' | '\u{201d}' | '\u{2033}' | '\u{00ab}' | '\u{00bb}' => "\"",
        '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}' => "-",
        '\u{2026}' => "...",
        '\u{00a0}' => " ",
        // Zero-width characters and BOM
        '\u{200b}' | '\u{200c}' | '\u{200d}' | '\u{feff}' => "",
        _ => return None,
    };
    Some(r)
}

/// Clean text for speech.
///
/// - Replaces smart quotes, dashes, ellipsis and invisible spaces
/// - Drops control characters except newlines and tabs
/// - Collapses runs of spaces/tabs and more than two consecutive newlines
/// - Collapses repeated periods, which some engines read aloud
pub fn clean_for_speech(text: &str) -> String {
    let mut replaced = String::with_capacity(text.len());
    for c in text.chars() {
        match replacement(c) {
            Some(r) => replaced.push_str(r),
            None if c == '\n' || c == '\t' || !c.is_control() => replaced.push(c),
            None => {}
        }
    }

    let mut result = String::with_capacity(replaced.len());
    let mut newlines = 0;
    let mut in_space = false;
    let mut prev_period = false;

    for c in replaced.chars() {
        match c {
            '\n' => {
                newlines += 1;
                in_space = false;
                if newlines <= 2 {
                    result.push('\n');
                }
            }
            ' ' | '\t' => {
                newlines = 0;
                if !in_space {
                    result.push(' ');
                    in_space = true;
                }
            }
            _ => {
                newlines = 0;
                in_space = false;
                if !(c == '.' && prev_period) {
                    result.push(c);
                }
            }
        }
        prev_period = c == '.';
    }

    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_smart_quotes() {
        let text = "\u{201c}Ciao,\u{201d} disse. \u{2018}Bene\u{2019}";
        assert_eq!(clean_for_speech(text), "\"Ciao,\" disse. 'Bene'");
    }

    #[test]
    fn test_clean_dashes_and_ellipsis() {
        assert_eq!(clean_for_speech("one–two—three"), "one-two-three");
        assert_eq!(clean_for_speech("Wait… what?"), "Wait. what?");
    }

    #[test]
    fn test_clean_multiple_periods() {
        assert_eq!(clean_for_speech("What.. is... this...."), "What. is. this.");
    }

    #[test]
    fn test_clean_whitespace() {
        let text = "  Hello \t  world\n\n\n\nNew paragraph  ";
        assert_eq!(clean_for_speech(text), "Hello world\n\nNew paragraph");
    }

    #[test]
    fn test_clean_invisible_and_control_chars() {
        assert_eq!(clean_for_speech("A\u{200b}B\u{feff}C\x07D\u{00a0}E"), "ABCD E");
    }
}
