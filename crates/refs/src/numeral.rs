//! Hebrew numerals, used for the Hebrew form of segment refs.

const GERESH: char = '\u{05F3}';
const GERSHAYIM: char = '\u{05F4}';

const HUNDREDS: [(u64, char); 4] = [(400, 'ת'), (300, 'ש'), (200, 'ר'), (100, 'ק')];
const TENS: [char; 9] = ['י', 'כ', 'ל', 'מ', 'נ', 'ס', 'ע', 'פ', 'צ'];
const ONES: [char; 9] = ['א', 'ב', 'ג', 'ד', 'ה', 'ו', 'ז', 'ח', 'ט'];

/// Encode `n` as a Hebrew numeral with punctuation.
///
/// A single letter takes a trailing geresh (`א׳`), several letters take a
/// gershayim before the last one (`כ״א`). 15 and 16 are written `ט״ו` and
/// `ט״ז`. Thousands are written as a single letter followed by a geresh.
/// Zero has no representation and encodes to an empty string.
///
/// ```
/// use folio_refs::hebrew_numeral;
/// assert_eq!(hebrew_numeral(1), "א׳");
/// assert_eq!(hebrew_numeral(21), "כ״א");
/// assert_eq!(hebrew_numeral(15), "ט״ו");
/// ```
pub fn hebrew_numeral(n: u64) -> String {
    let mut out = String::new();
    if n >= 1000 {
        out.push_str(&hebrew_numeral(n / 1000));
        if n % 1000 == 0 {
            return out;
        }
    }
    let mut letters = Vec::new();
    let mut rest = n % 1000;
    for (value, letter) in HUNDREDS {
        while rest >= value {
            letters.push(letter);
            rest -= value;
        }
    }
    match rest {
        15 => letters.extend(['ט', 'ו']),
        16 => letters.extend(['ט', 'ז']),
        _ => {
            if rest >= 10 {
                letters.push(TENS[(rest / 10 - 1) as usize]);
            }
            if rest % 10 > 0 {
                letters.push(ONES[(rest % 10 - 1) as usize]);
            }
        },
    }
    match letters.split_last() {
        None => {},
        Some((last, [])) => {
            out.push(*last);
            out.push(GERESH);
        },
        Some((last, init)) => {
            out.extend(init);
            out.push(GERSHAYIM);
            out.push(*last);
        },
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, "א׳")]
    #[case(10, "י׳")]
    #[case(15, "ט״ו")]
    #[case(16, "ט״ז")]
    #[case(21, "כ״א")]
    #[case(100, "ק׳")]
    #[case(115, "קט״ו")]
    #[case(176, "קע״ו")]
    #[case(500, "ת״ק")]
    #[case(0, "")]
    fn test_hebrew_numeral(#[case] n: u64, #[case] expected: &str) {
        assert_eq!(hebrew_numeral(n), expected);
    }
}
