//! Decoding of spelled-out Danish numbers such as "tretusindetohundrede".

struct Spelling {
    text: &'static str,
    value: i64,
}

macro_rules! spellings {
    ($($text:literal => $value:expr),* $(,)?) => {
        &[$(Spelling { text: $text, value: $value }),*]
    };
}

const FILLERS: &[&str] = &["-", "og"];

// Tried before DIGITS so that "tretten" is not read as "tre" + "tten".
const TENS: &[Spelling] = spellings! {
    "ti" => 10,
    "elleve" => 11,
    "tolv" => 12,
    "tretten" => 13,
    "fjorten" => 14,
    "femten" => 15,
    "seksten" => 16,
    "sytten" => 17,
    "atten" => 18,
    "nitten" => 19,
    "tyve" => 20,
    "tredive" => 30,
    "fyrre" => 40,
    "halvtreds" => 50,
    "tres" => 60,
    "halvfjers" => 70,
    "firs" => 80,
    "halvfems" => 90,
};

const DIGITS: &[Spelling] = spellings! {
    "nul" => 0,
    "en" => 1,
    "et" => 1,
    "to" => 2,
    "tre" => 3,
    "fire" => 4,
    "fem" => 5,
    "seks" => 6,
    "syv" => 7,
    "otte" => 8,
    "ni" => 9,
};

const MULTIPLIERS: &[Spelling] = spellings! {
    "hundrede" => 100,
    "hundred" => 100,
    "tusinde" => 1_000,
    "tusind" => 1_000,
    "millioner" => 1_000_000,
    "million" => 1_000_000,
    "milliarder" => 1_000_000_000,
    "milliard" => 1_000_000_000,
};

fn chop<'a>(rest: &mut &'a str, spellings: &[Spelling]) -> Option<i64> {
    let text: &'a str = *rest;
    let spelling = spellings.iter().find(|s| text.starts_with(s.text))?;
    *rest = &text[spelling.text.len()..];
    Some(spelling.value)
}

fn chop_filler(rest: &mut &str) -> bool {
    let text = *rest;
    match FILLERS.iter().find(|filler| text.starts_with(**filler)) {
        Some(filler) => {
            *rest = &text[filler.len()..];
            true
        }
        None => false,
    }
}

/// Decodes a whole word as a spelled number.
///
/// Returns `None` when the word is not a number at all, or when anything is
/// left over after the last recognised number word, so that "nul" (zero) is
/// distinguishable from a word that merely starts like a number.
pub fn decode(word: &str) -> Option<i64> {
    let lowered = word.to_lowercase();
    let mut rest = lowered.as_str();

    // a: units and tens being built, b: value awaiting its multiplier,
    // c: completed groups.
    let mut a: i64 = 0;
    let mut b: i64 = 0;
    let mut c: i64 = 0;
    let mut last_multiplier: i64 = 0;
    let mut word_count = 0;

    while !rest.is_empty() {
        while chop_filler(&mut rest) {}

        if let Some(value) = chop(&mut rest, TENS).or_else(|| chop(&mut rest, DIGITS)) {
            a = a.wrapping_add(value);
            word_count += 1;
            continue;
        }

        if let Some(multiplier) = chop(&mut rest, MULTIPLIERS) {
            if last_multiplier >= multiplier {
                c = c.wrapping_add(b);
                b = 0;
            }
            if a == 0 && b == 0 {
                a = 1;
            }
            b = b.wrapping_add(a).wrapping_mul(multiplier);
            a = 0;
            last_multiplier = multiplier;
            word_count += 1;
            continue;
        }

        break;
    }

    if !rest.is_empty() || word_count == 0 {
        return None;
    }

    Some(c.wrapping_add(a).wrapping_add(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_words() {
        assert_eq!(decode("nul"), Some(0));
        assert_eq!(decode("nitten"), Some(19));
        assert_eq!(decode("tusind"), Some(1000));
        assert_eq!(decode("ettusind"), Some(1000));
    }

    #[test]
    fn test_compound_numbers() {
        assert_eq!(decode("ethundredefireogtredive"), Some(134));
        assert_eq!(decode("tretusindetohundrede"), Some(3200));
        assert_eq!(decode("tretusinde-tohundrede"), Some(3200));
        assert_eq!(decode("treogtredivehundredeogatten"), Some(3318));
        assert_eq!(decode("et-tusind-to-hundrede-seks-og-tyve"), Some(1226));
        assert_eq!(decode("to-hundrede-seks-og-tyve-tusind"), Some(226000));
        assert_eq!(decode("to-hundrede-millioner"), Some(200_000_000));
    }

    #[test]
    fn test_group_boundaries() {
        assert_eq!(
            decode("tohundredeseksogtyvemillioner-tretusinde-syvoghalvtreds"),
            Some(226_003_057)
        );
        assert_eq!(
            decode("to-tusind-seks-og-tyve-millioner-fire-og-tredive-tusind-seks-hundrede-fem-og-fyrre"),
            Some(2_026_034_645)
        );
        assert_eq!(decode("to-tusind-seks-og-tyve-millioner"), Some(2_026_000_000));
    }

    #[test]
    fn test_not_numbers() {
        assert_eq!(decode("og"), None);
        assert_eq!(decode("-"), None);
        assert_eq!(decode("toogfyrrea"), None);
        assert_eq!(decode("tilbagegiver"), None);
        assert_eq!(decode("enten"), None);
        assert_eq!(decode(""), None);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(decode("Fem"), Some(5));
        assert_eq!(decode("TYVE"), Some(20));
    }
}
