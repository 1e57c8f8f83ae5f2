//! Ordinal words ("first", "second", "twenty-first")
//!
//! Catalog search results name seasons in words ("Show - Second Season"),
//! so a season number has to be spelled out before it can be looked for.

const UNITS: [&str; 20] = [
    "zeroth",
    "first",
    "second",
    "third",
    "fourth",
    "fifth",
    "sixth",
    "seventh",
    "eighth",
    "ninth",
    "tenth",
    "eleventh",
    "twelfth",
    "thirteenth",
    "fourteenth",
    "fifteenth",
    "sixteenth",
    "seventeenth",
    "eighteenth",
    "nineteenth",
];

const TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

const TENS_ORDINAL: [&str; 10] = [
    "", "", "twentieth", "thirtieth", "fortieth", "fiftieth", "sixtieth", "seventieth",
    "eightieth", "ninetieth",
];

/// Spells out `n` as an English ordinal word.
///
/// Numbers from 100 on fall back to the numeric form ("100th").
pub fn ordinal_words(n: u32) -> String {
    match n {
        0..=19 => UNITS[n as usize].to_string(),
        20..=99 => {
            let (tens, units) = ((n / 10) as usize, (n % 10) as usize);
            if units == 0 {
                TENS_ORDINAL[tens].to_string()
            } else {
                format!("{}-{}", TENS[tens], UNITS[units])
            }
        }
        _ => {
            let suffix = match (n % 10, n % 100) {
                (_, 11..=13) => "th",
                (1, _) => "st",
                (2, _) => "nd",
                (3, _) => "rd",
                _ => "th",
            };
            format!("{}{}", n, suffix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinal_words() {
        assert_eq!(ordinal_words(1), "first");
        assert_eq!(ordinal_words(2), "second");
        assert_eq!(ordinal_words(12), "twelfth");
        assert_eq!(ordinal_words(20), "twentieth");
        assert_eq!(ordinal_words(21), "twenty-first");
        assert_eq!(ordinal_words(43), "forty-third");
        assert_eq!(ordinal_words(101), "101st");
        assert_eq!(ordinal_words(112), "112th");
    }
}
