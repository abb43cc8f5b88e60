//! Rule-based English surface morphology.
//!
//! The generator asks for one inflected form at a time through
//! [`Morphology::surf_word`]; everything else here is the handful of
//! phrase-assembly helpers it needs (articles, list punctuation,
//! capitalization). Rules first, then a small irregular table. No attempt
//! is made at coverage beyond everyday command-and-describe vocabulary.

use crate::tags::Tag;

/// Surface-form provider for the generator.
///
/// Tags actually requested: [`Tag::VProg`] (progressive), [`Tag::VPast`]
/// (simple past), [`Tag::VPres`] (third-singular present), [`Tag::NPl`]
/// (plural), and [`Tag::NPoss`] (possessive). Any other tag returns the
/// stem unchanged.
pub trait Morphology {
    fn surf_word(&self, stem: &str, tag: Tag) -> String;
}

/// Rule-based English inflection.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishMorph;

impl Morphology for EnglishMorph {
    fn surf_word(&self, stem: &str, tag: Tag) -> String {
        match tag {
            Tag::VProg => progressive(stem),
            Tag::VPast => past(stem),
            Tag::VPres => third_singular(stem),
            Tag::NPl => pluralize(stem),
            Tag::NPoss => possessive(stem),
            _ => stem.to_string(),
        }
    }
}

const IRREGULAR_PAST: &[(&str, &str)] = &[
    ("be", "was"),
    ("come", "came"),
    ("do", "did"),
    ("eat", "ate"),
    ("find", "found"),
    ("get", "got"),
    ("give", "gave"),
    ("go", "went"),
    ("have", "had"),
    ("hold", "held"),
    ("know", "knew"),
    ("make", "made"),
    ("put", "put"),
    ("say", "said"),
    ("see", "saw"),
    ("take", "took"),
    ("tell", "told"),
];

const IRREGULAR_PLURAL: &[(&str, &str)] = &[
    ("child", "children"),
    ("deer", "deer"),
    ("fish", "fish"),
    ("foot", "feet"),
    ("goose", "geese"),
    ("man", "men"),
    ("mouse", "mice"),
    ("person", "people"),
    ("sheep", "sheep"),
    ("tooth", "teeth"),
    ("woman", "women"),
];

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Final consonant-vowel-consonant shape doubles the last letter before
/// a vowel-initial suffix ("grab" -> "grabbing", but not "show" or "fix").
fn doubles_final(stem: &str) -> bool {
    let chars: Vec<char> = stem.chars().collect();
    let n = chars.len();
    if n < 2 || n > 4 {
        return false;
    }
    let last = chars[n - 1];
    if is_vowel(last) || matches!(last, 'w' | 'x' | 'y') {
        return false;
    }
    if !is_vowel(chars[n - 2]) {
        return false;
    }
    n == 2 || !is_vowel(chars[n - 3])
}

/// Progressive: "grab" -> "grabbing", "make" -> "making", "die" -> "dying",
/// "see" -> "seeing".
pub fn progressive(stem: &str) -> String {
    if let Some(base) = stem.strip_suffix("ie") {
        return format!("{base}ying");
    }
    if stem.ends_with('e') && !stem.ends_with("ee") {
        return format!("{}ing", &stem[..stem.len() - 1]);
    }
    if doubles_final(stem) {
        let last = stem.chars().last().unwrap_or('x');
        return format!("{stem}{last}ing");
    }
    format!("{stem}ing")
}

/// Simple past: irregular table first, then "-ed" rules.
pub fn past(stem: &str) -> String {
    if let Some((_, p)) = IRREGULAR_PAST.iter().find(|(s, _)| *s == stem) {
        return (*p).to_string();
    }
    if stem.ends_with('e') {
        return format!("{stem}d");
    }
    if let Some(base) = consonant_y(stem) {
        return format!("{base}ied");
    }
    if doubles_final(stem) {
        let last = stem.chars().last().unwrap_or('x');
        return format!("{stem}{last}ed");
    }
    format!("{stem}ed")
}

/// Third-person singular present: "go" -> "goes", "watch" -> "watches",
/// "carry" -> "carries".
pub fn third_singular(stem: &str) -> String {
    match stem {
        "be" => return "is".to_string(),
        "have" => return "has".to_string(),
        "do" => return "does".to_string(),
        _ => {}
    }
    sibilant_s(stem)
}

/// Plural noun: irregular table first, then "-s" rules.
pub fn pluralize(noun: &str) -> String {
    if let Some((_, p)) = IRREGULAR_PLURAL.iter().find(|(s, _)| *s == noun) {
        return (*p).to_string();
    }
    sibilant_s(noun)
}

/// Possessive: "Bob" -> "Bob's", "James" -> "James'".
pub fn possessive(noun: &str) -> String {
    if noun.ends_with('s') {
        format!("{noun}'")
    } else {
        format!("{noun}'s")
    }
}

fn sibilant_s(word: &str) -> String {
    if word.ends_with('s')
        || word.ends_with('x')
        || word.ends_with('z')
        || word.ends_with("ch")
        || word.ends_with("sh")
        || word.ends_with('o')
    {
        return format!("{word}es");
    }
    if let Some(base) = consonant_y(word) {
        return format!("{base}ies");
    }
    format!("{word}s")
}

/// Stem minus a trailing consonant-y, or `None`.
fn consonant_y(word: &str) -> Option<&str> {
    let base = word.strip_suffix('y')?;
    let prev = base.chars().last()?;
    (!is_vowel(prev)).then_some(base)
}

/// Indefinite or definite article for a word: "a dog", "an apple", "the cup".
pub fn article(word: &str, def: bool) -> &'static str {
    if def {
        return "the";
    }
    match word.chars().next() {
        Some(c) if is_vowel(c.to_ascii_lowercase()) => "an",
        _ => "a",
    }
}

/// Uppercase the first letter.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// English list punctuation: "x", "x and y", "x, y, and z".
pub fn join_list(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [one] => one.clone(),
        [a, b] => format!("{a} and {b}"),
        _ => {
            let head = &items[..items.len() - 1];
            let last = &items[items.len() - 1];
            format!("{}, and {last}", head.join(", "))
        }
    }
}
