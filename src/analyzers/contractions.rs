use anyhow::Result;
use regex::{Captures, Regex};
use std::collections::HashMap;

use super::ContractionExpander;

const IRREGULAR: &[(&str, &str)] = &[
    ("ain't", "are not"),
    ("can't", "cannot"),
    ("could've", "could have"),
    ("couldn't've", "could not have"),
    ("didn't", "did not"),
    ("e'er", "ever"),
    ("he's", "he is"),
    ("here's", "here is"),
    ("how's", "how is"),
    ("i'd", "I would"),
    ("i'd've", "I would have"),
    ("i'll", "I will"),
    ("i'm", "I am"),
    ("i've", "I have"),
    ("it's", "it is"),
    ("let's", "let us"),
    ("ma'am", "madam"),
    ("might've", "might have"),
    ("must've", "must have"),
    ("ne'er", "never"),
    ("o'clock", "of the clock"),
    ("o'er", "over"),
    ("shan't", "shall not"),
    ("she's", "she is"),
    ("should've", "should have"),
    ("that's", "that is"),
    ("there's", "there is"),
    ("they'd've", "they would have"),
    ("what's", "what is"),
    ("when's", "when is"),
    ("where's", "where is"),
    ("who's", "who is"),
    ("why's", "why is"),
    ("won't", "will not"),
    ("would've", "would have"),
    ("y'all", "you all"),
];

const SLANG: &[(&str, &str)] = &[
    ("gimme", "give me"),
    ("gonna", "going to"),
    ("gotta", "got to"),
    ("kinda", "kind of"),
    ("lemme", "let me"),
    ("outta", "out of"),
    ("sorta", "sort of"),
    ("wanna", "want to"),
];

const SUFFIXES: &[(&str, &str)] = &[
    ("n't", " not"),
    ("'ll", " will"),
    ("'re", " are"),
    ("'ve", " have"),
    ("'d", " would"),
    ("'m", " am"),
];

/// Expands English contractions, keeping the capitalization of the original token.
pub struct Contractions {
    pattern: Regex,
    table: HashMap<&'static str, &'static str>,
}

impl Contractions {
    pub fn new() -> Result<Self> {
        let slang = SLANG.iter().map(|(word, _)| *word).collect::<Vec<_>>().join("|");
        let pattern = Regex::new(&format!(r"(?i)\b[a-z]+(?:['’][a-z]+)+\b|\b(?:{})\b", slang))?;
        let table = IRREGULAR.iter().chain(SLANG).copied().collect();
        Ok(Self { pattern, table })
    }

    fn expand_token(&self, token: &str) -> String {
        let lower = token.to_lowercase().replace('’', "'");
        let expanded = match self.table.get(lower.as_str()) {
            Some(full) => full.to_string(),
            None => match SUFFIXES
                .iter()
                .find_map(|&(suffix, full)| lower.strip_suffix(suffix).map(|stem| (stem, full)))
            {
                Some((stem, full)) if !stem.is_empty() => format!("{}{}", stem, full),
                // Possessives and unknown forms stay as written.
                _ => return token.to_string(),
            },
        };
        match_case(token, expanded)
    }
}

impl ContractionExpander for Contractions {
    fn expand(&self, text: &str) -> Result<String> {
        Ok(self
            .pattern
            .replace_all(text, |caps: &Captures| self.expand_token(&caps[0]))
            .into_owned())
    }
}

fn match_case(original: &str, expanded: String) -> String {
    let letters: Vec<char> = original.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() > 1 && letters.iter().all(|c| c.is_uppercase()) {
        return expanded.to_uppercase();
    }
    if original.chars().next().is_some_and(char::is_uppercase) {
        let mut chars = expanded.chars();
        if let Some(first) = chars.next() {
            return first.to_uppercase().chain(chars).collect();
        }
    }
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(text: &str) -> String {
        Contractions::new().unwrap().expand(text).unwrap()
    }

    #[test]
    fn expands_common_contractions() {
        assert_eq!(
            expand("I can't believe it's happening and I'm thrilled"),
            "I cannot believe it is happening and I am thrilled"
        );
        assert_eq!(expand("we'll see, they've left"), "we will see, they have left");
        assert_eq!(expand("you're sure he won't?"), "you are sure he will not?");
    }

    #[test]
    fn keeps_case_of_the_original_token() {
        assert_eq!(expand("Don't go"), "Do not go");
        assert_eq!(expand("DON'T GO"), "DO NOT GO");
        assert_eq!(expand("It's fine"), "It is fine");
    }

    #[test]
    fn handles_typographic_apostrophes_and_slang() {
        assert_eq!(expand("I’m gonna go"), "I am going to go");
        assert_eq!(expand("Wanna come?"), "Want to come?");
    }

    #[test]
    fn leaves_possessives_and_plain_text_alone() {
        assert_eq!(expand("John's car is red"), "John's car is red");
        assert_eq!(expand("nothing to expand here"), "nothing to expand here");
        assert_eq!(expand(""), "");
    }
}
