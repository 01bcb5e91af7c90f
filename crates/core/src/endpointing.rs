/// Spoken markers that end a turn early, e.g. "готово".
///
/// Matching is case-insensitive and works on whole words, ignoring
/// punctuation stuck to them.
#[derive(Debug, Clone, Default)]
pub struct StopPhrases {
    phrases: Vec<Vec<String>>,
}

impl StopPhrases {
    pub fn new<S: AsRef<str>>(phrases: &[S]) -> Self {
        let phrases = phrases
            .iter()
            .map(|p| {
                p.as_ref()
                    .split_whitespace()
                    .map(normalize)
                    .filter(|w| !w.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|words| !words.is_empty())
            .collect();
        Self { phrases }
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// If `text` contains a stop phrase, returns the text with its last
    /// occurrence removed. Returns `None` when no phrase is present.
    pub fn strip(&self, text: &str) -> Option<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let normalized: Vec<String> = words.iter().map(|w| normalize(w)).collect();

        for phrase in &self.phrases {
            let n = phrase.len();
            if n > words.len() {
                continue;
            }
            let found = (0..=words.len() - n)
                .rev()
                .find(|&i| normalized[i..i + n] == phrase[..]);
            if let Some(start) = found {
                let kept: Vec<&str> = words[..start]
                    .iter()
                    .chain(&words[start + n..])
                    .copied()
                    .collect();
                return Some(kept.join(" "));
            }
        }
        None
    }
}

fn normalize(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_trailing_phrase() {
        let phrases = StopPhrases::new(&["готово"]);
        assert_eq!(phrases.strip("Меня зовут Иван, Готово!"), Some("Меня зовут Иван,".to_string()));
    }

    #[test]
    fn test_multi_word_phrase() {
        let phrases = StopPhrases::new(&["я закончил"]);
        assert_eq!(
            phrases.strip("работал инженером я закончил"),
            Some("работал инженером".to_string())
        );
        assert_eq!(phrases.strip("я работал инженером"), None);
    }

    #[test]
    fn test_partial_word_does_not_match() {
        let phrases = StopPhrases::new(&["done"]);
        assert_eq!(phrases.strip("I have undone it"), None);
    }

    #[test]
    fn test_phrase_only_leaves_empty_answer() {
        let phrases = StopPhrases::new(&["готово"]);
        assert_eq!(phrases.strip("готово"), Some(String::new()));
    }

    #[test]
    fn test_blank_phrases_are_ignored() {
        let phrases = StopPhrases::new(&["", "  ", "!"]);
        assert!(phrases.is_empty());
        assert_eq!(phrases.strip("anything"), None);
    }
}
