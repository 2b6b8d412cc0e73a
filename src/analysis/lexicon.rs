//! Dictionary-based analyzer used when no external NLP pipeline is plugged in.
//!
//! Words come from Unicode segmentation. Tagging and lemmatization are
//! rule based, with tags named after the universal tag set so the keys look
//! like the ones a statistical tagger produces. Sentiment is the mean score of
//! the opinion words found in the text.

use super::analyzer::{AnalyzedText, AnalyzedToken, Analyzer, AnalyzerError};
use std::collections::{HashMap, HashSet};
use unicode_segmentation::UnicodeSegmentation;

const PRONOUNS: &[&str] = &[
    "i", "me", "my", "mine", "myself", "you", "your", "yours", "yourself", "yourselves", "he",
    "him", "his", "himself", "she", "her", "hers", "herself", "it", "its", "itself", "we", "us",
    "our", "ours", "ourselves", "they", "them", "their", "theirs", "themselves", "who", "whom",
    "whose", "what", "which", "this", "that", "these", "those", "someone", "something",
    "anyone", "anything", "everyone", "everything", "nobody", "nothing",
];
const DETERMINERS: &[&str] = &[
    "a", "an", "the", "every", "each", "some", "any", "no", "all", "both", "either", "neither",
    "another",
];
const ADPOSITIONS: &[&str] = &[
    "in", "on", "at", "by", "for", "with", "about", "against", "between", "into", "through",
    "during", "before", "after", "above", "below", "to", "from", "up", "down", "of", "off",
    "over", "under", "around", "without", "within", "like", "near", "behind", "across",
];
const CONJUNCTIONS: &[&str] = &["and", "or", "but", "nor", "yet", "so"];
const SUBORDINATORS: &[&str] = &["if", "because", "while", "although", "though", "unless", "whether", "since", "until"];
const AUXILIARIES: &[&str] = &[
    "be", "am", "is", "are", "was", "were", "been", "being", "have", "has", "had", "do", "does",
    "did", "will", "would", "shall", "should", "can", "could", "may", "might", "must",
];
const PARTICLES: &[&str] = &["not", "n't"];
const INTERJECTIONS: &[&str] = &[
    "oh", "hey", "hi", "hello", "yeah", "yes", "wow", "uh", "um", "okay", "ok", "bye", "huh",
    "ah", "whoa", "ooh", "aw", "hmm", "yep", "nope",
];
const ADVERBS: &[&str] = &[
    "very", "really", "so", "too", "now", "then", "here", "there", "just", "still", "never",
    "always", "again", "already", "also", "ever", "soon", "maybe", "even", "not", "well",
    "almost", "quite", "away", "back", "today", "tonight", "tomorrow", "yesterday",
];
const VERBS: &[&str] = &[
    "go", "get", "know", "think", "want", "tell", "say", "see", "come", "make", "take", "look",
    "give", "find", "feel", "need", "mean", "talk", "try", "call", "leave", "let", "love",
    "hate", "like", "help", "work", "ask", "wait", "put", "keep", "believe", "guess", "happen",
    "remember", "forget", "stop", "start", "play", "live", "die", "kill", "marry", "kiss",
    "hear", "listen", "understand", "sleep", "eat", "drink", "run", "walk", "sit", "stand",
    "meet", "pay", "buy", "sell", "read", "write", "win", "lose", "move", "hope", "miss",
    "worry", "care", "show", "bring", "watch", "turn", "open", "close", "break", "fix",
];
/// Irregular verb forms and their base form.
const IRREGULAR_VERBS: &[(&str, &str)] = &[
    ("went", "go"), ("gone", "go"), ("goes", "go"), ("got", "get"), ("gotten", "get"),
    ("knew", "know"), ("known", "know"), ("thought", "think"), ("told", "tell"),
    ("said", "say"), ("says", "say"), ("saw", "see"), ("seen", "see"), ("came", "come"),
    ("made", "make"), ("took", "take"), ("taken", "take"), ("gave", "give"), ("given", "give"),
    ("found", "find"), ("felt", "feel"), ("meant", "mean"), ("left", "leave"), ("kept", "keep"),
    ("heard", "hear"), ("understood", "understand"), ("slept", "sleep"), ("ate", "eat"),
    ("eaten", "eat"), ("drank", "drink"), ("ran", "run"), ("sat", "sit"), ("stood", "stand"),
    ("met", "meet"), ("paid", "pay"), ("bought", "buy"), ("sold", "sell"), ("wrote", "write"),
    ("written", "write"), ("won", "win"), ("lost", "lose"), ("brought", "bring"),
    ("broke", "break"), ("broken", "break"), ("died", "die"), ("dying", "die"),
    ("lying", "lie"), ("was", "be"), ("were", "be"), ("is", "be"), ("am", "be"), ("are", "be"),
    ("been", "be"), ("being", "be"), ("has", "have"), ("had", "have"), ("does", "do"),
    ("did", "do"), ("done", "do"),
];
const IRREGULAR_NOUNS: &[(&str, &str)] = &[
    ("men", "man"), ("women", "woman"), ("children", "child"), ("people", "person"),
    ("feet", "foot"), ("teeth", "tooth"), ("mice", "mouse"), ("guys", "guy"), ("wives", "wife"),
    ("lives", "life"), ("knives", "knife"),
];
const ADJECTIVE_SUFFIXES: &[&str] = &["ous", "ful", "able", "ible", "ive", "less", "ish", "ical"];

/// `(polarity, subjectivity)` of opinion words.
const SENTIMENT_LEXICON: &[(&str, f64, f64)] = &[
    ("good", 0.7, 0.6),
    ("great", 0.8, 0.75),
    ("nice", 0.6, 1.0),
    ("love", 0.5, 0.6),
    ("happy", 0.8, 1.0),
    ("wonderful", 1.0, 1.0),
    ("amazing", 0.6, 0.9),
    ("awesome", 1.0, 1.0),
    ("best", 1.0, 0.3),
    ("better", 0.5, 0.5),
    ("beautiful", 0.85, 1.0),
    ("fun", 0.3, 0.2),
    ("funny", 0.25, 1.0),
    ("perfect", 1.0, 1.0),
    ("excellent", 1.0, 1.0),
    ("fine", 0.417, 0.5),
    ("cool", 0.35, 0.65),
    ("glad", 0.5, 1.0),
    ("sweet", 0.35, 0.65),
    ("lovely", 0.5, 0.75),
    ("fantastic", 0.4, 0.9),
    ("right", 0.286, 0.536),
    ("interesting", 0.5, 0.5),
    ("bad", -0.7, 0.667),
    ("terrible", -1.0, 1.0),
    ("awful", -1.0, 1.0),
    ("horrible", -1.0, 1.0),
    ("worst", -1.0, 1.0),
    ("worse", -0.4, 0.6),
    ("hate", -0.8, 0.9),
    ("sad", -0.5, 1.0),
    ("angry", -0.5, 1.0),
    ("stupid", -0.8, 1.0),
    ("wrong", -0.5, 0.9),
    ("crazy", -0.6, 0.9),
    ("weird", -0.5, 1.0),
    ("ugly", -0.7, 1.0),
    ("scary", -0.5, 1.0),
    ("sick", -0.714, 0.857),
    ("sorry", -0.5, 1.0),
    ("dead", -0.2, 0.4),
    ("poor", -0.4, 0.6),
    ("boring", -1.0, 1.0),
    ("annoying", -0.8, 0.9),
    ("mad", -0.625, 1.0),
    ("disgusting", -1.0, 1.0),
    ("dumb", -0.375, 0.5),
    ("nervous", -0.2, 0.5),
];
const NEGATIONS: &[&str] = &["not", "never", "no"];
const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.3),
    ("really", 1.3),
    ("so", 1.3),
    ("totally", 1.3),
    ("extremely", 1.5),
];
const NEGATION_FACTOR: f64 = -0.5;

fn set(words: &[&'static str]) -> HashSet<&'static str> {
    words.iter().copied().collect()
}

pub struct LexiconAnalyzer {
    closed_classes: Vec<(&'static str, HashSet<&'static str>)>,
    verbs: HashSet<&'static str>,
    irregular_verbs: HashMap<&'static str, &'static str>,
    irregular_nouns: HashMap<&'static str, &'static str>,
    sentiment: HashMap<&'static str, (f64, f64)>,
    intensifiers: HashMap<&'static str, f64>,
}

impl Default for LexiconAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LexiconAnalyzer {
    pub fn new() -> Self {
        Self {
            // Checked in this order, first match wins.
            closed_classes: vec![
                ("PART", set(PARTICLES)),
                ("PRON", set(PRONOUNS)),
                ("DET", set(DETERMINERS)),
                ("AUX", set(AUXILIARIES)),
                ("CCONJ", set(CONJUNCTIONS)),
                ("SCONJ", set(SUBORDINATORS)),
                ("ADP", set(ADPOSITIONS)),
                ("INTJ", set(INTERJECTIONS)),
                ("ADV", set(ADVERBS)),
            ],
            verbs: set(VERBS),
            irregular_verbs: IRREGULAR_VERBS.iter().copied().collect(),
            irregular_nouns: IRREGULAR_NOUNS.iter().copied().collect(),
            sentiment: SENTIMENT_LEXICON
                .iter()
                .map(|(word, polarity, subjectivity)| (*word, (*polarity, *subjectivity)))
                .collect(),
            intensifiers: INTENSIFIERS.iter().copied().collect(),
        }
    }

    fn tag(&self, word: &str, lower: &str, sentence_start: bool, speaker: bool) -> &'static str {
        if word.chars().all(|c| c.is_numeric()) {
            return "NUM";
        }
        if !word.chars().all(char::is_alphabetic) {
            return "X";
        }
        if speaker {
            return "PROPN";
        }
        for (tag, words) in self.closed_classes.iter() {
            if words.contains(lower) {
                return *tag;
            }
        }
        let capitalized = word.chars().next().is_some_and(char::is_uppercase);
        if capitalized && !sentence_start {
            return "PROPN";
        }
        if self.verbs.contains(lower) || self.irregular_verbs.contains_key(lower) {
            return "VERB";
        }
        if self.sentiment.contains_key(lower) {
            return "ADJ";
        }
        let len = lower.chars().count();
        if len > 4 && lower.ends_with("ly") {
            return "ADV";
        }
        if len > 4 && (lower.ends_with("ing") || lower.ends_with("ed")) {
            return "VERB";
        }
        if len > 4 && ADJECTIVE_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
            return "ADJ";
        }
        "NOUN"
    }

    fn lemmatize(&self, lower: &str, pos: &str) -> String {
        match pos {
            "VERB" | "AUX" => {
                if let Some(base) = self.irregular_verbs.get(lower) {
                    return base.to_string();
                }
                if self.verbs.contains(lower) {
                    return lower.to_string();
                }
                if let Some(stem) = lower.strip_suffix("ing").filter(|s| s.len() > 2) {
                    return restore_verb_stem(stem);
                }
                if let Some(stem) = lower.strip_suffix("ied").filter(|s| s.len() > 1) {
                    return format!("{}y", stem);
                }
                if let Some(stem) = lower.strip_suffix("ed").filter(|s| s.len() > 2) {
                    return restore_verb_stem(stem);
                }
                strip_plural(lower)
            }
            "NOUN" => {
                if let Some(base) = self.irregular_nouns.get(lower) {
                    return base.to_string();
                }
                strip_plural(lower)
            }
            _ => lower.to_string(),
        }
    }

    fn score(&self, words: &[String]) -> (f64, f64) {
        let mut polarities = Vec::new();
        let mut subjectivities = Vec::new();
        let mut negate = false;
        let mut intensity = 1.0;

        for word in words {
            if NEGATIONS.contains(&word.as_str()) || word.ends_with("n't") {
                negate = true;
                continue;
            }
            if let Some(factor) = self.intensifiers.get(word.as_str()) {
                intensity *= factor;
                continue;
            }
            if let Some((polarity, subjectivity)) = self.sentiment.get(word.as_str()) {
                let mut polarity = (polarity * intensity).clamp(-1.0, 1.0);
                if negate {
                    polarity *= NEGATION_FACTOR;
                }
                polarities.push(polarity);
                subjectivities.push((subjectivity * intensity).min(1.0));
            }
            negate = false;
            intensity = 1.0;
        }

        if polarities.is_empty() {
            return (0.0, 0.0);
        }
        let n = polarities.len() as f64;
        (
            polarities.iter().sum::<f64>() / n,
            subjectivities.iter().sum::<f64>() / n,
        )
    }
}

/// Undoes consonant doubling (`runn` -> `run`) and restores a dropped `e` (`lov` -> `love`).
fn restore_verb_stem(stem: &str) -> String {
    let chars: Vec<char> = stem.chars().collect();
    let n = chars.len();
    if n >= 3 && chars[n - 1] == chars[n - 2] && !matches!(chars[n - 1], 'l' | 's' | 'z' | 'e') {
        return chars[..n - 1].iter().collect();
    }
    if stem.ends_with('v') || stem.ends_with("at") || stem.ends_with("iz") || stem.ends_with('c') {
        return format!("{}e", stem);
    }
    stem.to_string()
}

fn strip_plural(word: &str) -> String {
    if word.chars().count() <= 3 {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{}y", stem);
    }
    for suffix in ["sses", "ches", "shes", "xes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if word.ends_with('s') && !(word.ends_with("ss") || word.ends_with("us") || word.ends_with("is")) {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

fn is_sentence_start(text: &str, offset: usize) -> bool {
    let before = text[..offset].trim_end_matches([' ', '\t']);
    match before.chars().last() {
        None => true,
        Some(c) => matches!(c, '\n' | '.' | '!' | '?' | '"' | '(' | '[' | '-'),
    }
}

fn is_line_start(text: &str, offset: usize) -> bool {
    let before = text[..offset].trim_end_matches([' ', '\t']);
    before.is_empty() || before.ends_with('\n')
}

impl Analyzer for LexiconAnalyzer {
    fn name(&self) -> &str {
        "lexicon"
    }

    fn analyze(&self, text: &str) -> Result<AnalyzedText, AnalyzerError> {
        let mut tokens = Vec::new();
        let mut lowered = Vec::new();

        for (offset, word) in text.unicode_word_indices() {
            let lower = word.to_lowercase();
            let sentence_start = is_sentence_start(text, offset);
            let speaker = is_line_start(text, offset)
                && text[offset + word.len()..].starts_with(':')
                && word.chars().next().is_some_and(char::is_uppercase);

            let pos = self.tag(word, &lower, sentence_start, speaker);
            let lemma = self.lemmatize(&lower, pos);
            tokens.push(AnalyzedToken::new(word, lemma, pos));
            lowered.push(lower);
        }

        let (polarity, subjectivity) = self.score(&lowered);
        Ok(AnalyzedText {
            tokens,
            polarity,
            subjectivity,
        })
    }
}
