//! Line formats of the statistics files.
//!
//! ```text
//! word_frequency/*.txt   lemma_POS: count        (descending count)
//! word_order/*.txt       lemma_POS               (no trailing newline)
//! sentiment.txt          <season>x<episode>: polarity subjectivity
//! ```

use crate::corpus::{FrequencyTable, OrderSequence, Sentiment, SentimentRecord, Token};
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineError {
    /// 1-based.
    pub line: usize,
    pub reason: String,
}

impl LineError {
    fn new<S: Into<String>>(line: usize, reason: S) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

/// Non-blank lines with their 1-based numbers.
fn content_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| (index + 1, line))
}

pub fn encode_frequency(table: &FrequencyTable) -> String {
    let mut out = String::new();
    for (token, count) in table.sorted_entries() {
        let _ = writeln!(out, "{}: {}", token, count);
    }
    out
}

pub fn decode_frequency(content: &str) -> Result<FrequencyTable, LineError> {
    let mut table = FrequencyTable::new();
    for (number, line) in content_lines(content) {
        let (key, count) = line
            .rsplit_once(": ")
            .ok_or_else(|| LineError::new(number, "missing \": \" separator"))?;
        let token = Token::parse(key).map_err(|e| LineError::new(number, e.to_string()))?;
        let count: u64 = count
            .trim()
            .parse()
            .map_err(|_| LineError::new(number, format!("invalid count {:?}", count)))?;
        if table.contains(&token) {
            return Err(LineError::new(number, format!("duplicate token {}", token)));
        }
        table.add(token, count);
    }
    Ok(table)
}

pub fn encode_order(sequence: &OrderSequence) -> String {
    sequence
        .iter()
        .map(|token| token.key())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn decode_order(content: &str) -> Result<OrderSequence, LineError> {
    let mut sequence = OrderSequence::new();
    for (number, line) in content_lines(content) {
        let token = Token::parse(line).map_err(|e| LineError::new(number, e.to_string()))?;
        if !sequence.push(token) {
            return Err(LineError::new(number, format!("duplicate token {}", line)));
        }
    }
    Ok(sequence)
}

pub fn encode_sentiment(record: &SentimentRecord) -> String {
    let mut out = String::new();
    for (code, sentiment) in record.iter() {
        let _ = writeln!(
            out,
            "{}: {:?} {:?}",
            code, sentiment.polarity, sentiment.subjectivity
        );
    }
    out
}

pub fn decode_sentiment(content: &str) -> Result<SentimentRecord, LineError> {
    let mut record = SentimentRecord::new();
    for (number, line) in content_lines(content) {
        let (code, values) = line
            .rsplit_once(": ")
            .ok_or_else(|| LineError::new(number, "missing \": \" separator"))?;
        if code.is_empty() {
            return Err(LineError::new(number, "empty episode code"));
        }
        let mut values = values.split_whitespace();
        let (Some(polarity), Some(subjectivity), None) =
            (values.next(), values.next(), values.next())
        else {
            return Err(LineError::new(number, "expected polarity and subjectivity"));
        };
        let polarity: f64 = polarity
            .parse()
            .map_err(|_| LineError::new(number, format!("invalid polarity {:?}", polarity)))?;
        let subjectivity: f64 = subjectivity.parse().map_err(|_| {
            LineError::new(number, format!("invalid subjectivity {:?}", subjectivity))
        })?;
        record.insert_code(code.to_string(), Sentiment::rounded(polarity, subjectivity));
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(key: &str) -> Token {
        Token::parse(key).unwrap()
    }

    #[test]
    fn frequency_lines() {
        let table: FrequencyTable = vec![(t("dog_NOUN"), 1), (t("run_VERB"), 2)]
            .into_iter()
            .collect();
        let encoded = encode_frequency(&table);
        assert_eq!(encoded, "run_VERB: 2\ndog_NOUN: 1\n");

        let decoded = decode_frequency(&encoded).unwrap();
        assert_eq!(decoded.get(&t("run_VERB")), 2);
        assert_eq!(decoded.get(&t("dog_NOUN")), 1);
        assert_eq!(decoded.len(), 2);
    }

    #[test]
    fn frequency_errors_carry_line_number() {
        let err = decode_frequency("run_VERB: 2\ndog_NOUN 1\n").unwrap_err();
        assert_eq!(err.line, 2);
        let err = decode_frequency("run_VERB: two\n").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(decode_frequency("run: 2\n").is_err());
    }

    #[test]
    fn order_has_no_trailing_newline() {
        let sequence = OrderSequence::from_tokens(&[t("run_VERB"), t("dog_NOUN")]);
        let encoded = encode_order(&sequence);
        assert_eq!(encoded, "run_VERB\ndog_NOUN");
        assert_eq!(decode_order(&encoded).unwrap(), sequence);
        assert!(decode_order("").unwrap().is_empty());
    }

    #[test]
    fn order_rejects_duplicates() {
        let err = decode_order("run_VERB\ndog_NOUN\nrun_VERB").unwrap_err();
        assert_eq!(err.line, 3);
    }

    #[test]
    fn sentiment_lines() {
        let mut record = SentimentRecord::new();
        record.insert_code("1x01".to_string(), Sentiment::rounded(0.125456, 0.5));
        record.insert_code("1x02".to_string(), Sentiment::rounded(-0.25, 1.0));
        let encoded = encode_sentiment(&record);
        assert_eq!(encoded, "1x01: 0.125 0.5\n1x02: -0.25 1.0\n");
        assert_eq!(decode_sentiment(&encoded).unwrap(), record);
    }

    #[test]
    fn sentiment_rejects_missing_values() {
        let err = decode_sentiment("1x01: 0.1\n").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(decode_sentiment("1x01: 0.1 0.2 0.3\n").is_err());
        assert!(decode_sentiment("1x01: a b\n").is_err());
    }
}
