use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

const BUILTIN_BANK: &str = include_str!("../data/questions.toml");

/// Question body: free-form with reference bullets, or multiple choice
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionKind {
    Open {
        answers: Vec<String>,
    },
    Mcq {
        options: Vec<String>,
        /// Zero-based index into `options`
        answer: usize,
        explain: Option<String>,
    },
}

/// A single question in the bank
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: String,
    pub topic: String,
    pub prompt: String,
    pub kind: QuestionKind,
}

impl Question {
    pub fn is_open(&self) -> bool {
        matches!(self.kind, QuestionKind::Open { .. })
    }

    /// First reference bullet of an open question
    pub fn first_answer(&self) -> Option<&str> {
        match &self.kind {
            QuestionKind::Open { answers } => answers.first().map(String::as_str),
            QuestionKind::Mcq { .. } => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawBank {
    topics: Vec<String>,
    #[serde(default)]
    questions: Vec<RawQuestion>,
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    id: String,
    topic: String,
    q: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    a: Vec<String>,
    #[serde(default)]
    options: Vec<String>,
    answer: Option<usize>,
    explain: Option<String>,
}

/// Ordered questions plus the fixed set of topics they are drawn from
#[derive(Debug, Clone)]
pub struct QuestionBank {
    pub topics: Vec<String>,
    pub questions: Vec<Question>,
}

impl QuestionBank {
    /// The bank compiled into the binary
    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_BANK, "built-in bank")
    }

    /// Load a bank from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read question bank: {}", path.display()))?;

        Self::parse(&content, &path.display().to_string())
    }

    /// Parse and validate a TOML bank; `source` names it in error messages
    pub fn parse(content: &str, source: &str) -> Result<Self> {
        let raw: RawBank =
            toml::from_str(content).with_context(|| format!("Invalid question bank {}", source))?;

        let topics: HashSet<&str> = raw.topics.iter().map(String::as_str).collect();
        let mut seen_ids = HashSet::new();
        let mut questions = Vec::with_capacity(raw.questions.len());

        for (idx, q) in raw.questions.into_iter().enumerate() {
            if !seen_ids.insert(q.id.clone()) {
                bail!("Duplicate question id '{}' in {}", q.id, source);
            }
            if !topics.contains(q.topic.as_str()) {
                bail!(
                    "Question '{}' (#{}) in {} has unknown topic '{}'",
                    q.id,
                    idx + 1,
                    source,
                    q.topic
                );
            }

            let kind = match q.kind.to_lowercase().as_str() {
                "open" => QuestionKind::Open { answers: q.a },
                "mcq" => {
                    if q.options.len() < 2 {
                        bail!("Question '{}' in {} needs at least two options", q.id, source);
                    }
                    let answer = q.answer.with_context(|| {
                        format!("Question '{}' in {} is missing `answer`", q.id, source)
                    })?;
                    if answer >= q.options.len() {
                        bail!(
                            "Question '{}' in {}: answer {} is out of range for {} options",
                            q.id,
                            source,
                            answer,
                            q.options.len()
                        );
                    }
                    QuestionKind::Mcq {
                        options: q.options,
                        answer,
                        explain: q.explain,
                    }
                }
                other => bail!(
                    "Question '{}' in {} has unknown type '{}'. Use 'open' or 'mcq'.",
                    q.id,
                    source,
                    other
                ),
            };

            questions.push(Question {
                id: q.id,
                topic: q.topic,
                prompt: q.q,
                kind,
            });
        }

        Ok(QuestionBank {
            topics: raw.topics,
            questions,
        })
    }

    /// Load the bank at `path`, or the built-in one
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::builtin(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_builtin_bank() {
        let bank = QuestionBank::builtin().unwrap();
        assert_eq!(bank.topics.len(), 8);
        assert!(bank.questions.len() >= 8);

        let hashmap = bank
            .questions
            .iter()
            .find(|q| q.id == "coll-hashmap")
            .unwrap();
        assert!(matches!(hashmap.kind, QuestionKind::Mcq { answer: 2, .. }));

        let strings = bank
            .questions
            .iter()
            .find(|q| q.id == "core-strings-immut")
            .unwrap();
        assert!(strings.is_open());
        assert!(strings.first_answer().unwrap().starts_with("Security"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "topics = [\"A\"]").unwrap();
        writeln!(file, "[[questions]]").unwrap();
        writeln!(file, "id = \"a1\"").unwrap();
        writeln!(file, "topic = \"A\"").unwrap();
        writeln!(file, "type = \"open\"").unwrap();
        writeln!(file, "q = \"Why?\"").unwrap();

        let bank = QuestionBank::load(file.path()).unwrap();
        assert_eq!(bank.questions.len(), 1);
        assert_eq!(bank.questions[0].first_answer(), None);
    }

    #[test]
    fn test_rejects_duplicate_id() {
        let text = r#"
            topics = ["A"]
            [[questions]]
            id = "x"
            topic = "A"
            type = "open"
            q = "one"
            [[questions]]
            id = "x"
            topic = "A"
            type = "open"
            q = "two"
        "#;
        let err = QuestionBank::parse(text, "test").unwrap_err();
        assert!(err.to_string().contains("Duplicate question id 'x'"));
    }

    #[test]
    fn test_rejects_unknown_topic() {
        let text = r#"
            topics = ["A"]
            [[questions]]
            id = "x"
            topic = "B"
            type = "open"
            q = "one"
        "#;
        assert!(QuestionBank::parse(text, "test").is_err());
    }

    #[test]
    fn test_rejects_answer_out_of_range() {
        let text = r#"
            topics = ["A"]
            [[questions]]
            id = "x"
            topic = "A"
            type = "mcq"
            q = "pick"
            options = ["yes", "no"]
            answer = 2
        "#;
        let err = QuestionBank::parse(text, "test").unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_rejects_unknown_type() {
        let text = r#"
            topics = ["A"]
            [[questions]]
            id = "x"
            topic = "A"
            type = "essay"
            q = "write"
        "#;
        assert!(QuestionBank::parse(text, "test").is_err());
    }
}
