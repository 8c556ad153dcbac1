//! In-process recognizer for the three labels the parser asks for.
//!
//! - `email`: address pattern.
//! - `skill`: whole-term lookup against a skills lexicon. Terms of two
//!   characters or fewer, and terms that double as ordinary English words,
//!   only match with their exact casing.
//! - `person`: heading heuristics over the first lines of the document.
//!
//! Other labels yield no entities.

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use tracing::debug;

use super::{EntityRecognizer, NerError, RecognizedEntity};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid email regex")
});

/// Lines considered when looking for the candidate's name.
const NAME_SCAN_LINES: usize = 8;

const EMAIL_SCORE: f32 = 0.95;
const SKILL_SCORE: f32 = 0.85;
const PERSON_SCORE: f32 = 0.6;

/// Section headings and boilerplate that look like names but are not.
const HEADING_WORDS: &[&str] = &[
    "resume",
    "curriculum",
    "vitae",
    "cv",
    "profile",
    "summary",
    "objective",
    "skills",
    "experience",
    "education",
    "projects",
    "contact",
    "references",
    "certifications",
    "languages",
    "work",
    "professional",
    "technical",
];

/// Skill names that are also everyday words ("go", "rest", "excel").
const COMMON_WORD_TERMS: &[&str] = &[
    "go", "rust", "swift", "ruby", "rest", "react", "rails", "flask", "spark", "excel",
    "spring", "express", "ember", "chef", "puppet", "salt", "access", "word",
];

/// Terms at or below this length are matched case-sensitively.
const SHORT_TERM_CHARS: usize = 2;

/// Built-in skills lexicon, used unless a lexicon file is supplied.
pub const DEFAULT_SKILLS: &[&str] = &[
    "Rust", "Python", "Java", "JavaScript", "TypeScript", "Go", "C", "C++", "C#", "Ruby",
    "PHP", "Swift", "Kotlin", "Scala", "Haskell", "Elixir", "R", "MATLAB", "SQL", "NoSQL",
    "PostgreSQL", "MySQL", "SQLite", "MongoDB", "Redis", "Cassandra", "Elasticsearch",
    "Kafka", "RabbitMQ", "GraphQL", "REST", "gRPC", "HTML", "CSS", "React", "Angular",
    "Vue", "Node.js", "Django", "Flask", "FastAPI", "Spring Boot", ".NET", "Rails",
    "Docker", "Kubernetes", "Terraform", "Ansible", "AWS", "Azure", "GCP", "Linux", "Git",
    "CI/CD", "Jenkins", "Machine Learning", "Deep Learning", "NLP", "TensorFlow",
    "PyTorch", "Pandas", "NumPy", "Scikit-learn", "Spark", "Hadoop", "Airflow", "Tableau",
    "Excel", "Agile", "Scrum", "Microservices", "Distributed Systems", "WebAssembly",
];

struct LexiconTerm {
    canonical: String,
    pattern: Regex,
}

/// Dependency-free recognizer used when no inference endpoint is configured.
pub struct LexiconRecognizer {
    skills: Vec<LexiconTerm>,
}

impl LexiconRecognizer {
    /// Recognizer over the built-in skills lexicon.
    pub fn new() -> Result<Self, NerError> {
        Self::with_skills(DEFAULT_SKILLS.iter().copied())
    }

    /// Recognizer over a caller-supplied skills lexicon.
    pub fn with_skills<I, S>(skills: I) -> Result<Self, NerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut terms = Vec::new();

        for skill in skills {
            let skill = skill.as_ref().trim();
            if skill.is_empty() || !seen.insert(skill.to_lowercase()) {
                continue;
            }
            // Left boundary is matched explicitly; the right boundary is checked
            // after matching so that terms ending in `+` or `#` still work.
            let pattern = RegexBuilder::new(&format!(r"(?:^|[^\w+#.])({})", regex::escape(skill)))
                .case_insensitive(!needs_exact_case(skill))
                .build()
                .map_err(|e| NerError::Load(format!("invalid lexicon term '{skill}': {e}")))?;
            terms.push(LexiconTerm {
                canonical: skill.to_string(),
                pattern,
            });
        }

        if terms.is_empty() {
            return Err(NerError::Load("skills lexicon is empty".to_string()));
        }

        Ok(Self { skills: terms })
    }

    /// Loads a newline-delimited lexicon; blank lines and `#` comments are skipped.
    pub fn from_file(path: &Path) -> Result<Self, NerError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            NerError::Load(format!("cannot read skills lexicon {}: {e}", path.display()))
        })?;
        let recognizer = Self::with_skills(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.starts_with('#')),
        )?;
        debug!(
            "Loaded {} skills from {}",
            recognizer.skills.len(),
            path.display()
        );
        Ok(recognizer)
    }

    fn emails(&self, text: &str) -> Vec<(usize, RecognizedEntity)> {
        EMAIL_RE
            .find_iter(text)
            .map(|m| (m.start(), entity(m.as_str(), "email", EMAIL_SCORE)))
            .collect()
    }

    fn skills(&self, text: &str) -> Vec<(usize, RecognizedEntity)> {
        let mut found = Vec::new();
        for term in &self.skills {
            let first_hit = term.pattern.captures_iter(text).find_map(|caps| {
                let m = caps.get(1)?;
                let next = text[m.end()..].chars().next();
                let bounded = next.map_or(true, |c| !(c.is_alphanumeric() || c == '_' || c == '+' || c == '#'));
                bounded.then_some(m.start())
            });
            if let Some(position) = first_hit {
                found.push((position, entity(&term.canonical, "skill", SKILL_SCORE)));
            }
        }
        found
    }

    fn persons(&self, text: &str) -> Vec<(usize, RecognizedEntity)> {
        let mut offset = 0;
        let mut scanned = 0;

        for raw_line in text.split_inclusive('\n') {
            let line_start = offset;
            offset += raw_line.len();

            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }
            scanned += 1;
            if scanned > NAME_SCAN_LINES {
                break;
            }

            let candidate = match split_label(line, "name") {
                Some(rest) => rest,
                None => line,
            };
            if looks_like_name(candidate) {
                let position = line_start + raw_line.find(candidate).unwrap_or(0);
                return vec![(position, entity(candidate, "person", PERSON_SCORE))];
            }
        }
        Vec::new()
    }
}

#[async_trait]
impl EntityRecognizer for LexiconRecognizer {
    async fn predict_entities(
        &self,
        text: &str,
        labels: &[String],
    ) -> Result<Vec<RecognizedEntity>, NerError> {
        let mut found = Vec::new();
        for label in labels {
            match label.to_ascii_lowercase().as_str() {
                "email" => found.extend(self.emails(text)),
                "skill" | "skills" => found.extend(self.skills(text)),
                "person" | "name" => found.extend(self.persons(text)),
                other => debug!("Lexicon recognizer has no rules for label '{other}'"),
            }
        }
        found.sort_by_key(|(position, _)| *position);
        Ok(found.into_iter().map(|(_, e)| e).collect())
    }
}

fn entity(text: &str, label: &str, score: f32) -> RecognizedEntity {
    RecognizedEntity {
        text: text.to_string(),
        label: label.to_string(),
        score,
    }
}

fn needs_exact_case(term: &str) -> bool {
    term.chars().count() <= SHORT_TERM_CHARS
        || COMMON_WORD_TERMS.contains(&term.to_lowercase().as_str())
}

/// `"Name: Jane Doe"` -> `Some("Jane Doe")` for label `name`.
fn split_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let (head, rest) = line.split_once(':')?;
    head.trim().eq_ignore_ascii_case(label).then(|| rest.trim())
}

fn looks_like_name(line: &str) -> bool {
    if line.contains('@') || line.contains(':') || line.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }

    let words: Vec<&str> = line.split_whitespace().collect();
    if !(2..=4).contains(&words.len()) {
        return false;
    }

    words.iter().all(|word| {
        let lower = word.to_lowercase();
        let mut chars = word.chars();
        let starts_upper = chars.next().is_some_and(char::is_uppercase);
        starts_upper
            && word
                .chars()
                .all(|c| c.is_alphabetic() || matches!(c, '-' | '\'' | '.'))
            && !HEADING_WORDS.contains(&lower.trim_end_matches('.'))
    })
}
