use super::*;

/// Why a candidate line was refused before pattern matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    TooShort,
    TooLong,
    PureDigits,
    TableOfContentsEntry,
    PublisherName,
    AuthorName,
    ShortAllCaps,
    PersonName,
}

impl Rejection {
    fn as_str(self) -> &'static str {
        match self {
            Rejection::TooShort => "too_short",
            Rejection::TooLong => "too_long",
            Rejection::PureDigits => "pure_digits",
            Rejection::TableOfContentsEntry => "toc_entry",
            Rejection::PublisherName => "publisher_name",
            Rejection::AuthorName => "author_name",
            Rejection::ShortAllCaps => "short_all_caps",
            Rejection::PersonName => "person_name",
        }
    }
}

#[derive(Debug)]
struct ValidityFilter {
    min_chars: usize,
    max_chars: usize,
    publishers: HashSet<String>,
    authors: Vec<String>,
    landmarks: HashSet<String>,
    enumeration_prefix: Regex,
    toc_line: Regex,
    short_all_caps: Regex,
    person_name: Regex,
}

impl ValidityFilter {
    fn new(config: &ClassifierConfig) -> Result<Self> {
        Ok(Self {
            min_chars: config.min_heading_chars,
            max_chars: config.max_heading_chars,
            publishers: lowered_set(&config.publisher_names),
            authors: config
                .author_names
                .iter()
                .map(|name| name.trim().to_lowercase())
                .filter(|name| !name.is_empty())
                .collect(),
            landmarks: lowered_set(&config.landmark_headings),
            enumeration_prefix: Regex::new(r"^\d+(?:\.\d+)*\.?\s*")
                .context("failed to compile enumeration prefix regex")?,
            toc_line: Regex::new(r"\.{3,}\s*\d+\s*$")
                .context("failed to compile table-of-contents line regex")?,
            short_all_caps: Regex::new(r"^[A-Z\s]{2,}$")
                .context("failed to compile all-caps regex")?,
            person_name: Regex::new(r"^[A-Z][a-z]+\s+[A-Z][a-z]+$")
                .context("failed to compile person name regex")?,
        })
    }

    fn rejection(&self, line: &str) -> Option<Rejection> {
        let length = char_len(line);
        if length < self.min_chars {
            return Some(Rejection::TooShort);
        }
        if length > self.max_chars {
            return Some(Rejection::TooLong);
        }
        if line.chars().all(|character| character.is_ascii_digit()) {
            return Some(Rejection::PureDigits);
        }
        if self.toc_line.is_match(line) {
            return Some(Rejection::TableOfContentsEntry);
        }

        let lowered = line.to_lowercase();
        let unnumbered = self
            .enumeration_prefix
            .replace(&lowered, "")
            .trim()
            .to_string();
        let candidates = [lowered.as_str(), unnumbered.as_str()];

        if candidates
            .iter()
            .any(|candidate| !candidate.is_empty() && self.publishers.contains(*candidate))
        {
            return Some(Rejection::PublisherName);
        }
        if candidates
            .iter()
            .any(|candidate| !candidate.is_empty() && self.is_author(candidate))
        {
            return Some(Rejection::AuthorName);
        }
        if self.short_all_caps.is_match(line) && length < 8 {
            return Some(Rejection::ShortAllCaps);
        }
        if self.person_name.is_match(line) && !self.is_landmark(&lowered) {
            return Some(Rejection::PersonName);
        }

        None
    }

    fn is_author(&self, lowered: &str) -> bool {
        self.authors
            .iter()
            .any(|author| author.contains(lowered) || lowered.contains(author.as_str()))
    }

    fn is_landmark(&self, lowered: &str) -> bool {
        self.landmarks
            .contains(lowered.trim_end_matches(['.', ':', ' ']))
    }
}

#[derive(Debug)]
enum MatchRule {
    Pattern(Regex),
    Landmark(HashSet<String>),
}

/// One named predicate assigning a heading level.
#[derive(Debug)]
pub(super) struct HeadingMatcher {
    pub(super) name: &'static str,
    pub(super) level: HeadingLevel,
    rule: MatchRule,
}

impl HeadingMatcher {
    fn pattern(name: &'static str, level: HeadingLevel, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .with_context(|| format!("failed to compile heading matcher '{name}'"))?;
        Ok(Self {
            name,
            level,
            rule: MatchRule::Pattern(regex),
        })
    }

    fn matches(&self, line: &str) -> bool {
        match &self.rule {
            MatchRule::Pattern(regex) => regex.is_match(line),
            MatchRule::Landmark(landmarks) => {
                let lowered = line.to_lowercase();
                landmarks.contains(lowered.trim_end_matches(['.', ':', ' ']))
            }
        }
    }
}

#[derive(Debug)]
pub(crate) struct HeadingClassifier {
    filter: ValidityFilter,
    numbered: Vec<HeadingMatcher>,
    by_level: Vec<HeadingMatcher>,
    dot_leader: Regex,
}

impl HeadingClassifier {
    pub(crate) fn new(config: &ClassifierConfig) -> Result<Self> {
        use HeadingLevel::{H1, H2, H3};

        // Digits and commas after the number mark list items, not titles.
        let numbered_title = r"[A-Z][A-Za-z\s&'()/:\-]{2,100}$";
        let numbered = vec![
            HeadingMatcher::pattern(
                "numbered_h3",
                H3,
                &format!(r"^\d+\.\d+\.\d+\.?\s+{numbered_title}"),
            )?,
            HeadingMatcher::pattern(
                "numbered_h2",
                H2,
                &format!(r"^\d+\.\d+\.?\s+{numbered_title}"),
            )?,
            HeadingMatcher::pattern("numbered_h1", H1, &format!(r"^\d+\.\s+{numbered_title}"))?,
        ];

        let by_level = vec![
            HeadingMatcher {
                name: "landmark",
                level: H1,
                rule: MatchRule::Landmark(lowered_set(&config.landmark_headings)),
            },
            HeadingMatcher::pattern("enumerated_caps", H1, r"^(?:\d+\.)?\s*[A-Z][A-Z\s]{3,50}$")?,
            HeadingMatcher::pattern("enumerated_title", H1, r"^(?:\d+\.)?\s*[A-Z][a-z\s]{4,100}$")?,
            HeadingMatcher::pattern(
                "chapter_form",
                H1,
                r"^(?:Chapter|Section|Part)\s+\d+[:\s]+[A-Z][A-Za-z\s]{4,100}$",
            )?,
            HeadingMatcher::pattern("capitalized_phrase", H1, r"^[A-Z][A-Za-z\s]{4,100}$")?,
            HeadingMatcher::pattern("subsection_caps", H2, r"^\d+\.\d+\.?\s*[A-Z][A-Z\s]{3,50}$")?,
            HeadingMatcher::pattern(
                "subsection_title",
                H2,
                r"^\d+\.\d+\.?\s*[A-Z][a-z\s]{4,100}$",
            )?,
            HeadingMatcher::pattern(
                "subsection_form",
                H2,
                r"^(?:Subsection|Subchapter)\s+\d+[:\s]+[A-Z][A-Za-z\s]{4,100}$",
            )?,
            HeadingMatcher::pattern(
                "subsubsection_caps",
                H3,
                r"^\d+\.\d+\.\d+\.?\s*[A-Z][A-Z\s]{3,50}$",
            )?,
            HeadingMatcher::pattern(
                "subsubsection_title",
                H3,
                r"^\d+\.\d+\.\d+\.?\s*[A-Z][a-z\s]{4,100}$",
            )?,
        ];

        Ok(Self {
            filter: ValidityFilter::new(config)?,
            numbered,
            by_level,
            dot_leader: Regex::new(r"\s*\.{3,}$").context("failed to compile dot leader regex")?,
        })
    }

    pub(super) fn normalize_heading_text(&self, line: &str) -> String {
        let collapsed = collapse_whitespace(line);
        self.dot_leader.replace(&collapsed, "").trim().to_string()
    }

    /// Matcher for an already normalized line, or `None` when the line is not
    /// a heading. The numbered-section matchers win over the generic ones.
    pub(super) fn matching_rule(&self, line: &str) -> Option<&HeadingMatcher> {
        if let Some(reason) = self.filter.rejection(line) {
            trace!(line = %line, reason = reason.as_str(), "rejected heading candidate");
            return None;
        }

        let starts_with_digit = line
            .chars()
            .next()
            .map(|character| character.is_ascii_digit())
            .unwrap_or(false);
        if starts_with_digit {
            if let Some(matcher) = self.numbered.iter().find(|matcher| matcher.matches(line)) {
                return Some(matcher);
            }
        }

        self.by_level.iter().find(|matcher| matcher.matches(line))
    }

    pub(super) fn classify_page(&self, page_text: &str, page_number: usize) -> Vec<Heading> {
        let mut headings = Vec::new();

        for raw_line in page_text.lines() {
            if raw_line.trim().is_empty() {
                continue;
            }

            let text = self.normalize_heading_text(raw_line);
            if char_len(&text) < 3 {
                continue;
            }

            if let Some(matcher) = self.matching_rule(&text) {
                trace!(page = page_number, rule = matcher.name, level = %matcher.level, "heading");
                headings.push(Heading {
                    level: matcher.level,
                    text,
                    page: page_number,
                });
            }
        }

        headings
    }

    pub(super) fn extract_outline(&self, pages: &[String]) -> Vec<Heading> {
        let headings = pages
            .iter()
            .enumerate()
            .flat_map(|(index, page)| self.classify_page(page, index + 1))
            .collect::<Vec<Heading>>();
        dedupe_headings(headings)
    }

    /// Supplied outlines skip classification but still go through text
    /// normalization, the 1-based page check and deduplication.
    pub(super) fn prepare_supplied_outline(&self, outline: &[Heading]) -> Vec<Heading> {
        let headings = outline
            .iter()
            .filter_map(|heading| {
                let text = self.normalize_heading_text(&heading.text);
                if char_len(&text) < 3 || heading.page == 0 {
                    return None;
                }
                Some(Heading {
                    level: heading.level,
                    text,
                    page: heading.page,
                })
            })
            .collect::<Vec<Heading>>();
        dedupe_headings(headings)
    }

    pub(crate) fn outline_for(&self, document: &SourceDocument) -> Vec<Heading> {
        match &document.outline {
            Some(outline) => self.prepare_supplied_outline(outline),
            None => self.extract_outline(&document.pages),
        }
    }
}

/// Keeps the first occurrence of each heading text, compared case-insensitively.
fn dedupe_headings(headings: Vec<Heading>) -> Vec<Heading> {
    let mut seen = HashSet::<String>::new();
    headings
        .into_iter()
        .filter(|heading| seen.insert(heading.text.to_lowercase()))
        .collect()
}

fn lowered_set(values: &[String]) -> HashSet<String> {
    values
        .iter()
        .map(|value| value.trim().to_lowercase())
        .filter(|value| !value.is_empty())
        .collect()
}
