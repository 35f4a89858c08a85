use super::*;

const KEYWORD_DENSITY_WEIGHT: f64 = 5.0;
const TEXT_QUALITY_WEIGHT: f64 = 2.0;
const HEADING_KEYWORD_BONUS: f64 = 0.5;
const MAX_HEADING_BONUS: f64 = 2.0;
const MAX_SCORE: f64 = 10.0;

#[derive(Debug, Clone)]
pub(super) struct RelevanceScorer {
    keywords: KeywordSet,
    ranking: RankingConfig,
}

impl RelevanceScorer {
    pub(super) fn new(keywords: KeywordSet, ranking: RankingConfig) -> Self {
        Self { keywords, ranking }
    }

    pub(super) fn keywords(&self) -> &KeywordSet {
        &self.keywords
    }

    /// Importance in `[0, 10]`: keyword density, text quality and heading
    /// bonus, hard-capped at 10.
    pub(super) fn score(&self, text: &str, heading: Option<&str>) -> f64 {
        if text.trim().is_empty() {
            return 0.0;
        }

        let heading = heading.unwrap_or("");
        let raw = self.keyword_density(text, heading) * KEYWORD_DENSITY_WEIGHT
            + text_quality(text) * TEXT_QUALITY_WEIGHT
            + self.heading_bonus(heading);

        raw.clamp(0.0, MAX_SCORE)
    }

    /// Presence in the text counts 1 and presence in the heading counts 2,
    /// per keyword, divided by the number of keywords.
    fn keyword_density(&self, text: &str, heading: &str) -> f64 {
        if self.keywords.is_empty() {
            return 0.0;
        }

        let in_text = self.keywords.count_present(&text.to_lowercase());
        let in_heading = if heading.is_empty() {
            0
        } else {
            self.keywords.count_present(&heading.to_lowercase())
        };

        (in_text + 2 * in_heading) as f64 / self.keywords.len() as f64
    }

    fn heading_bonus(&self, heading: &str) -> f64 {
        if heading.trim().is_empty() {
            return 0.0;
        }

        let matches = self.keywords.count_present(&heading.to_lowercase());
        (matches as f64 * HEADING_KEYWORD_BONUS).min(MAX_HEADING_BONUS)
    }

    pub(super) fn rank_sections(&self, document: &str, sections: &[Section]) -> Vec<RankedSection> {
        let mut ranked = sections
            .iter()
            .filter(|section| char_len(section.content.trim()) >= self.ranking.min_section_chars)
            .filter_map(|section| {
                let score = self.score(&section.content, Some(&section.heading));
                if score < self.ranking.min_score {
                    return None;
                }

                Some(RankedSection {
                    document: document.to_string(),
                    page_number: section.page,
                    section_title: section.heading.clone(),
                    importance_rank: score,
                    level: section.level,
                    content: section.content.clone(),
                })
            })
            .collect::<Vec<RankedSection>>();

        sort_sections(&mut ranked);
        ranked
    }

    fn segment(&self, text: &str) -> Vec<String> {
        segment_text(
            text,
            self.ranking.subsection_max_chars,
            self.ranking.min_paragraph_chars,
            self.ranking.min_fragment_chars,
        )
    }

    /// Fragments are drawn only from the leading ranked sections and scored
    /// on their own text, without the parent heading. Headings sharing a page
    /// share its text, so repeats on the same page are dropped before the cap.
    pub(super) fn analyze_sub_sections(&self, ranked: &[RankedSection]) -> Vec<SubSectionFragment> {
        let mut fragments = Vec::<SubSectionFragment>::new();

        for section in ranked.iter().take(self.ranking.sections_for_subsections) {
            for fragment in self.segment(&section.content) {
                let score = self.score(&fragment, None);
                if score < self.ranking.min_score {
                    continue;
                }

                fragments.push(SubSectionFragment {
                    document: section.document.clone(),
                    page_number: section.page_number,
                    refined_text: truncate_preview(&fragment, self.ranking.preview_chars),
                    importance_rank: score,
                    parent_section: section.section_title.clone(),
                });
            }
        }

        sort_fragments(&mut fragments);
        let mut seen = HashSet::<(usize, String)>::new();
        fragments.retain(|fragment| {
            seen.insert((fragment.page_number, fragment.refined_text.clone()))
        });
        fragments.truncate(self.ranking.subsections_per_document);
        fragments
    }
}

/// 0.1 below ten words, 0.3 when the average sentence is shorter than five
/// or longer than fifty words, otherwise 1.0.
pub(super) fn text_quality(text: &str) -> f64 {
    let words = word_count(text);
    if words == 0 {
        return 0.0;
    }
    if words < 10 {
        return 0.1;
    }

    let average_sentence = words as f64 / sentence_fragment_count(text) as f64;
    if !(5.0..=50.0).contains(&average_sentence) {
        return 0.3;
    }

    1.0
}

/// Single-pass greedy packing of paragraphs into fragments of at most
/// `max_chars` characters (joined by a blank line).
pub(super) fn segment_text(
    text: &str,
    max_chars: usize,
    min_paragraph_chars: usize,
    min_fragment_chars: usize,
) -> Vec<String> {
    let mut fragments = Vec::<String>::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    let flush = |fragment: String, length: usize, fragments: &mut Vec<String>| {
        if length >= min_fragment_chars && !fragment.is_empty() {
            fragments.push(fragment);
        }
    };

    for paragraph in split_paragraphs(text) {
        let paragraph_len = char_len(&paragraph);
        if paragraph_len < min_paragraph_chars {
            continue;
        }

        let pieces = if paragraph_len > max_chars {
            split_at_word_boundaries(&paragraph, max_chars)
        } else {
            vec![paragraph]
        };

        for piece in pieces {
            let piece_len = char_len(&piece);
            let joined_len = if current.is_empty() {
                piece_len
            } else {
                current_len + 2 + piece_len
            };

            if joined_len <= max_chars {
                if !current.is_empty() {
                    current.push_str("\n\n");
                }
                current.push_str(&piece);
                current_len = joined_len;
                continue;
            }

            flush(std::mem::take(&mut current), current_len, &mut fragments);
            current = piece;
            current_len = piece_len;
        }
    }

    flush(current, current_len, &mut fragments);
    fragments
}

/// Descending by score; `sort_by` is stable so ties keep encounter order.
pub(super) fn sort_sections(sections: &mut [RankedSection]) {
    sections.sort_by(|left, right| right.importance_rank.total_cmp(&left.importance_rank));
}

pub(super) fn sort_fragments(fragments: &mut [SubSectionFragment]) {
    fragments.sort_by(|left, right| right.importance_rank.total_cmp(&left.importance_rank));
}
