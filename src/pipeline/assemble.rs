use super::*;

/// A heading paired with the cleaned text of the page it appears on.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Section {
    pub(super) level: HeadingLevel,
    pub(super) heading: String,
    pub(super) page: usize,
    pub(super) content: String,
}

#[derive(Debug, Default)]
pub(super) struct Assembly {
    pub(super) sections: Vec<Section>,
    pub(super) out_of_range: Vec<Heading>,
    pub(super) rejected: usize,
}

pub(super) fn assemble_sections(
    pages: &[String],
    headings: &[Heading],
    config: &AssemblyConfig,
) -> Assembly {
    let cleaned_pages = pages
        .iter()
        .map(|page| {
            let cleaned = clean_text(page);
            let accepted = passes_quality_gate(&cleaned, config);
            (cleaned, accepted)
        })
        .collect::<Vec<(String, bool)>>();

    let mut assembly = Assembly::default();

    for heading in headings {
        let Some((content, accepted)) = heading
            .page
            .checked_sub(1)
            .and_then(|index| cleaned_pages.get(index))
        else {
            assembly.out_of_range.push(heading.clone());
            continue;
        };

        if !*accepted {
            assembly.rejected += 1;
            continue;
        }

        assembly.sections.push(Section {
            level: heading.level,
            heading: heading.text.clone(),
            page: heading.page,
            content: content.clone(),
        });
    }

    assembly
}

/// Drops characters outside the allow-list and collapses whitespace. A
/// whitespace run holding two or more newlines becomes a paragraph break,
/// any other run a single space.
pub(super) fn clean_text(raw: &str) -> String {
    let mut cleaned = String::with_capacity(raw.len());
    let mut pending_newlines: Option<usize> = None;

    for character in raw.chars() {
        if character.is_whitespace() {
            let newlines = pending_newlines.get_or_insert(0);
            if character == '\n' {
                *newlines += 1;
            }
            continue;
        }

        if !is_allowed_char(character) {
            continue;
        }

        if let Some(newlines) = pending_newlines.take() {
            if !cleaned.is_empty() {
                cleaned.push_str(if newlines >= 2 { "\n\n" } else { " " });
            }
        }
        cleaned.push(character);
    }

    cleaned
}

fn is_allowed_char(character: char) -> bool {
    character.is_alphanumeric()
        || character == '_'
        || matches!(
            character,
            '.' | ',' | ';' | ':' | '!' | '?' | '-' | '(' | ')' | '[' | ']' | '{' | '}'
        )
}

pub(super) fn passes_quality_gate(cleaned: &str, config: &AssemblyConfig) -> bool {
    char_len(cleaned) >= config.min_chars
        && word_count(cleaned) >= config.min_words
        && sentence_fragment_count(cleaned) >= config.min_sentences
}
