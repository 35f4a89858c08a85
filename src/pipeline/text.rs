pub(super) fn char_len(text: &str) -> usize {
    text.chars().count()
}

pub(super) fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub(super) fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Number of pieces produced by splitting on runs of `.`, `!` or `?`.
/// A trailing empty piece counts, so "One sentence." yields 2.
pub(super) fn sentence_fragment_count(text: &str) -> usize {
    let mut runs = 0usize;
    let mut in_run = false;
    for character in text.chars() {
        if matches!(character, '.' | '!' | '?') {
            if !in_run {
                runs += 1;
                in_run = true;
            }
        } else {
            in_run = false;
        }
    }
    runs + 1
}

pub(super) fn truncate_preview(text: &str, max_chars: usize) -> String {
    if char_len(text) <= max_chars {
        return text.to_string();
    }

    let mut preview = text.chars().take(max_chars).collect::<String>();
    preview.push_str("...");
    preview
}

/// Splits on blank lines. Lines inside a paragraph are trimmed and joined by
/// single spaces.
pub(super) fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::<String>::new();
    let mut current = Vec::<&str>::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join(" "));
                current.clear();
            }
            continue;
        }
        current.push(trimmed);
    }

    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }

    paragraphs
}

/// Greedy word packing into pieces of at most `max_chars` characters. Words
/// longer than the limit are cut by characters.
pub(super) fn split_at_word_boundaries(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut pieces = Vec::<String>::new();
    let mut piece = String::new();
    let mut piece_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = char_len(word);
        if word_len > max_chars {
            if !piece.is_empty() {
                pieces.push(std::mem::take(&mut piece));
                piece_len = 0;
            }
            let characters = word.chars().collect::<Vec<char>>();
            for chunk in characters.chunks(max_chars) {
                pieces.push(chunk.iter().collect());
            }
            continue;
        }

        let joined_len = if piece.is_empty() {
            word_len
        } else {
            piece_len + 1 + word_len
        };

        if joined_len > max_chars {
            pieces.push(std::mem::take(&mut piece));
            piece.push_str(word);
            piece_len = word_len;
        } else {
            if !piece.is_empty() {
                piece.push(' ');
            }
            piece.push_str(word);
            piece_len = joined_len;
        }
    }

    if !piece.is_empty() {
        pieces.push(piece);
    }

    pieces
}
