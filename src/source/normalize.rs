use super::*;

/// A first or last line must recur on this many pages to be stripped.
const MIN_EDGE_REPEATS: usize = 3;
const MAX_EDGE_LINE_CHARS: usize = 120;

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct NormalizationStats {
    pub(crate) header_lines_removed: usize,
    pub(crate) footer_lines_removed: usize,
    pub(crate) dehyphenation_merges: usize,
}

#[derive(Debug, Clone, Copy)]
enum Edge {
    Top,
    Bottom,
}

/// Drops running headers and footers, then rejoins words broken across lines
/// by a trailing hyphen.
pub(crate) fn strip_running_lines(pages: &mut [String]) -> NormalizationStats {
    let mut tallies = [HashMap::<String, usize>::new(), HashMap::new()];
    for page in pages.iter() {
        for (tally, key) in tallies.iter_mut().zip(edge_keys(page)) {
            if let Some(key) = key {
                *tally.entry(key).or_default() += 1;
            }
        }
    }
    let [headers, footers] = tallies.map(|tally| {
        tally
            .into_iter()
            .filter(|(_, count)| *count >= MIN_EDGE_REPEATS)
            .map(|(key, _)| key)
            .collect::<HashSet<String>>()
    });

    let mut stats = NormalizationStats::default();
    for page in pages.iter_mut() {
        let mut lines = page.lines().collect::<Vec<&str>>();
        if remove_edge(&mut lines, Edge::Top, &headers) {
            stats.header_lines_removed += 1;
        }
        if remove_edge(&mut lines, Edge::Bottom, &footers) {
            stats.footer_lines_removed += 1;
        }

        let (text, merges) = join_hyphenated(lines);
        stats.dehyphenation_merges += merges;
        *page = text;
    }

    stats
}

fn edge_keys(page: &str) -> [Option<String>; 2] {
    let mut nonempty = page.lines().filter(|line| !line.trim().is_empty());
    let first = nonempty.next();
    let last = nonempty.next_back().or(first);
    [first.and_then(edge_key), last.and_then(edge_key)]
}

/// Lowercased, with digit tokens masked so "Page 3" and "Page 4" share a key.
fn edge_key(line: &str) -> Option<String> {
    let key = line
        .split_whitespace()
        .map(|token| {
            if token.bytes().all(|byte| byte.is_ascii_digit()) {
                "#"
            } else {
                token
            }
        })
        .collect::<Vec<&str>>()
        .join(" ")
        .to_lowercase();
    (!key.is_empty() && key.chars().count() <= MAX_EDGE_LINE_CHARS).then_some(key)
}

fn remove_edge(lines: &mut Vec<&str>, edge: Edge, running: &HashSet<String>) -> bool {
    let mut nonempty = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());
    let candidate = match edge {
        Edge::Top => nonempty.next(),
        Edge::Bottom => nonempty.next_back(),
    };
    let index = candidate.and_then(|(index, line)| {
        edge_key(line)
            .filter(|key| running.contains(key))
            .map(|_| index)
    });

    match index {
        Some(index) => {
            lines.remove(index);
            true
        }
        None => false,
    }
}

fn join_hyphenated(lines: Vec<&str>) -> (String, usize) {
    let mut joined = Vec::<String>::with_capacity(lines.len());
    let mut merges = 0usize;

    for line in lines {
        match joined.last_mut() {
            Some(previous) if continues_word(previous.as_str(), line) => {
                let stem_len = previous.trim_end().trim_end_matches('-').len();
                previous.truncate(stem_len);
                previous.push_str(line.trim_start());
                merges += 1;
            }
            _ => joined.push(line.to_string()),
        }
    }

    (joined.join("\n"), merges)
}

/// A letter and hyphen at the end of one line, lowercase at the start of the next.
fn continues_word(previous: &str, next: &str) -> bool {
    let Some(stem) = previous.trim_end().strip_suffix('-') else {
        return false;
    };
    let letter_before = stem
        .trim_end_matches('-')
        .chars()
        .next_back()
        .is_some_and(char::is_alphabetic);
    letter_before
        && next
            .trim_start()
            .chars()
            .next()
            .is_some_and(char::is_lowercase)
}
