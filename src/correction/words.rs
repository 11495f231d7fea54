//! Character hypothesis → words.

/// Split a character hypothesis into words, collapsing runs of whitespace.
pub fn split_words(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Canonical sentence form: lowercase words joined by single spaces.
pub fn normalize_sentence(text: &str) -> String {
    split_words(&text.to_lowercase()).join(" ")
}

/// Levenshtein distance over arbitrary tokens.
///
/// Used over chars for character error rate and over words for word error rate.
pub fn edit_distance<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, x) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, y) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(x != y);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}
