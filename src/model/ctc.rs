//! CTC decoding over per-frame log-probabilities.
//!
//! Rows are frames, columns are CTC outputs (index 0 is the blank).
//! Returned tokens are CTC output indices; see [`crate::model::Vocab::decode_ctc`].

use std::collections::HashMap;

/// A decoded label sequence and its log-probability.
#[derive(Debug, Clone, PartialEq)]
pub struct CtcHypothesis {
    pub tokens: Vec<usize>,
    pub log_prob: f32,
}

fn log_add(a: f32, b: f32) -> f32 {
    if a == f32::NEG_INFINITY {
        return b;
    }
    if b == f32::NEG_INFINITY {
        return a;
    }
    let (hi, lo) = if a > b { (a, b) } else { (b, a) };
    hi + (lo - hi).exp().ln_1p()
}

fn argmax(row: &[f32]) -> (usize, f32) {
    row.iter()
        .copied()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, v)| if v > best.1 { (i, v) } else { best })
}

/// Best path decoding: take the top output per frame, collapse repeats, drop blanks.
///
/// `log_prob` is the log-probability of the best path, not of the label sequence.
pub fn greedy_decode(log_probs: &[Vec<f32>], blank: usize) -> CtcHypothesis {
    let mut tokens = Vec::new();
    let mut previous = None;
    let mut total = 0.0;
    for row in log_probs {
        let (best, score) = argmax(row);
        total += score;
        if Some(best) != previous && best != blank {
            tokens.push(best);
        }
        previous = Some(best);
    }
    CtcHypothesis {
        tokens,
        log_prob: total,
    }
}

#[derive(Debug, Clone, Copy)]
struct PrefixScore {
    blank: f32,
    non_blank: f32,
}

impl PrefixScore {
    const EMPTY: PrefixScore = PrefixScore {
        blank: f32::NEG_INFINITY,
        non_blank: f32::NEG_INFINITY,
    };

    fn total(&self) -> f32 {
        log_add(self.blank, self.non_blank)
    }
}

fn add_non_blank(beams: &mut HashMap<Vec<usize>, PrefixScore>, prefix: Vec<usize>, log_prob: f32) {
    if log_prob == f32::NEG_INFINITY {
        return;
    }
    let entry = beams.entry(prefix).or_insert(PrefixScore::EMPTY);
    entry.non_blank = log_add(entry.non_blank, log_prob);
}

/// Prefix beam search, keeping the `beam_width` most probable label prefixes.
///
/// Returns hypotheses best first. Prefix scores sum over every alignment that
/// collapses to the prefix.
pub fn prefix_beam_search(log_probs: &[Vec<f32>], blank: usize, beam_width: usize) -> Vec<CtcHypothesis> {
    let beam_width = beam_width.max(1);
    let mut beams: Vec<(Vec<usize>, PrefixScore)> = vec![(
        Vec::new(),
        PrefixScore {
            blank: 0.0,
            non_blank: f32::NEG_INFINITY,
        },
    )];

    for row in log_probs {
        let mut next: HashMap<Vec<usize>, PrefixScore> = HashMap::new();
        for (prefix, score) in &beams {
            for (symbol, &p) in row.iter().enumerate() {
                if p == f32::NEG_INFINITY {
                    continue;
                }
                if symbol == blank {
                    let entry = next.entry(prefix.clone()).or_insert(PrefixScore::EMPTY);
                    entry.blank = log_add(entry.blank, score.total() + p);
                    continue;
                }
                let mut extended = prefix.clone();
                extended.push(symbol);
                if prefix.last() == Some(&symbol) {
                    // a repeat only extends the prefix across a blank
                    add_non_blank(&mut next, extended, score.blank + p);
                    add_non_blank(&mut next, prefix.clone(), score.non_blank + p);
                } else {
                    add_non_blank(&mut next, extended, score.total() + p);
                }
            }
        }
        let mut ranked: Vec<(Vec<usize>, PrefixScore)> = next.into_iter().collect();
        ranked.sort_by(|a, b| b.1.total().total_cmp(&a.1.total()).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(beam_width);
        beams = ranked;
    }

    beams
        .into_iter()
        .map(|(tokens, score)| CtcHypothesis {
            tokens,
            log_prob: score.total(),
        })
        .collect()
}
