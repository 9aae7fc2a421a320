use std::collections::HashMap;
use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::index::GrammarIndex;
use crate::syntree::SynTree;

/// The literal marker reported for a sentence that did not parse.
pub const NO_PARSE: &str = "NULL";

/// Why a sentence failed to parse. Not a fatal error: callers report the
/// failure marker for that sentence and move on to the next one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseFailure {
  /// An input word has no lexical rule; the parse halts immediately.
  #[error("unknown word: {0}")]
  UnknownWord(String),
  /// Every word is known but the full span never derived the start symbol.
  #[error("no parse")]
  NoParse,
}

/// A best parse: the derivation tree and its accumulated score.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSentence {
  pub tree: SynTree,
  pub score: f64,
}

impl fmt::Display for ParsedSentence {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}\t{}", self.tree, self.score)
  }
}

/// Index type for the entry arena
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct EntryIdx(pub u32);

/// The best-known derivation of one symbol over one span, with back-pointers
/// into the chart's arena. No down child means a unary or lexical-constituent
/// derivation; no children at all means a terminal word.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
  pub symbol: String,
  pub weight: f64,
  pub left: Option<EntryIdx>,
  pub down: Option<EntryIdx>,
}

/// One table slot: at most one entry per symbol, best score wins.
#[derive(Debug, Default)]
struct Cell {
  entries: HashMap<String, EntryIdx>,
}

/// Triangular table of cells over an entry arena.
///
/// Entries are shared between cells: back-pointers from several cells may
/// target the same child. All entries live in the arena for the chart's
/// lifetime, so replacing a cell's entry never invalidates a child that is
/// still referenced elsewhere.
#[derive(Debug)]
pub struct Chart {
  n: usize,
  cells: Vec<Cell>,
  entries: Vec<Entry>,
}

impl Chart {
  pub fn new(n: usize) -> Self {
    let mut cells = Vec::with_capacity(n * n);
    cells.resize_with(n * n, Cell::default);
    Self {
      n,
      cells,
      entries: Vec::new(),
    }
  }

  pub fn len(&self) -> usize {
    self.n
  }

  pub fn is_empty(&self) -> bool {
    self.n == 0
  }

  fn alloc(&mut self, entry: Entry) -> EntryIdx {
    let idx = self.entries.len() as u32;
    self.entries.push(entry);
    EntryIdx(idx)
  }

  pub fn entry(&self, idx: EntryIdx) -> &Entry {
    &self.entries[idx.0 as usize]
  }

  fn entry_mut(&mut self, idx: EntryIdx) -> &mut Entry {
    &mut self.entries[idx.0 as usize]
  }

  /// The entry for `symbol` over the span `[i, j]`, if any.
  pub fn get(&self, span: (usize, usize), symbol: &str) -> Option<EntryIdx> {
    self.cells[span.0 * self.n + span.1].entries.get(symbol).copied()
  }

  fn set(&mut self, span: (usize, usize), symbol: String, idx: EntryIdx) {
    self.cells[span.0 * self.n + span.1].entries.insert(symbol, idx);
  }

  /// Reconstructs the derivation below an entry: a bare word for a childless
  /// entry, `(label left)` for unary and lexical constituents, and
  /// `(label left down)` for binary constituents.
  pub fn tree(&self, idx: EntryIdx) -> SynTree {
    let entry = self.entry(idx);
    match (entry.left, entry.down) {
      (None, _) => SynTree::Leaf(entry.symbol.clone()),
      (Some(left), None) => SynTree::Branch(entry.symbol.clone(), vec![self.tree(left)]),
      (Some(left), Some(down)) => SynTree::Branch(
        entry.symbol.clone(),
        vec![self.tree(left), self.tree(down)],
      ),
    }
  }
}

impl fmt::Display for Chart {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for i in 0..self.n {
      for j in i..self.n {
        let cell = &self.cells[i * self.n + j];
        if cell.entries.is_empty() {
          continue;
        }
        writeln!(f, "[{}, {}]:", i, j)?;
        let mut symbols = cell.entries.keys().collect::<Vec<_>>();
        symbols.sort();
        for symbol in symbols {
          let entry = self.entry(cell.entries[symbol]);
          writeln!(f, "  {}: {}", symbol, entry.weight)?;
        }
      }
    }
    Ok(())
  }
}

/// Fills the CYK chart for `words`, failing fast on the first unknown word.
///
/// Diagonal cells are seeded from lexical rules and closed over unary rules;
/// longer spans combine sub-spans through binary rules, keeping the best
/// score per symbol per span and re-closing after every improvement.
pub fn parse_chart(g: &GrammarIndex, words: &[&str]) -> Result<Chart, ParseFailure> {
  let mut chart = Chart::new(words.len());

  for j in 0..words.len() {
    let word = words[j];
    let lex_rules = g
      .lexical_rules(word)
      .ok_or_else(|| ParseFailure::UnknownWord(word.to_string()))?;

    // the diagonal: one entry for the word itself, one per producing
    // constituent, unary closure seeded from the constituent
    for rule in lex_rules.iter() {
      let word_entry = chart.alloc(Entry {
        symbol: rule.word.clone(),
        weight: rule.weight,
        left: None,
        down: None,
      });
      match chart.get((j, j), &rule.word) {
        Some(existing) if chart.entry(existing).weight >= rule.weight => {}
        _ => chart.set((j, j), rule.word.clone(), word_entry),
      }

      if let Some(idx) = insert_or_improve(
        &mut chart,
        (j, j),
        &rule.lhs,
        rule.weight,
        Some(word_entry),
        None,
      ) {
        unary_closure(g, &mut chart, (j, j), idx);
      }
    }

    // complete the column upward: all rows i below j, all split points k
    for i in (0..j).rev() {
      for k in i..j {
        for rule in g.binary_rules().iter() {
          let Some(left) = chart.get((i, k), &rule.rhs1) else {
            continue;
          };
          let Some(down) = chart.get((k + 1, j), &rule.rhs2) else {
            continue;
          };

          let weight = chart.entry(left).weight + chart.entry(down).weight + rule.weight;
          if let Some(idx) =
            insert_or_improve(&mut chart, (i, j), &rule.lhs, weight, Some(left), Some(down))
          {
            unary_closure(g, &mut chart, (i, j), idx);
          }
        }
      }
    }
  }

  Ok(chart)
}

/// The highest-scoring parse of `words` spanning the whole sentence and
/// rooted at `start`.
pub fn best_parse(
  g: &GrammarIndex,
  words: &[&str],
  start: &str,
) -> Result<ParsedSentence, ParseFailure> {
  if words.is_empty() {
    return Err(ParseFailure::NoParse);
  }

  let chart = parse_chart(g, words)?;
  match chart.get((0, words.len() - 1), start) {
    Some(idx) => Ok(ParsedSentence {
      tree: chart.tree(idx),
      score: chart.entry(idx).weight,
    }),
    None => {
      debug!(sentence = %words.join(" "), "no full-span parse");
      Err(ParseFailure::NoParse)
    }
  }
}

/// Inserts an entry for `symbol` over `span`, or improves the existing one
/// in place if the new score is strictly better (ties keep the first-found
/// entry). Returns the entry index when the cell changed, so the caller can
/// run unary closure from it.
fn insert_or_improve(
  chart: &mut Chart,
  span: (usize, usize),
  symbol: &str,
  weight: f64,
  left: Option<EntryIdx>,
  down: Option<EntryIdx>,
) -> Option<EntryIdx> {
  match chart.get(span, symbol) {
    Some(idx) => {
      if chart.entry(idx).weight < weight {
        let entry = chart.entry_mut(idx);
        entry.weight = weight;
        entry.left = left;
        entry.down = down;
        Some(idx)
      } else {
        None
      }
    }
    None => {
      let idx = chart.alloc(Entry {
        symbol: symbol.to_string(),
        weight,
        left,
        down,
      });
      chart.set(span, symbol.to_string(), idx);
      Some(idx)
    }
  }
}

/// Transitive closure over unary rules from a newly-best entry. Only
/// improvements recurse, so closure is idempotent once no better derivation
/// exists.
fn unary_closure(g: &GrammarIndex, chart: &mut Chart, span: (usize, usize), from: EntryIdx) {
  let (symbol, weight) = {
    let entry = chart.entry(from);
    (entry.symbol.clone(), entry.weight)
  };

  for rule in g.unary_rules(&symbol).iter() {
    let new_weight = weight + rule.weight;
    if let Some(idx) = insert_or_improve(chart, span, &rule.lhs, new_weight, Some(from), None) {
      unary_closure(g, chart, span, idx);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::grammar::{Grammar, START_SYMBOL};

  fn index(src: &str) -> GrammarIndex {
    let g: Grammar = src.parse().unwrap();
    GrammarIndex::from_rules(&g.rules).unwrap()
  }

  #[test]
  fn test_dog_barks() {
    let g = index("S -> NP VP\t1\nNP -> dog\t1\nVP -> barks\t1\n");
    let parse = best_parse(&g, &["dog", "barks"], START_SYMBOL).unwrap();

    assert_eq!(format!("{}", parse.tree), "(S (NP dog) (VP barks))");
    // scores combine additively: left + down + rule
    assert_eq!(parse.score, 3.0);
    assert_eq!(format!("{}", parse), "(S (NP dog) (VP barks))\t3");
  }

  #[test]
  fn test_unknown_word_fails_immediately() {
    let g = index("S -> NP VP\t1\nNP -> dog\t1\nVP -> barks\t1\n");

    assert_eq!(
      best_parse(&g, &["dog", "meows"], START_SYMBOL),
      Err(ParseFailure::UnknownWord("meows".to_string()))
    );
    // a sentence of entirely unknown words fails on the first one
    assert_eq!(
      best_parse(&g, &["colorless", "green", "ideas"], START_SYMBOL),
      Err(ParseFailure::UnknownWord("colorless".to_string()))
    );
  }

  #[test]
  fn test_known_words_but_no_parse() {
    let g = index("S -> NP VP\t1\nNP -> dog\t1\nVP -> barks\t1\n");
    assert_eq!(
      best_parse(&g, &["barks", "dog"], START_SYMBOL),
      Err(ParseFailure::NoParse)
    );
    assert_eq!(
      best_parse(&g, &[], START_SYMBOL),
      Err(ParseFailure::NoParse)
    );
  }

  #[test]
  fn test_unary_closure_is_transitive() {
    // barks lifts VP -> IV -> V through two unary hops
    let g = index("S -> NP VP\t1\nNP -> dog\t1\nV -> barks\t0.5\nIV -> V\t0.25\nVP -> IV\t0.125\n");
    let parse = best_parse(&g, &["dog", "barks"], START_SYMBOL).unwrap();

    assert_eq!(
      format!("{}", parse.tree),
      "(S (NP dog) (VP (IV (V barks))))"
    );
    // 1 + (0.5 + 0.25 + 0.125) + 1
    assert!((parse.score - 2.875).abs() < 1e-9);
  }

  #[test]
  fn test_best_score_wins_within_cell() {
    // NP is derivable directly (0.1) or through N (1 + 1); the better
    // derivation replaces the worse one along with its children
    let g = index("S -> NP VP\t1\nNP -> dog\t0.1\nN -> dog\t1\nNP -> N\t1\nVP -> barks\t1\n");
    let parse = best_parse(&g, &["dog", "barks"], START_SYMBOL).unwrap();

    assert_eq!(format!("{}", parse.tree), "(S (NP (N dog)) (VP barks))");
    // NP = 1 (N -> dog) + 1 (NP -> N), then + 1 (VP) + 1 (S rule)
    assert_eq!(parse.score, 4.0);
  }

  #[test]
  fn test_split_point_choice() {
    // two known splits for the same symbol over [0, 2]; the higher-scoring
    // split must win regardless of discovery order
    let g = index(
      "S -> A B\t0.5\nS -> C D\t2\nA -> A A\t1\nA -> x\t1\nB -> x\t1\nC -> x\t1\nD -> D D\t1\nD -> x\t1\n",
    );
    let parse = best_parse(&g, &["x", "x", "x"], START_SYMBOL).unwrap();

    // S -> C D: 1 + (1 + 1 + 1) + 2 = 6 beats S -> A B: (1 + 1 + 1) + 1 + 0.5
    assert_eq!(parse.score, 6.0);
    assert_eq!(format!("{}", parse.tree), "(S (C x) (D (D x) (D x)))");
  }

  #[test]
  fn test_closure_is_idempotent() {
    let g = index("S -> NP VP\t1\nNP -> dog\t1\nVP -> barks\t1\nX -> NP\t0.5\nY -> X\t0.5\n");
    let mut chart = parse_chart(&g, &["dog"]).unwrap();

    let snapshot = chart.entries.clone();
    for idx in 0..snapshot.len() {
      unary_closure(&g, &mut chart, (0, 0), EntryIdx(idx as u32));
    }
    assert_eq!(chart.entries, snapshot);
  }

  #[test]
  fn test_binarized_grammar_covers_original_language() {
    use crate::binarize::Binarizer;
    use crate::rules::GrammarRule;

    // S -> NP V NP is not binary; after binarization the same sentence
    // must still parse, now through the intermediate symbol
    let rules = vec![
      GrammarRule::new("S", vec!["NP".into(), "V".into(), "NP".into()], 1.0, false),
      GrammarRule::new("NP", vec!["dog".into()], 1.0, true),
      GrammarRule::new("V", vec!["bites".into()], 1.0, true),
    ];
    let binarized = Binarizer::new().binarize(&rules);
    let g = GrammarIndex::from_rules(&binarized).unwrap();

    let parse = best_parse(&g, &["dog", "bites", "dog"], START_SYMBOL).unwrap();
    assert_eq!(
      format!("{}", parse.tree),
      "(S (X1 (NP dog) (V bites)) (NP dog))"
    );
  }

  #[test]
  fn test_index_shared_across_threads() {
    let g = index("S -> NP VP\t1\nNP -> dog\t1\nVP -> barks\t1\n");

    std::thread::scope(|scope| {
      for _ in 0..4 {
        scope.spawn(|| {
          let parse = best_parse(&g, &["dog", "barks"], START_SYMBOL).unwrap();
          assert_eq!(parse.score, 3.0);
        });
      }
    });
  }

  #[test]
  fn test_chart_display_lists_spans() {
    let g = index("S -> NP VP\t1\nNP -> dog\t1\nVP -> barks\t1\n");
    let chart = parse_chart(&g, &["dog", "barks"]).unwrap();
    let rendered = format!("{}", chart);

    assert!(rendered.contains("[0, 0]:"));
    assert!(rendered.contains("[0, 1]:"));
    assert!(rendered.contains("  S: 3"));
  }
}
