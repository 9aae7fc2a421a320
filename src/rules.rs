use std::fmt;

/// A weighted production.
///
/// Rules are deduplicated by their `(lhs, rhs)` pair: the same production
/// observed in different trees accumulates counts during induction rather
/// than producing duplicate rules. The weight is assigned once; rewrites
/// (binarization) build new rule values instead of mutating old ones.
#[derive(Debug, Clone, PartialEq)]
pub struct GrammarRule {
  pub lhs: String,
  pub rhs: Vec<String>,
  pub weight: f64,
  /// True iff the RHS is a single terminal symbol.
  pub lexical: bool,
}

impl GrammarRule {
  pub fn new<S: Into<String>>(lhs: S, rhs: Vec<String>, weight: f64, lexical: bool) -> Self {
    let rhs_len = rhs.len();
    debug_assert!(rhs_len >= 1, "epsilon productions are not supported");
    debug_assert!(!lexical || rhs_len == 1);

    Self {
      lhs: lhs.into(),
      rhs,
      weight,
      lexical,
    }
  }

  pub fn len(&self) -> usize {
    self.rhs.len()
  }

  pub fn is_unary(&self) -> bool {
    !self.lexical && self.rhs.len() == 1
  }

  pub fn is_binary(&self) -> bool {
    self.rhs.len() == 2
  }
}

impl fmt::Display for GrammarRule {
  /// The persistable line form: `LHS -> RHS1 RHS2 ... RHSk<TAB>weight`.
  /// `Grammar`'s `FromStr` parses this form back.
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ->", self.lhs)?;
    for symbol in self.rhs.iter() {
      write!(f, " {}", symbol)?;
    }
    write!(f, "\t{}", self.weight)
  }
}

#[test]
fn test_rule_display() {
  let rule = GrammarRule::new(
    "S",
    vec!["NP".to_string(), "VP".to_string()],
    0.5,
    false,
  );
  assert_eq!(format!("{}", rule), "S -> NP VP\t0.5");

  let lex = GrammarRule::new("N", vec!["dog".to_string()], 1.0, true);
  assert_eq!(format!("{}", lex), "N -> dog\t1");
}
