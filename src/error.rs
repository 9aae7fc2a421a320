use thiserror::Error;

/// Fatal errors: bad input files, bad grammar text, or a grammar that
/// can't be used for parsing. Per-sentence parse failures are not errors,
/// see [`crate::cyk::ParseFailure`].
#[derive(Debug, Error)]
pub enum Error {
  #[error("empty ruleset")]
  EmptyGrammar,

  /// A non-lexical rule with an RHS length outside {1, 2} reached the
  /// grammar index. The grammar must be binarized before indexing.
  #[error("malformed grammar: rule `{rule}` has {arity} RHS symbols; binarize the grammar first")]
  MalformedGrammar { rule: String, arity: usize },

  #[error("grammar syntax: {0}")]
  GrammarSyntax(String),

  #[error("treebank syntax: {0}")]
  TreeSyntax(String),

  #[error(transparent)]
  Io(#[from] std::io::Error),
}
