use std::collections::HashSet;

use oxrdf::{NamedNode, Term, Triple};
use oxttl::{TurtleParser, TurtleSerializer};

use crate::LDP_CONTAINS;
use crate::error::ContainmentError;

/// An exported repository root description: its triples in document order,
/// without duplicates, and the prefixes it declared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootDescription {
  triples: Vec<Triple>,
  prefixes: Vec<(String, String)>,
}

impl RootDescription {
  pub fn parse(content: &str) -> Result<Self, ContainmentError> {
    let mut reader = TurtleParser::new().for_reader(content.as_bytes());

    let mut seen = HashSet::new();
    let mut triples = Vec::new();
    for triple in reader.by_ref() {
      let triple = triple?;
      if seen.insert(triple.clone()) {
        triples.push(triple);
      }
    }

    // Sorted so that rewriting the same graph twice gives identical bytes.
    let mut prefixes: Vec<(String, String)> = reader
      .prefixes()
      .map(|(name, iri)| (name.to_string(), iri.to_string()))
      .collect();
    prefixes.sort();

    Ok(Self { triples, prefixes })
  }

  pub fn triples(&self) -> &[Triple] {
    &self.triples
  }

  /// Declared prefixes as `(name, iri)` pairs, sorted by name.
  pub fn prefixes(&self) -> &[(String, String)] {
    &self.prefixes
  }

  /// Objects of every `ldp:contains` triple, in document order.
  pub fn containment_targets(&self) -> Vec<String> {
    self
      .triples
      .iter()
      .filter(|t| is_containment(t))
      .map(|t| term_value(&t.object))
      .collect()
  }

  /// Drop every `ldp:contains` triple whose object is not `keep`.
  ///
  /// Returns the removed targets in document order.
  pub fn retain_containment(&mut self, keep: &NamedNode) -> Vec<String> {
    let mut removed = Vec::new();
    self.triples.retain(|t| {
      if !is_containment(t) || matches!(&t.object, Term::NamedNode(n) if n == keep) {
        return true;
      }
      removed.push(term_value(&t.object));
      false
    });
    removed
  }

  /// Serialize as Turtle with the declared prefixes.
  pub fn to_turtle(&self) -> Result<Vec<u8>, ContainmentError> {
    let mut serializer = TurtleSerializer::new();
    for (name, iri) in &self.prefixes {
      serializer = serializer.with_prefix(name, iri)?;
    }

    let mut writer = serializer.for_writer(Vec::new());
    for triple in &self.triples {
      writer
        .serialize_triple(triple)
        .map_err(ContainmentError::Serialize)?;
    }
    writer.finish().map_err(ContainmentError::Serialize)
  }
}

fn is_containment(triple: &Triple) -> bool {
  triple.predicate.as_str() == LDP_CONTAINS
}

fn term_value(term: &Term) -> String {
  match term {
    Term::NamedNode(node) => node.as_str().to_string(),
    other => other.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const ROOT: &str = r#"@prefix ldp: <http://www.w3.org/ns/ldp#> .
@prefix x: <http://x/> .

<http://localhost:8984/rest> ldp:contains <http://localhost:8984/rest/prod> , <http://localhost:8984/rest/audit> ;
    ldp:contains <http://localhost:8984/rest/prod> ;
    x:weight .5 ;
    x:label "root"@en .
"#;

  fn prod() -> NamedNode {
    NamedNode::new("http://localhost:8984/rest/prod").unwrap()
  }

  #[test]
  fn test_repeated_triples_collapse() {
    let doc = RootDescription::parse(ROOT).unwrap();
    assert_eq!(
      doc.containment_targets(),
      vec![
        "http://localhost:8984/rest/prod",
        "http://localhost:8984/rest/audit"
      ]
    );
    assert_eq!(doc.triples().len(), 4);
  }

  #[test]
  fn test_prefixes_are_captured() {
    let doc = RootDescription::parse(ROOT).unwrap();
    let names: Vec<_> = doc.prefixes().iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["ldp", "x"]);
  }

  #[test]
  fn test_retain_keeps_non_containment_triples() {
    let mut doc = RootDescription::parse(ROOT).unwrap();
    let removed = doc.retain_containment(&prod());

    assert_eq!(removed, vec!["http://localhost:8984/rest/audit"]);
    assert_eq!(doc.containment_targets(), vec!["http://localhost:8984/rest/prod"]);
    assert_eq!(doc.triples().len(), 3);
  }

  #[test]
  fn test_trailing_slash_is_a_different_resource() {
    let mut doc = RootDescription::parse(
      "<http://localhost:8984/rest> <http://www.w3.org/ns/ldp#contains> <http://localhost:8984/rest/prod/> .",
    )
    .unwrap();
    let removed = doc.retain_containment(&prod());
    assert_eq!(removed, vec!["http://localhost:8984/rest/prod/"]);
  }

  #[test]
  fn test_serialized_output_parses_to_the_same_graph() {
    let mut doc = RootDescription::parse(ROOT).unwrap();
    doc.retain_containment(&prod());

    let turtle = doc.to_turtle().unwrap();
    let reparsed = RootDescription::parse(std::str::from_utf8(&turtle).unwrap()).unwrap();
    assert_eq!(reparsed.triples(), doc.triples());
    assert_eq!(reparsed.prefixes(), doc.prefixes());
  }

  #[test]
  fn test_invalid_turtle_is_a_parse_error() {
    let err = RootDescription::parse(
      "<http://localhost:8984/rest> undeclared:contains <http://localhost:8984/rest/prod> .",
    )
    .unwrap_err();
    assert!(matches!(err, ContainmentError::Parse(_)));
  }
}
