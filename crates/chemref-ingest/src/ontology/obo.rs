// OBO 1.2 flat-file parser

use crate::error::{IngestError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

// ============================================================================
// Models
// ============================================================================

/// Header tags preceding the first stanza
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OboHeader {
    pub format_version: Option<String>,
    pub data_version: Option<String>,
    pub ontology: Option<String>,
    pub date: Option<String>,
}

/// Synonym scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SynonymScope {
    Exact,
    Broad,
    Narrow,
    Related,
}

impl SynonymScope {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "EXACT" => Some(SynonymScope::Exact),
            "BROAD" => Some(SynonymScope::Broad),
            "NARROW" => Some(SynonymScope::Narrow),
            "RELATED" => Some(SynonymScope::Related),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Synonym {
    pub text: String,
    pub scope: SynonymScope,
    /// Synonym type, e.g. "PSI-MOD-label"
    pub synonym_type: Option<String>,
}

/// A `[Term]` stanza
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OboTerm {
    pub id: String,
    pub name: Option<String>,
    pub definition: Option<String>,
    pub comment: Option<String>,
    pub synonyms: Vec<Synonym>,
    pub xrefs: Vec<String>,
    pub alt_ids: Vec<String>,
    pub is_obsolete: bool,
}

/// A typed edge from a term to one of its parents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OboRelationship {
    /// Child term id
    pub subject: String,
    /// Parent term id
    pub object: String,
    /// `is_a` or the relationship type name (`part_of`, `derives_from`, ...)
    pub relation: String,
}

/// Parsed OBO file, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OboDocument {
    pub header: OboHeader,
    pub terms: Vec<OboTerm>,
    pub relationships: Vec<OboRelationship>,
}

// ============================================================================
// Parser
// ============================================================================

pub struct OboParser;

impl OboParser {
    /// Parse an OBO document.
    ///
    /// Only `[Term]` stanzas are kept; `[Typedef]` and `[Instance]` stanzas
    /// are skipped. Fails when the text holds no term at all, which is what
    /// an error page served in place of the ontology looks like.
    pub fn parse(content: &str, limit: Option<usize>) -> Result<OboDocument> {
        let lines: Vec<&str> = content.lines().collect();
        let mut i = 0;
        let mut document = OboDocument::default();

        info!("Starting OBO parsing (limit: {:?})", limit);

        // Header runs until the first stanza
        while i < lines.len() {
            let line = lines[i].trim();
            if line.starts_with('[') {
                break;
            }
            if let Some((key, value)) = line.split_once(':') {
                let value = Some(value.trim().to_string());
                match key.trim() {
                    "format-version" => document.header.format_version = value,
                    "data-version" => document.header.data_version = value,
                    "ontology" => document.header.ontology = value,
                    "date" => document.header.date = value,
                    _ => {},
                }
            }
            i += 1;
        }

        while i < lines.len() {
            if let Some(max_terms) = limit {
                if document.terms.len() >= max_terms {
                    info!("Reached parse limit of {} terms", max_terms);
                    break;
                }
            }

            if lines[i].trim() == "[Term]" {
                match Self::parse_term_stanza(&lines, &mut i) {
                    Some((term, relationships)) => {
                        document.terms.push(term);
                        document.relationships.extend(relationships);
                    },
                    None => warn!("Skipping [Term] stanza without an id near line {}", i),
                }
            } else {
                i += 1;
            }
        }

        if document.terms.is_empty() {
            return Err(IngestError::parse("OBO content has no [Term] stanzas"));
        }

        info!(
            "Parsed {} OBO terms and {} relationships",
            document.terms.len(),
            document.relationships.len()
        );

        Ok(document)
    }

    /// Parse one `[Term]` stanza; `None` when it carries no id
    fn parse_term_stanza(lines: &[&str], i: &mut usize) -> Option<(OboTerm, Vec<OboRelationship>)> {
        *i += 1; // Skip [Term] line

        let mut term = OboTerm::default();
        let mut parents: Vec<(String, String)> = Vec::new();

        while *i < lines.len() {
            let line = lines[*i].trim();

            if line.starts_with('[') {
                break;
            }
            *i += 1;

            if line.is_empty() || line.starts_with('!') {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match key.trim() {
                "id" => term.id = value.to_string(),
                "name" => term.name = Some(value.to_string()),
                "def" => term.definition = Some(Self::extract_quoted_text(value)),
                "comment" => term.comment = Some(value.to_string()),
                "is_obsolete" => term.is_obsolete = value == "true",
                "synonym" => match Self::parse_synonym(value) {
                    Some(synonym) => term.synonyms.push(synonym),
                    None => debug!("Ignoring malformed synonym: {}", value),
                },
                "xref" => term.xrefs.push(Self::strip_trailing_comment(value)),
                "alt_id" => term.alt_ids.push(value.to_string()),
                "is_a" => {
                    // "MOD:00000 ! protein modification"
                    if let Some(parent_id) = value.split_whitespace().next() {
                        parents.push((parent_id.to_string(), "is_a".to_string()));
                    }
                },
                "relationship" => {
                    // "derives_from MOD:00001 ! L-alanine residue"
                    let mut parts = value.split_whitespace();
                    if let (Some(relation), Some(parent_id)) = (parts.next(), parts.next()) {
                        parents.push((parent_id.to_string(), relation.to_string()));
                    }
                },
                _ => {},
            }
        }

        if term.id.is_empty() {
            return None;
        }

        let relationships = parents
            .into_iter()
            .map(|(object, relation)| OboRelationship {
                subject: term.id.clone(),
                object,
                relation,
            })
            .collect();

        Some((term, relationships))
    }

    /// `"text" [refs]` -> `text`
    fn extract_quoted_text(text: &str) -> String {
        if let Some(start) = text.find('"') {
            if let Some(end) = text[start + 1..].find('"') {
                return text[start + 1..start + 1 + end].to_string();
            }
        }
        text.to_string()
    }

    fn strip_trailing_comment(value: &str) -> String {
        match value.split_once(" !") {
            Some((head, _)) => head.trim().to_string(),
            None => value.to_string(),
        }
    }

    /// `"Ala" EXACT PSI-MOD-label []`
    fn parse_synonym(text: &str) -> Option<Synonym> {
        let parts: Vec<&str> = text.splitn(3, '"').collect();
        if parts.len() < 3 {
            return None;
        }

        let mut rest = parts[2].split_whitespace();
        let scope = rest
            .next()
            .and_then(SynonymScope::from_str)
            .unwrap_or(SynonymScope::Related);
        let synonym_type = rest
            .next()
            .filter(|t| !t.starts_with('['))
            .map(str::to_string);

        Some(Synonym {
            text: parts[1].to_string(),
            scope,
            synonym_type,
        })
    }
}
