// BioPortal ATC CSV parser

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Prefix of every ATC class IRI in the BioPortal export
pub const ATC_NAMESPACE: &str = "http://purl.bioontology.org/ontology/UATC/";

/// Parent IRI of the top-level anatomical groups
const OWL_THING: &str = "http://www.w3.org/2002/07/owl#Thing";

/// Descriptive fields of one ATC class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtcTerm {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,
    pub definition: Option<String>,
    /// 1 (anatomical main group) through 5 (chemical substance)
    pub level: Option<u8>,
}

/// Parsed ATC classification; this is what gets cached
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtcData {
    pub names: BTreeMap<String, AtcTerm>,
    /// `None` marks a top-level group
    pub parents: BTreeMap<String, Option<String>>,
}

/// Columns we read; the export carries several more
#[derive(Debug, Deserialize)]
struct AtcRow {
    #[serde(rename = "Class ID")]
    class_id: String,
    #[serde(rename = "Preferred Label", default)]
    preferred_label: String,
    #[serde(rename = "Synonyms", default)]
    synonyms: String,
    #[serde(rename = "Definitions", default)]
    definitions: String,
    #[serde(rename = "Parents", default)]
    parents: String,
    #[serde(rename = "ATC LEVEL", default)]
    level: String,
}

pub struct AtcParser {
    /// Maximum number of classes to parse (for testing)
    parse_limit: Option<usize>,
}

impl AtcParser {
    pub fn new() -> Self {
        Self { parse_limit: None }
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            parse_limit: Some(limit),
        }
    }

    /// Parse the CSV export.
    ///
    /// Rows outside the UATC namespace (STY semantic types and the like) are
    /// skipped. When a class lists several parents the first one is kept.
    pub fn parse(&self, content: &str) -> Result<AtcData> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut data = AtcData::default();
        let mut skipped = 0usize;

        for row in reader.deserialize::<AtcRow>() {
            if let Some(limit) = self.parse_limit {
                if data.names.len() >= limit {
                    info!("Reached parse limit of {} classes", limit);
                    break;
                }
            }

            let row = row?;
            let Some(code) = row.class_id.strip_prefix(ATC_NAMESPACE) else {
                skipped += 1;
                continue;
            };
            let code = code.trim().to_string();

            let parent = Self::parent_code(&row.parents);
            let term = AtcTerm {
                name: row.preferred_label,
                synonyms: row
                    .synonyms
                    .split('|')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
                definition: Some(row.definitions).filter(|d| !d.trim().is_empty()),
                level: row.level.trim().parse().ok(),
            };

            data.parents.insert(code.clone(), parent);
            data.names.insert(code, term);
        }

        debug!("Skipped {} rows outside {}", skipped, ATC_NAMESPACE);
        info!(
            "Parsed ATC classes: {} names, {} parents",
            data.names.len(),
            data.parents.len()
        );

        Ok(data)
    }

    fn parent_code(raw: &str) -> Option<String> {
        let first = raw.split('|').next()?.trim();
        if first.is_empty() || first == OWL_THING {
            return None;
        }
        Some(first.strip_prefix(ATC_NAMESPACE).unwrap_or(first).to_string())
    }
}

impl Default for AtcParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Class ID,Preferred Label,Synonyms,Definitions,Obsolete,CUI,Semantic Types,Parents,ATC LEVEL,Is Drug Class,Semantic type UMLS property
http://purl.bioontology.org/ontology/UATC/A,ALIMENTARY TRACT AND METABOLISM,,,false,C3653431,,http://www.w3.org/2002/07/owl#Thing,1,,
http://purl.bioontology.org/ontology/UATC/A03,DRUGS FOR FUNCTIONAL GASTROINTESTINAL DISORDERS,,,false,C3653432,,http://purl.bioontology.org/ontology/UATC/A,2,,
http://purl.bioontology.org/ontology/UATC/A03A,DRUGS FOR FUNCTIONAL BOWEL DISORDERS,,,false,C3653433,,http://purl.bioontology.org/ontology/UATC/A03,3,,
http://purl.bioontology.org/ontology/UATC/A03AX,Other drugs for functional bowel disorders,,,false,C3653434,,http://purl.bioontology.org/ontology/UATC/A03A,4,,
http://purl.bioontology.org/ontology/UATC/A03AX13,silicones,dimeticone|simethicone,\"Polymers of siloxane\",false,C0037114,http://purl.bioontology.org/ontology/STY/T109|http://purl.bioontology.org/ontology/STY/T122,http://purl.bioontology.org/ontology/UATC/A03AX,5,,
http://purl.bioontology.org/ontology/STY/T109,Organic Chemical,,,false,,,,,,
";

    #[test]
    fn test_parse_names_and_parents() {
        let data = AtcParser::new().parse(SAMPLE).unwrap();
        assert_eq!(data.names.len(), 5);
        assert_eq!(data.parents.len(), 5);

        assert_eq!(data.parents["A"], None);
        assert_eq!(data.parents["A03AX13"].as_deref(), Some("A03AX"));

        let silicones = &data.names["A03AX13"];
        assert_eq!(silicones.name, "silicones");
        assert_eq!(silicones.synonyms, vec!["dimeticone", "simethicone"]);
        assert_eq!(silicones.definition.as_deref(), Some("Polymers of siloxane"));
        assert_eq!(silicones.level, Some(5));

        assert_eq!(data.names["A"].definition, None);
        assert!(data.names["A"].synonyms.is_empty());
    }

    #[test]
    fn test_foreign_namespace_rows_skipped() {
        let data = AtcParser::new().parse(SAMPLE).unwrap();
        assert!(!data.names.keys().any(|k| k.contains("STY")));
    }

    #[test]
    fn test_parent_code() {
        assert_eq!(AtcParser::parent_code(""), None);
        assert_eq!(AtcParser::parent_code(OWL_THING), None);
        assert_eq!(
            AtcParser::parent_code(
                "http://purl.bioontology.org/ontology/UATC/B05D|http://purl.bioontology.org/ontology/UATC/B05"
            )
            .as_deref(),
            Some("B05D")
        );
    }

    #[test]
    fn test_non_numeric_level() {
        let csv = "Class ID,Preferred Label,Parents,ATC LEVEL\n\
                   http://purl.bioontology.org/ontology/UATC/V,VARIOUS,,n/a\n";
        let data = AtcParser::new().parse(csv).unwrap();
        assert_eq!(data.names["V"].level, None);
        assert_eq!(data.parents["V"], None);
    }

    #[test]
    fn test_parse_limit() {
        let data = AtcParser::with_limit(2).parse(SAMPLE).unwrap();
        assert_eq!(data.names.len(), 2);
    }
}
