//! Skill library files
//!
//! A library is a TOML file of high-level skill templates:
//!
//! ```toml
//! [[skill]]
//! name = "patrol"
//! description = "walk a square with side $1"
//! definition = "4{move($1);turn(90);}"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use super::{HighLevelSkills, TemplateSkill};

#[derive(Debug, Deserialize)]
struct LibraryFile {
    #[serde(default, rename = "skill")]
    skills: Vec<SkillDefinition>,
}

/// One `[[skill]]` table
#[derive(Debug, Clone, Deserialize)]
pub struct SkillDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub definition: String,
}

/// Parse library text into a high-level registry
pub fn parse_library(text: &str) -> Result<HighLevelSkills> {
    let file: LibraryFile = toml::from_str(text).context("Invalid skill library")?;

    let mut seen = HashSet::new();
    let mut registry = HighLevelSkills::new();
    for skill in file.skills {
        let name = skill.name.trim();
        if name.is_empty() {
            bail!("Skill library entry has an empty name");
        }
        if !seen.insert(name.to_string()) {
            bail!("Skill `{}` is defined more than once", name);
        }
        registry.register(TemplateSkill::new(name, skill.description, skill.definition));
    }

    Ok(registry)
}

/// Read and parse a library file
pub fn load_library(path: &Path) -> Result<HighLevelSkills> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read skill library {}", path.display()))?;
    parse_library(&text).with_context(|| format!("Failed to load {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::HighLevelSkill;

    #[test]
    fn test_parse_library() {
        let text = r#"
            [[skill]]
            name = "patrol"
            description = "walk a square"
            definition = "4{move($1);turn(90);}"

            [[skill]]
            name = "spin"
            definition = "turn(360);"
        "#;

        let registry = parse_library(text).unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["patrol", "spin"]);

        let patrol = registry.get("patrol").unwrap();
        assert_eq!(patrol.description(), "walk a square");
        assert_eq!(patrol.execute(&["50".to_string()]), "4{move(50);turn(90);}");
    }

    #[test]
    fn test_empty_library() {
        assert!(parse_library("").unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let text = r#"
            [[skill]]
            name = "spin"
            definition = "turn(360);"

            [[skill]]
            name = "spin"
            definition = "turn(-360);"
        "#;

        let err = parse_library(text).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_missing_definition_rejected() {
        let text = r#"
            [[skill]]
            name = "spin"
        "#;

        assert!(parse_library(text).is_err());
    }
}
