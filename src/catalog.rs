use anyhow::Context;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Subject whose lessons are front-loaded into the first three weeks.
pub const BASIC_THEORY: &str = "Basisteori";
/// Subject whose lessons occupy whole Monday-Friday weeks.
pub const FIELD_EXERCISES: &str = "Feltøvelser";

/// The "plukark" feed: subject name to ordered lesson labels.
pub type Catalog = BTreeMap<String, Vec<String>>;

pub fn load_catalog(path: &Path) -> anyhow::Result<Catalog> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read catalog {}", path.display()))?;
    let catalog: Catalog = serde_json::from_str(&text)
        .with_context(|| format!("parse catalog {}", path.display()))?;
    Ok(catalog)
}

pub fn subject_color(subject: &str) -> &'static str {
    match subject {
        "Basisteori" => "#378006",
        "Hvervning" => "#FF6B6B",
        "CBRN" => "#4ECDC4",
        "Skydning" => "#45B7D1",
        "Våbenuddannelse" => "#96CEB4",
        "Fysisk træning" => "#FFEAA7",
        "Eksercits" => "#DDA0DD",
        "Feltøvelser" => "#8B4513",
        _ => "#378006",
    }
}

/// One catalog lesson. Identity is (subject, number), with `number` the
/// 1-based position within the subject's ordered list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonItem {
    pub subject: String,
    pub number: u32,
    pub label: String,
}

impl LessonItem {
    pub fn title(&self) -> String {
        format!("{}: {}", self.subject, self.label)
    }

    pub fn color_tag(&self) -> &'static str {
        subject_color(&self.subject)
    }
}

pub fn subject_lessons(catalog: &Catalog, subject: &str) -> Vec<LessonItem> {
    catalog
        .get(subject)
        .map(|labels| {
            labels
                .iter()
                .enumerate()
                .map(|(i, label)| LessonItem {
                    subject: subject.to_string(),
                    number: (i + 1) as u32,
                    label: label.clone(),
                })
                .collect()
        })
        .unwrap_or_default()
}
