//! List filters shared by every record kind

use serde::Deserialize;
use uuid::Uuid;

/// Query filters accepted by list endpoints.
///
/// Each record kind decides which fields apply to it; the rest are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Filter {
    /// Case-insensitive search over the kind's text fields
    pub q: Option<String>,
    pub status: Option<String>,
    pub course: Option<Uuid>,
    pub category: Option<Uuid>,
    pub difficulty: Option<String>,
    pub employer: Option<Uuid>,
    pub student: Option<Uuid>,
    pub enrollment: Option<Uuid>,
    pub instructor: Option<Uuid>,
    pub posting: Option<Uuid>,
    /// Kind-specific type discriminator (role for accounts)
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl Filter {
    pub fn course(id: Uuid) -> Self {
        Self { course: Some(id), ..Default::default() }
    }

    pub fn student(id: Uuid) -> Self {
        Self { student: Some(id), ..Default::default() }
    }

    pub fn employer(id: Uuid) -> Self {
        Self { employer: Some(id), ..Default::default() }
    }

    pub fn enrollment(id: Uuid) -> Self {
        Self { enrollment: Some(id), ..Default::default() }
    }

    pub fn instructor(id: Uuid) -> Self {
        Self { instructor: Some(id), ..Default::default() }
    }

    pub fn posting(id: Uuid) -> Self {
        Self { posting: Some(id), ..Default::default() }
    }

    /// True when no search term is set or any field contains it
    pub fn text(&self, fields: &[&str]) -> bool {
        match self.q.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                fields.iter().any(|f| f.to_lowercase().contains(&term))
            }
        }
    }

    pub fn status_is(&self, status: &str) -> bool {
        label_matches(self.status.as_deref(), status)
    }

    pub fn kind_is(&self, kind: &str) -> bool {
        label_matches(self.kind.as_deref(), kind)
    }

    pub fn difficulty_is(&self, difficulty: &str) -> bool {
        label_matches(self.difficulty.as_deref(), difficulty)
    }
}

fn label_matches(wanted: Option<&str>, actual: &str) -> bool {
    match wanted.map(str::trim) {
        None | Some("") => true,
        Some(wanted) => wanted.eq_ignore_ascii_case(actual),
    }
}

/// True when the filter id is unset or equal to `actual`
pub fn id_matches(wanted: Option<Uuid>, actual: Uuid) -> bool {
    wanted.map(|w| w == actual).unwrap_or(true)
}

/// Like [`id_matches`] for optional references
pub fn opt_id_matches(wanted: Option<Uuid>, actual: Option<Uuid>) -> bool {
    match wanted {
        None => true,
        Some(w) => actual == Some(w),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_search() {
        let filter = Filter { q: Some("Weld".into()), ..Default::default() };
        assert!(filter.text(&["Advanced welding", "WLD-200"]));
        assert!(!filter.text(&["Plumbing"]));
        assert!(Filter::default().text(&["anything"]));
    }

    #[test]
    fn test_label_filters() {
        let filter = Filter { status: Some("Active".into()), ..Default::default() };
        assert!(filter.status_is("active"));
        assert!(!filter.status_is("draft"));
        assert!(filter.kind_is("whatever"));
    }

    #[test]
    fn test_id_filters() {
        let id = Uuid::new_v4();
        assert!(id_matches(None, id));
        assert!(id_matches(Some(id), id));
        assert!(!id_matches(Some(Uuid::new_v4()), id));
        assert!(!opt_id_matches(Some(id), None));
    }
}
