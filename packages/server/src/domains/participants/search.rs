//! Search planning for the participant registry.
//!
//! Pure functions: they decide which lookups a query turns into. Running the
//! lookups lives in `actions`.

use crate::common::validation::{is_cpf, is_ra, is_rf};

/// A query classified by its shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchKey {
    Cpf(String),
    Ra(String),
    Rf(String),
    Name(String),
}

/// Classified search: the shape of the trimmed query picks exactly one field.
pub fn classify(query: &str) -> SearchKey {
    let query = query.trim();
    if is_cpf(query) {
        SearchKey::Cpf(query.to_string())
    } else if is_ra(query) {
        SearchKey::Ra(query.to_string())
    } else if is_rf(query) {
        SearchKey::Rf(query.to_string())
    } else {
        SearchKey::Name(query.to_string())
    }
}

/// Lookups for one unified search, in result order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnifiedPlan {
    pub cpf: Option<String>,
    pub ra: Option<String>,
    pub rf: Option<String>,
    pub name: Option<String>,
}

/// Build the unified plan for `query`. `None` for a blank query.
pub fn plan_unified(query: &str) -> Option<UnifiedPlan> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }

    let mut plan = UnifiedPlan::default();

    // Every digit counts, so "111.111.111-11" and "RA: 123456" both qualify.
    let digits: String = query.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.len() {
        11 => plan.cpf = Some(digits),
        6 => plan.ra = Some(digits),
        4 => plan.rf = Some(digits),
        _ => {}
    }

    let purely_digits = query.chars().all(|c| c.is_ascii_digit());
    if !purely_digits || query.chars().count() < 4 {
        plan.name = Some(query.to_string());
    }

    Some(plan)
}

/// Escape LIKE wildcards so user input matches literally.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_by_shape() {
        assert_eq!(classify("12345678901"), SearchKey::Cpf("12345678901".into()));
        assert_eq!(classify(" 123456 "), SearchKey::Ra("123456".into()));
        assert_eq!(classify("1234"), SearchKey::Rf("1234".into()));
        assert_eq!(classify("12345"), SearchKey::Name("12345".into()));
        assert_eq!(classify("Maria"), SearchKey::Name("Maria".into()));
        // Formatted CPF is not an exact CPF in classified search
        assert_eq!(
            classify("111.111.111-11"),
            SearchKey::Name("111.111.111-11".into())
        );
    }

    #[test]
    fn blank_query_has_no_plan() {
        assert_eq!(plan_unified(""), None);
        assert_eq!(plan_unified("   "), None);
    }

    #[test]
    fn formatted_cpf_hits_cpf_and_name() {
        let plan = plan_unified("111.111.111-11").unwrap();
        assert_eq!(plan.cpf.as_deref(), Some("11111111111"));
        assert_eq!(plan.ra, None);
        assert_eq!(plan.rf, None);
        assert_eq!(plan.name.as_deref(), Some("111.111.111-11"));
    }

    #[test]
    fn six_digits_is_ra_only() {
        let plan = plan_unified("123456").unwrap();
        assert_eq!(
            plan,
            UnifiedPlan {
                ra: Some("123456".into()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn four_digits_is_rf_only() {
        let plan = plan_unified("0420").unwrap();
        assert_eq!(plan.rf.as_deref(), Some("0420"));
        assert_eq!(plan.name, None);
    }

    #[test]
    fn short_digits_search_name() {
        let plan = plan_unified("12").unwrap();
        assert_eq!(plan.name.as_deref(), Some("12"));
        assert_eq!((plan.cpf, plan.ra, plan.rf), (None, None, None));
    }

    #[test]
    fn digits_inside_text_still_drive_lookups() {
        let plan = plan_unified("abc1234").unwrap();
        assert_eq!(plan.rf.as_deref(), Some("1234"));
        assert_eq!(plan.name.as_deref(), Some("abc1234"));

        let plan = plan_unified("Ana 1234").unwrap();
        assert_eq!(plan.rf.as_deref(), Some("1234"));
        assert_eq!(plan.name.as_deref(), Some("Ana 1234"));

        let plan = plan_unified("RA: 123456").unwrap();
        assert_eq!(plan.ra.as_deref(), Some("123456"));
        assert_eq!(plan.name.as_deref(), Some("RA: 123456"));
    }

    #[test]
    fn text_without_digits_is_name_only() {
        let plan = plan_unified("Maria").unwrap();
        assert_eq!((plan.cpf, plan.ra, plan.rf), (None, None, None));
        assert_eq!(plan.name.as_deref(), Some("Maria"));
    }

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("Ana"), "Ana");
    }
}
