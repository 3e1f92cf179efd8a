//! Pure validation rules for catalog writes.
//!
//! These are the checks that do not need to see the database; the
//! orchestrator in the parent module runs them alongside the query-backed
//! checks before committing a write.

use crate::{
    api::models::programs::{ProgramCategory, ProgramStatus},
    errors::Error,
};

/// An XSeries program cannot be active without a marketing slug.
pub fn check_active_xseries_has_slug(
    category: ProgramCategory,
    status: ProgramStatus,
    marketing_slug: Option<&str>,
) -> Result<(), Error> {
    let slug_missing = marketing_slug.is_none_or(str::is_empty);
    if category == ProgramCategory::XSeries && status == ProgramStatus::Active && slug_missing {
        return Err(Error::Validation {
            message: "Active XSeries programs must have a marketing slug.".to_string(),
        });
    }
    Ok(())
}

/// Next curriculum position for a program: one past the highest ever
/// allocated, starting at 1.
pub fn next_position(max_position: Option<i32>) -> i32 {
    max_position.unwrap_or(0) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_xseries_requires_a_slug() {
        for slug in [None, Some("")] {
            let err =
                check_active_xseries_has_slug(ProgramCategory::XSeries, ProgramStatus::Active, slug).unwrap_err();
            assert!(matches!(err, Error::Validation { .. }));
        }

        check_active_xseries_has_slug(ProgramCategory::XSeries, ProgramStatus::Active, Some("xseries-demo")).unwrap();
    }

    #[test]
    fn slug_rule_only_binds_active_xseries() {
        // inactive XSeries and active MicroMasters are fine without a slug
        check_active_xseries_has_slug(ProgramCategory::XSeries, ProgramStatus::Unpublished, None).unwrap();
        check_active_xseries_has_slug(ProgramCategory::XSeries, ProgramStatus::Retired, None).unwrap();
        check_active_xseries_has_slug(ProgramCategory::MicroMasters, ProgramStatus::Active, None).unwrap();
    }

    #[test]
    fn positions_start_at_one_and_grow_densely() {
        assert_eq!(next_position(None), 1);
        assert_eq!(next_position(Some(1)), 2);
        assert_eq!(next_position(Some(7)), 8);
    }
}
