//! Bulletin parameter store: service date to [`ParameterSet`].

use serde::Serialize;
use tracing::{debug, info};

use crate::error::BulletinError;
use crate::store::{KeyValueStore, Table};
use crate::value::{ParamValue, ParameterSet, ValueError, ValueShape};

pub const COFFEE_SNACK_SCHEDULE: &str = "coffee_snack_schedule";
pub const MIDWEEK_THEME_SCHEDULE: &str = "midweek_theme_schedule";

/// The "this week" / "next week" cells of a rotating schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Schedule {
    pub this_week: String,
    pub next_week: String,
}

impl Schedule {
    pub fn new(this_week: impl Into<String>, next_week: impl Into<String>) -> Self {
        Self {
            this_week: this_week.into(),
            next_week: next_week.into(),
        }
    }

    /// Always exactly two cells: missing entries become empty strings and
    /// anything past the second entry is ignored.
    pub fn from_entries(entries: &[String]) -> Self {
        let mut cells = entries.iter().cloned();
        Self {
            this_week: cells.next().unwrap_or_default(),
            next_week: cells.next().unwrap_or_default(),
        }
    }

    pub fn as_pair(&self) -> (&str, &str) {
        (&self.this_week, &self.next_week)
    }
}

/// Reads parameter records from an injected [`KeyValueStore`].
#[derive(Debug, Clone)]
pub struct ParameterStore<S> {
    store: S,
}

impl<S: KeyValueStore> ParameterStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Load every parameter for `service_date`.
    ///
    /// A date with no record is [`BulletinError::ParametersNotFound`]; an empty
    /// set is never returned in its place.
    pub fn get_parameters(&self, service_date: &str) -> Result<ParameterSet, BulletinError> {
        let record = self
            .store
            .get(Table::BulletinParams, service_date)?
            .ok_or_else(|| BulletinError::ParametersNotFound {
                service_date: service_date.to_string(),
            })?;

        let params = ParameterSet::from_record(service_date, record).map_err(|source| {
            BulletinError::InvalidRecord {
                service_date: service_date.to_string(),
                source,
            }
        })?;
        info!(service_date, parameters = params.len(), "Loaded bulletin parameters");
        Ok(params)
    }

    /// Normalize the schedule stored under `schedule_name` into two cells.
    pub fn get_schedule(
        &self,
        params: &ParameterSet,
        schedule_name: &str,
    ) -> Result<Schedule, BulletinError> {
        schedule_from(params, schedule_name)
    }
}

/// Store-free form of [`ParameterStore::get_schedule`].
///
/// An absent key reads as an empty schedule. A key holding anything other
/// than a list is a shape error.
pub fn schedule_from(params: &ParameterSet, schedule_name: &str) -> Result<Schedule, BulletinError> {
    match params.get(schedule_name) {
        None => {
            debug!(schedule = schedule_name, "Schedule not set; using blank cells");
            Ok(Schedule::default())
        }
        Some(ParamValue::List(entries)) => Ok(Schedule::from_entries(entries)),
        Some(other) => Err(ValueError::ShapeMismatch {
            key: schedule_name.to_string(),
            expected: ValueShape::List,
            found: other.shape(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn store() -> MemoryStore {
        MemoryStore::new().with(
            Table::BulletinParams,
            "2023-08-20",
            json!({
                "date": "August 20th, 2023",
                "coffee_snack_schedule": ["Swayze & Monroe", "Spencley & Howell"],
                "midweek_theme_schedule": ["Fall Favourites"],
                "empty_schedule": [],
                "long_schedule": ["X", "Y", "Z"],
                "preacher": "Rev. Smith"
            }),
        )
    }

    #[test]
    fn loads_parameters_for_known_date() {
        let params = ParameterStore::new(store())
            .get_parameters("2023-08-20")
            .expect("parameters");
        assert_eq!(params.scalar("date").unwrap(), "August 20th, 2023");
        assert_eq!(params.service_date(), "2023-08-20");
    }

    #[test]
    fn unknown_date_is_not_found() {
        let err = ParameterStore::new(store())
            .get_parameters("2023-08-27")
            .unwrap_err();
        assert!(matches!(
            err,
            BulletinError::ParametersNotFound { ref service_date } if service_date == "2023-08-27"
        ));
    }

    #[test]
    fn malformed_record_is_invalid_not_empty() {
        let store = MemoryStore::new().with(Table::BulletinParams, "2023-08-20", json!("oops"));
        let err = ParameterStore::new(store)
            .get_parameters("2023-08-20")
            .unwrap_err();
        assert!(matches!(err, BulletinError::InvalidRecord { .. }));
    }

    #[test]
    fn schedules_are_normalized_to_two_cells() {
        let parameter_store = ParameterStore::new(store());
        let params = parameter_store.get_parameters("2023-08-20").unwrap();

        let empty = parameter_store.get_schedule(&params, "empty_schedule").unwrap();
        assert_eq!(empty.as_pair(), ("", ""));

        let single = parameter_store
            .get_schedule(&params, MIDWEEK_THEME_SCHEDULE)
            .unwrap();
        assert_eq!(single.as_pair(), ("Fall Favourites", ""));

        let long = parameter_store.get_schedule(&params, "long_schedule").unwrap();
        assert_eq!(long.as_pair(), ("X", "Y"));

        let pair = parameter_store
            .get_schedule(&params, COFFEE_SNACK_SCHEDULE)
            .unwrap();
        assert_eq!(pair, Schedule::new("Swayze & Monroe", "Spencley & Howell"));
    }

    #[test]
    fn absent_schedule_is_blank_and_scalar_schedule_is_rejected() {
        let parameter_store = ParameterStore::new(store());
        let params = parameter_store.get_parameters("2023-08-20").unwrap();

        let absent = parameter_store.get_schedule(&params, "nursery_schedule").unwrap();
        assert_eq!(absent, Schedule::default());

        let err = parameter_store.get_schedule(&params, "preacher").unwrap_err();
        assert!(matches!(
            err,
            BulletinError::Value(ValueError::ShapeMismatch {
                found: ValueShape::Scalar,
                ..
            })
        ));
    }
}
