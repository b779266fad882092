//! Errors raised while building a bulletin.

use std::fmt;

use thiserror::Error;

use crate::store::StoreError;
use crate::template::TemplateError;
use crate::value::ValueError;

/// Where in an outline a piece of text lives. Indices are 1-based for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextLocation {
    SectionTitle { section: usize },
    Line { section: usize, title: String, line: usize },
    BenedictionSong,
}

impl fmt::Display for TextLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextLocation::SectionTitle { section } => write!(f, "title of section {section}"),
            TextLocation::Line {
                section,
                title,
                line,
            } => write!(f, "section {section} \"{title}\", line {line}"),
            TextLocation::BenedictionSong => f.write_str("benediction song"),
        }
    }
}

/// Errors that abort a bulletin build.
#[derive(Debug, Error)]
pub enum BulletinError {
    #[error("no bulletin parameters found for service date {service_date}")]
    ParametersNotFound { service_date: String },
    #[error("invalid bulletin parameters for service date {service_date}: {source}")]
    InvalidRecord {
        service_date: String,
        #[source]
        source: ValueError,
    },
    #[error(transparent)]
    Value(#[from] ValueError),
    #[error("service '{service}' is not listed in oow_id (configured: {available})")]
    ServiceNotConfigured { service: String, available: String },
    #[error("order of worship '{outline_id}' not found")]
    OutlineNotFound { outline_id: String },
    #[error("invalid order of worship '{outline_id}': {source}")]
    InvalidOutline {
        outline_id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("order of worship '{outline_id}', {location}: {source}")]
    Template {
        outline_id: String,
        location: TextLocation,
        #[source]
        source: TemplateError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_errors_name_the_outline_location_and_key() {
        let err = BulletinError::Template {
            outline_id: "am-standard".to_string(),
            location: TextLocation::Line {
                section: 2,
                title: "GOD CALLS HIS PEOPLE TO WORSHIP".to_string(),
                line: 1,
            },
            source: TemplateError::MissingKey {
                key: "call_to_worship_verse".to_string(),
            },
        };
        let message = err.to_string();
        assert!(message.contains("am-standard"));
        assert!(message.contains("section 2 \"GOD CALLS HIS PEOPLE TO WORSHIP\", line 1"));
        assert!(message.contains("call_to_worship_verse"));
    }

    #[test]
    fn not_found_errors_name_what_is_missing() {
        let params = BulletinError::ParametersNotFound {
            service_date: "2023-08-20".to_string(),
        };
        assert_eq!(
            params.to_string(),
            "no bulletin parameters found for service date 2023-08-20"
        );

        let outline = BulletinError::OutlineNotFound {
            outline_id: "pm-lords-supper".to_string(),
        };
        assert_eq!(outline.to_string(), "order of worship 'pm-lords-supper' not found");
    }
}
