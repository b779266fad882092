//! Order-of-worship resolution.
//!
//! A service id ("morning", "evening") is mapped through the parameter set's
//! `oow_id` table to a stored outline id, the skeleton is fetched, and every
//! piece of text in it is rendered against the same parameter set. The result
//! is a fresh outline; the stored skeleton is never modified.

use tracing::{debug, info};

use crate::error::{BulletinError, TextLocation};
use crate::outline::{LineItem, Section, ServiceOutline};
use crate::store::{KeyValueStore, Table};
use crate::template;
use crate::value::ParameterSet;

/// Parameter key holding the service id to outline id table.
pub const OOW_ID_KEY: &str = "oow_id";

/// Outcome of resolving one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutlineResolution {
    /// The parameter set has no `oow_id`, so the date has no liturgy.
    NotConfigured,
    Resolved {
        outline_id: String,
        outline: ServiceOutline,
    },
}

impl OutlineResolution {
    pub fn is_configured(&self) -> bool {
        matches!(self, OutlineResolution::Resolved { .. })
    }

    pub fn outline_id(&self) -> Option<&str> {
        match self {
            OutlineResolution::Resolved { outline_id, .. } => Some(outline_id),
            OutlineResolution::NotConfigured => None,
        }
    }

    /// The resolved outline, or an empty one when nothing is configured.
    pub fn into_outline(self) -> ServiceOutline {
        match self {
            OutlineResolution::Resolved { outline, .. } => outline,
            OutlineResolution::NotConfigured => ServiceOutline::empty(),
        }
    }
}

/// Resolves service outlines from an injected [`KeyValueStore`].
#[derive(Debug, Clone)]
pub struct OutlineResolver<S> {
    store: S,
}

impl<S: KeyValueStore> OutlineResolver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Resolve the outline for `service_id` against `params`.
    ///
    /// Either every placeholder in the outline resolves or the whole call
    /// fails; a partially substituted outline is never returned.
    pub fn resolve(
        &self,
        params: &ParameterSet,
        service_id: &str,
    ) -> Result<OutlineResolution, BulletinError> {
        let Some(outline_id) = lookup_outline_id(params, service_id)? else {
            info!(
                service_date = params.service_date(),
                service = service_id,
                "No oow_id configured; order of worship left empty"
            );
            return Ok(OutlineResolution::NotConfigured);
        };

        let skeleton = self.fetch_skeleton(&outline_id)?;
        let outline = substitute(&skeleton, params, &outline_id)?;
        info!(
            service = service_id,
            outline_id = %outline_id,
            sections = outline.sections.len(),
            lines = outline.line_count(),
            "Resolved order of worship"
        );

        Ok(OutlineResolution::Resolved {
            outline_id,
            outline,
        })
    }

    /// Fetch a stored skeleton without substituting anything.
    pub fn fetch_skeleton(&self, outline_id: &str) -> Result<ServiceOutline, BulletinError> {
        let record = self
            .store
            .get(Table::OrderOfWorship, outline_id)?
            .ok_or_else(|| BulletinError::OutlineNotFound {
                outline_id: outline_id.to_string(),
            })?;
        serde_json::from_value(record).map_err(|source| BulletinError::InvalidOutline {
            outline_id: outline_id.to_string(),
            source,
        })
    }
}

/// Map a service id to its outline id through `oow_id`.
///
/// `Ok(None)` means no `oow_id` at all. A present table without the service
/// is an error, so a typo in the service name cannot silently print a
/// bulletin without its liturgy.
pub fn lookup_outline_id(
    params: &ParameterSet,
    service_id: &str,
) -> Result<Option<String>, BulletinError> {
    if !params.contains_key(OOW_ID_KEY) {
        return Ok(None);
    }
    let table = params.map(OOW_ID_KEY)?;
    match table.get(service_id) {
        Some(outline_id) => Ok(Some(outline_id.clone())),
        None => Err(BulletinError::ServiceNotConfigured {
            service: service_id.to_string(),
            available: table.keys().cloned().collect::<Vec<_>>().join(", "),
        }),
    }
}

/// Render every text field of `skeleton` into a new outline.
pub fn substitute(
    skeleton: &ServiceOutline,
    params: &ParameterSet,
    outline_id: &str,
) -> Result<ServiceOutline, BulletinError> {
    let render = |text: &str, location: TextLocation| {
        template::render(text, params).map_err(|source| BulletinError::Template {
            outline_id: outline_id.to_string(),
            location,
            source,
        })
    };

    let mut sections = Vec::with_capacity(skeleton.sections.len());
    for (section_index, section) in skeleton.sections.iter().enumerate() {
        let number = section_index + 1;
        let title = render(&section.title, TextLocation::SectionTitle { section: number })?;

        let mut items = Vec::with_capacity(section.items.len());
        for (line_index, item) in section.items.iter().enumerate() {
            let text = render(
                &item.text,
                TextLocation::Line {
                    section: number,
                    title: section.title.clone(),
                    line: line_index + 1,
                },
            )?;
            items.push(LineItem {
                text,
                is_footnote: item.is_footnote,
            });
        }
        let placeholders: usize = section
            .items
            .iter()
            .map(|item| template::placeholders(&item.text).len())
            .sum();
        debug!(
            outline_id,
            section = %title,
            lines = items.len(),
            placeholders,
            "Substituted section"
        );
        sections.push(Section { title, items });
    }

    let benediction_song = render(&skeleton.benediction_song, TextLocation::BenedictionSong)?;

    Ok(ServiceOutline {
        benediction_song,
        sections,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::template::TemplateError;
    use serde_json::{Value, json};

    fn skeleton() -> Value {
        json!({
            "benedictionSong": "Doxology",
            "sections": [
                {
                    "title": "BEFORE WORSHIP",
                    "items": [
                        { "text": "Prelude" },
                        { "text": "Silent Prayer", "isFootnote": true }
                    ]
                },
                {
                    "title": "GOD CALLS HIS PEOPLE TO WORSHIP",
                    "items": [
                        { "text": "Call to Worship - {{ call_to_worship_verse }}" },
                        { "text": "*Hymn of Praise - #{{ opening_hymn }}", "isFootnote": true }
                    ]
                }
            ]
        })
    }

    fn params(record: Value) -> ParameterSet {
        ParameterSet::from_record("2023-08-20", record).expect("params")
    }

    fn full_params() -> ParameterSet {
        params(json!({
            "oow_id": { "morning": "am-standard" },
            "call_to_worship_verse": "1 Corinthians 15:42-49",
            "opening_hymn": "382"
        }))
    }

    fn store() -> MemoryStore {
        MemoryStore::new().with(Table::OrderOfWorship, "am-standard", skeleton())
    }

    #[test]
    fn resolves_placeholders_through_oow_id() {
        let resolver = OutlineResolver::new(store());
        let resolution = resolver.resolve(&full_params(), "morning").unwrap();
        assert_eq!(resolution.outline_id(), Some("am-standard"));

        let outline = resolution.into_outline();
        assert_eq!(
            outline.sections[1].items[0].text,
            "Call to Worship - 1 Corinthians 15:42-49"
        );
        assert_eq!(outline.sections[1].items[1].text, "*Hymn of Praise - #382");
        assert_eq!(outline.benediction_song, "Doxology");
        assert!(outline.texts().all(|text| !text.contains("{{")));
    }

    #[test]
    fn footnotes_and_order_survive_substitution() {
        let resolver = OutlineResolver::new(store());
        let skeleton = resolver.fetch_skeleton("am-standard").unwrap();
        let outline = resolver
            .resolve(&full_params(), "morning")
            .unwrap()
            .into_outline();

        assert_eq!(
            outline.section_titles().collect::<Vec<_>>(),
            skeleton.section_titles().collect::<Vec<_>>()
        );
        for (resolved, stored) in outline.sections.iter().zip(&skeleton.sections) {
            assert_eq!(resolved.items.len(), stored.items.len());
            for (line, stored_line) in resolved.items.iter().zip(&stored.items) {
                assert_eq!(line.is_footnote, stored_line.is_footnote);
            }
        }
        assert_eq!(outline.sections[0].items[0].text, "Prelude");
        assert_eq!(outline.sections[0].items[1].text, "Silent Prayer");
    }

    #[test]
    fn stored_skeleton_is_not_modified() {
        let resolver = OutlineResolver::new(store());
        resolver.resolve(&full_params(), "morning").unwrap();
        let skeleton = resolver.fetch_skeleton("am-standard").unwrap();
        assert_eq!(
            skeleton.sections[1].items[0].text,
            "Call to Worship - {{ call_to_worship_verse }}"
        );
    }

    #[test]
    fn missing_oow_id_is_not_configured() {
        let resolver = OutlineResolver::new(store());
        let resolution = resolver
            .resolve(&params(json!({ "opening_hymn": "382" })), "evening")
            .unwrap();
        assert_eq!(resolution, OutlineResolution::NotConfigured);
        assert!(!resolution.is_configured());
        assert!(resolution.into_outline().is_empty());
    }

    #[test]
    fn unknown_service_is_an_error() {
        let resolver = OutlineResolver::new(store());
        let err = resolver.resolve(&full_params(), "evening").unwrap_err();
        assert!(matches!(
            err,
            BulletinError::ServiceNotConfigured { ref service, ref available }
                if service == "evening" && available == "morning"
        ));
    }

    #[test]
    fn missing_outline_is_named() {
        let resolver = OutlineResolver::new(MemoryStore::new());
        let err = resolver.resolve(&full_params(), "morning").unwrap_err();
        assert!(matches!(
            err,
            BulletinError::OutlineNotFound { ref outline_id } if outline_id == "am-standard"
        ));
    }

    #[test]
    fn missing_placeholder_fails_the_whole_outline() {
        let resolver = OutlineResolver::new(store());
        let params = params(json!({
            "oow_id": { "morning": "am-standard" },
            "call_to_worship_verse": "1 Corinthians 15:42-49"
        }));
        let err = resolver.resolve(&params, "morning").unwrap_err();
        match err {
            BulletinError::Template {
                outline_id,
                location,
                source,
            } => {
                assert_eq!(outline_id, "am-standard");
                assert_eq!(
                    location,
                    TextLocation::Line {
                        section: 2,
                        title: "GOD CALLS HIS PEOPLE TO WORSHIP".to_string(),
                        line: 2,
                    }
                );
                assert_eq!(
                    source,
                    TemplateError::MissingKey {
                        key: "opening_hymn".to_string()
                    }
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn placeholder_text_in_a_parameter_is_rejected() {
        let resolver = OutlineResolver::new(store());
        let params = params(json!({
            "oow_id": { "morning": "am-standard" },
            "call_to_worship_verse": "{{ typo }}",
            "opening_hymn": "382"
        }));
        let err = resolver.resolve(&params, "morning").unwrap_err();
        assert!(matches!(
            err,
            BulletinError::Template {
                source: TemplateError::BraceInValue { ref key },
                ..
            } if key == "call_to_worship_verse"
        ));
    }

    #[test]
    fn oow_id_must_be_a_map() {
        let resolver = OutlineResolver::new(store());
        let err = resolver
            .resolve(&params(json!({ "oow_id": "am-standard" })), "morning")
            .unwrap_err();
        assert!(matches!(err, BulletinError::Value(_)));
    }

    #[test]
    fn malformed_skeleton_is_reported() {
        let store = MemoryStore::new().with(
            Table::OrderOfWorship,
            "am-standard",
            json!({ "sections": "not a list" }),
        );
        let err = OutlineResolver::new(store)
            .resolve(&full_params(), "morning")
            .unwrap_err();
        assert!(matches!(err, BulletinError::InvalidOutline { .. }));
    }
}
