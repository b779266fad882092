//! Bulletin assembly: parameters and resolved outlines into a [`Document`].

use tracing::info;

use crate::document::{Block, Document};
use crate::error::BulletinError;
use crate::outline::ServiceOutline;
use crate::params::{COFFEE_SNACK_SCHEDULE, MIDWEEK_THEME_SCHEDULE, ParameterStore};
use crate::resolver::{OutlineResolution, OutlineResolver};
use crate::schedule::{display_date, parse_service_date};
use crate::store::KeyValueStore;
use crate::value::ParameterSet;

pub const ANNOUNCEMENTS_KEY: &str = "announcements";
pub const BULLETIN_DATE_KEY: &str = "bulletin_date";
pub const WELCOME_MESSAGE_KEY: &str = "welcome_message";
pub const CHURCH_NAME_KEY: &str = "church_name";

pub const DEFAULT_WELCOME_MESSAGE: &str = "Welcome to the holy service of worship to the Triune God of Creation and Redemption. It is a great privilege to gather to worship the King of kings. If you are visiting with us, we warmly welcome you, and look forward to getting to know you better in our fellowship time after worship. May God\u{2019}s high feast day be a delight to your soul as you commune with Him in worship!";

/// Schedules printed on the front page, as (parameter key, table title).
const SCHEDULES: [(&str, &str); 2] = [
    (COFFEE_SNACK_SCHEDULE, "Coffee & Snack"),
    (MIDWEEK_THEME_SCHEDULE, "Midweek Theme"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Services to print, in order.
    pub services: Vec<String>,
    pub title: String,
    pub welcome_message: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            services: vec!["morning".to_string(), "evening".to_string()],
            title: "Weekly Bulletin".to_string(),
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
        }
    }
}

/// Builds one bulletin per call from an injected store.
#[derive(Debug, Clone)]
pub struct BulletinBuilder<S> {
    params: ParameterStore<S>,
    resolver: OutlineResolver<S>,
    options: BuildOptions,
}

impl<S: KeyValueStore + Clone> BulletinBuilder<S> {
    pub fn new(store: S, options: BuildOptions) -> Self {
        Self {
            params: ParameterStore::new(store.clone()),
            resolver: OutlineResolver::new(store),
            options,
        }
    }
}

impl<S: KeyValueStore> BulletinBuilder<S> {
    pub fn parameter_store(&self) -> &ParameterStore<S> {
        &self.params
    }

    pub fn resolver(&self) -> &OutlineResolver<S> {
        &self.resolver
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Build the bulletin for `service_date`.
    ///
    /// Any failure aborts the whole build; no partial document is returned.
    pub fn build(&self, service_date: &str) -> Result<Document, BulletinError> {
        let params = self.params.get_parameters(service_date)?;

        let title = params
            .get(CHURCH_NAME_KEY)
            .and_then(|value| value.as_scalar())
            .unwrap_or(self.options.title.as_str());
        let mut document = Document::new(title, cover_date(&params));

        self.push_front_matter(&mut document, &params)?;

        let mut printed = 0;
        for service in &self.options.services {
            match self.resolver.resolve(&params, service)? {
                OutlineResolution::NotConfigured => continue,
                OutlineResolution::Resolved { outline, .. } => {
                    document.push(Block::FrameBreak);
                    document.blocks.extend(outline_blocks(service, outline));
                    printed += 1;
                }
            }
        }

        info!(
            service_date,
            services = printed,
            blocks = document.blocks.len(),
            "Bulletin assembled"
        );
        Ok(document)
    }

    fn push_front_matter(
        &self,
        document: &mut Document,
        params: &ParameterSet,
    ) -> Result<(), BulletinError> {
        let welcome = match params.get(WELCOME_MESSAGE_KEY) {
            Some(_) => params.scalar(WELCOME_MESSAGE_KEY)?.to_string(),
            None => self.options.welcome_message.clone(),
        };
        document.push(Block::BoxedList {
            title: "WELCOME!".to_string(),
            entries: vec![welcome],
        });

        let announcements = match params.get(ANNOUNCEMENTS_KEY) {
            Some(_) => params.list(ANNOUNCEMENTS_KEY)?.to_vec(),
            None => Vec::new(),
        };
        document.push(Block::BoxedList {
            title: "ANNOUNCEMENTS".to_string(),
            entries: announcements,
        });

        for (key, title) in SCHEDULES {
            let schedule = self.params.get_schedule(params, key)?;
            document.push(Block::ScheduleTable {
                title: title.to_string(),
                this_week: schedule.this_week,
                next_week: schedule.next_week,
            });
        }
        Ok(())
    }
}

/// Blocks for one resolved service: a heading, each section with its lines in
/// stored order, then the benediction song.
pub fn outline_blocks(service: &str, outline: ServiceOutline) -> Vec<Block> {
    let mut blocks = vec![Block::heading(
        format!("ORDER OF WORSHIP - {}", service.to_uppercase()),
        1,
    )];
    for section in outline.sections {
        blocks.push(Block::heading(section.title, 2));
        blocks.extend(section.items.into_iter().map(|item| Block::LineItem {
            text: item.text,
            footnote: item.is_footnote,
        }));
    }
    if !outline.benediction_song.is_empty() {
        blocks.push(Block::heading("BENEDICTION SONG", 2));
        blocks.push(Block::paragraph(outline.benediction_song));
    }
    blocks
}

/// `bulletin_date` when set, else the service date spelled out, else the raw key.
fn cover_date(params: &ParameterSet) -> String {
    if let Some(date) = params
        .get(BULLETIN_DATE_KEY)
        .and_then(|value| value.as_scalar())
    {
        return date.to_string();
    }
    match parse_service_date(params.service_date()) {
        Some(date) => display_date(date),
        None => params.service_date().to_string(),
    }
}
