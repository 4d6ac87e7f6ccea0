//! Filter predicate of the ordered list.

use crate::model::record::RecordId;
use crate::model::wrapper::{ExpiryStatus, RecordWrapper};
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;

/// Record subset shown by the views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    #[default]
    All,
    Favourites,
    /// Expired records and records expiring within the scope window.
    Expiring,
    Expired,
}

/// Pure predicate over (record, filter mode, find text, favourites).
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    mode: FilterMode,
    find_text: Option<String>,
    matcher: Option<Regex>,
    favourites: HashSet<RecordId>,
}

impl RecordFilter {
    pub fn new(
        mode: FilterMode,
        find_text: Option<&str>,
        favourites: impl IntoIterator<Item = RecordId>,
    ) -> Self {
        let find_text = find_text
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);
        // Escaped literal, so the build only fails on pathological sizes.
        let matcher = find_text.as_deref().and_then(|text| {
            RegexBuilder::new(&regex::escape(text))
                .case_insensitive(true)
                .build()
                .ok()
        });
        Self {
            mode,
            find_text,
            matcher,
            favourites: favourites.into_iter().collect(),
        }
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn find_text(&self) -> Option<&str> {
        self.find_text.as_deref()
    }

    /// Whether any restriction is active.
    pub fn is_active(&self) -> bool {
        self.mode != FilterMode::All || self.find_text.is_some()
    }

    pub fn accepts(&self, wrapper: &RecordWrapper) -> bool {
        let mode_ok = match self.mode {
            FilterMode::All => true,
            FilterMode::Favourites => self.favourites.contains(&wrapper.id()),
            FilterMode::Expiring => wrapper.expiry() != ExpiryStatus::Valid,
            FilterMode::Expired => wrapper.expiry() == ExpiryStatus::Expired,
        };
        mode_ok && self.matches_find_text(wrapper)
    }

    fn matches_find_text(&self, wrapper: &RecordWrapper) -> bool {
        let Some(text) = self.find_text.as_deref() else {
            return true;
        };
        let record = wrapper.record();
        let fields = [
            Some(record.title.as_str()),
            record.group.as_deref(),
            record.username.as_deref(),
            record.notes.as_deref(),
            record.url.as_deref(),
        ];
        match self.matcher.as_ref() {
            Some(matcher) => fields.into_iter().flatten().any(|field| matcher.is_match(field)),
            None => {
                let needle = text.to_lowercase();
                fields
                    .into_iter()
                    .flatten()
                    .any(|field| field.to_lowercase().contains(&needle))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FilterMode, RecordFilter};
    use crate::model::record::PwsRecord;
    use crate::model::wrapper::{ExpiryStatus, RecordWrapper, SortField};

    fn wrap(record: PwsRecord, expiry: ExpiryStatus) -> RecordWrapper {
        RecordWrapper::new(record, SortField::Title, expiry)
    }

    #[test]
    fn find_text_is_case_insensitive_literal() {
        let mut record = PwsRecord::new("Bank (main)");
        record.url = Some("https://bank.example".to_string());
        let wrapper = wrap(record, ExpiryStatus::Valid);

        assert!(RecordFilter::new(FilterMode::All, Some("BANK ("), []).accepts(&wrapper));
        assert!(RecordFilter::new(FilterMode::All, Some("example"), []).accepts(&wrapper));
        assert!(!RecordFilter::new(FilterMode::All, Some("b.nk"), []).accepts(&wrapper));
    }

    #[test]
    fn favourites_mode_requires_membership() {
        let record = PwsRecord::new("Mail");
        let id = record.uuid;
        let wrapper = wrap(record, ExpiryStatus::Valid);

        assert!(!RecordFilter::new(FilterMode::Favourites, None, []).accepts(&wrapper));
        assert!(RecordFilter::new(FilterMode::Favourites, None, [id]).accepts(&wrapper));
    }

    #[test]
    fn expiry_modes_select_by_status() {
        let expiring = wrap(PwsRecord::new("a"), ExpiryStatus::Expiring);
        let expired = wrap(PwsRecord::new("b"), ExpiryStatus::Expired);
        let valid = wrap(PwsRecord::new("c"), ExpiryStatus::Valid);

        let filter = RecordFilter::new(FilterMode::Expiring, None, []);
        assert!(filter.accepts(&expiring) && filter.accepts(&expired) && !filter.accepts(&valid));

        let filter = RecordFilter::new(FilterMode::Expired, None, []);
        assert!(!filter.accepts(&expiring) && filter.accepts(&expired));
    }

    #[test]
    fn blank_find_text_is_inactive() {
        let filter = RecordFilter::new(FilterMode::All, Some("   "), []);
        assert!(!filter.is_active());
        assert_eq!(filter.find_text(), None);
    }
}
