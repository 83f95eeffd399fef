//! Output identifier assignment.
//!
//! Every written item gets a unique, filesystem-safe uid derived from its
//! slug (or title), optionally prefixed with its publication date. Uids are
//! disambiguated per namespace so posts and pages cannot shadow each other.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use tracing::warn;

use crate::domain::Item;

/// Namespace -> wp_id -> assigned uid.
///
/// Owned by the exporter and constructed fresh for every run; grows
/// monotonically while the run lasts.
#[derive(Debug, Default)]
pub struct UidTable {
    namespaces: HashMap<String, HashMap<String, String>>,
}

impl UidTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a previously assigned uid
    pub fn get(&self, namespace: &str, wp_id: &str) -> Option<&str> {
        self.namespaces
            .get(namespace)?
            .get(wp_id)
            .map(String::as_str)
    }

    /// Assign a uid for `item` within `namespace`.
    ///
    /// Idempotent per (namespace, wp_id): a second call returns the uid the
    /// first call produced. Collisions with uids already assigned to other
    /// items in the same namespace resolve by appending `_2`, `_3`, ...
    pub fn assign(
        &mut self,
        item: &Item,
        namespace: &str,
        date_prefix: bool,
        date_format: &str,
    ) -> String {
        let table = self.namespaces.entry(namespace.to_string()).or_default();

        if let Some(uid) = table.get(&item.wp_id) {
            return uid.clone();
        }

        let mut base = String::new();
        if date_prefix {
            let date = parse_item_date(item, date_format);
            base.push_str(&date.format("%Y-%m-%d").to_string());
            base.push('-');
        }
        base.push_str(&slugify(item));

        // Probe against the values already handed out in this namespace,
        // not the wp_id keys.
        let mut uid = base.clone();
        let mut n = 1u32;
        while table.values().any(|assigned| assigned == &uid) {
            n += 1;
            uid = format!("{}_{}", base, n);
        }

        table.insert(item.wp_id.clone(), uid.clone());
        uid
    }
}

/// Derive the filesystem-safe slug portion of a uid
fn slugify(item: &Item) -> String {
    let raw = item
        .slug
        .as_deref()
        .filter(|s| !s.is_empty())
        .or_else(|| item.title.as_deref().filter(|s| !s.is_empty()))
        .unwrap_or("untitled");

    raw.replace(' ', "_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// Parse an item's date, falling back to today on failure
fn parse_item_date(item: &Item, date_format: &str) -> NaiveDate {
    item_datetime(item, date_format).date()
}

/// Parse an item's full timestamp with the configured format, falling back
/// to "now" with a warning when the value is malformed or absent
pub(crate) fn item_datetime(item: &Item, date_format: &str) -> NaiveDateTime {
    let raw = item.date.as_deref().unwrap_or("");
    match NaiveDateTime::parse_from_str(raw, date_format) {
        Ok(dt) => dt,
        Err(_) => {
            warn!(
                title = item.title.as_deref().unwrap_or("<untitled>"),
                date = raw,
                "cannot parse item date, using now"
            );
            Utc::now().naive_utc()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATE_FMT: &str = "%Y-%m-%d %H:%M:%S";

    fn item(wp_id: &str, slug: Option<&str>, title: Option<&str>) -> Item {
        Item {
            wp_id: wp_id.to_string(),
            slug: slug.map(String::from),
            title: title.map(String::from),
            date: Some("2020-01-05 10:00:00".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_date_prefixed_uid() {
        let mut uids = UidTable::new();
        let uid = uids.assign(&item("1", Some("Hello World!"), None), "", true, DATE_FMT);
        assert_eq!(uid, "2020-01-05-Hello_World");
    }

    #[test]
    fn test_assignment_is_idempotent() {
        let mut uids = UidTable::new();
        let it = item("1", Some("foo"), None);

        let first = uids.assign(&it, "", false, DATE_FMT);
        let second = uids.assign(&it, "", false, DATE_FMT);
        assert_eq!(first, second);
        assert_eq!(uids.get("", "1"), Some("foo"));
    }

    #[test]
    fn test_collision_suffixing() {
        let mut uids = UidTable::new();
        let a = uids.assign(&item("1", Some("foo"), None), "", false, DATE_FMT);
        let b = uids.assign(&item("2", Some("foo"), None), "", false, DATE_FMT);
        let c = uids.assign(&item("3", Some("foo"), None), "", false, DATE_FMT);

        assert_eq!(a, "foo");
        assert_eq!(b, "foo_2");
        assert_eq!(c, "foo_3");
    }

    #[test]
    fn test_assignment_is_injective() {
        let mut uids = UidTable::new();
        let mut seen = std::collections::HashSet::new();

        for (wp_id, slug) in [("1", "a"), ("2", "a"), ("3", "a b"), ("4", "ab"), ("5", "a_b")] {
            let uid = uids.assign(&item(wp_id, Some(slug), None), "", false, DATE_FMT);
            assert!(seen.insert(uid), "uid assigned twice");
        }
    }

    #[test]
    fn test_namespaces_are_independent() {
        let mut uids = UidTable::new();
        let a = uids.assign(&item("1", Some("foo"), None), "", false, DATE_FMT);
        let b = uids.assign(&item("2", Some("foo"), None), "page", false, DATE_FMT);

        // Same base uid, different namespaces: no suffix needed
        assert_eq!(a, "foo");
        assert_eq!(b, "foo");
    }

    #[test]
    fn test_title_and_untitled_fallbacks() {
        let mut uids = UidTable::new();

        let from_title = uids.assign(&item("1", None, Some("My Title")), "", false, DATE_FMT);
        assert_eq!(from_title, "My_Title");

        let from_empty = uids.assign(&item("2", Some(""), None), "", false, DATE_FMT);
        assert_eq!(from_empty, "untitled");
    }

    #[test]
    fn test_bad_date_falls_back_to_today() {
        let mut uids = UidTable::new();
        let mut it = item("1", Some("foo"), None);
        it.date = Some("not a date".to_string());

        let uid = uids.assign(&it, "", true, DATE_FMT);
        let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
        assert_eq!(uid, format!("{}-foo", today));
    }
}
