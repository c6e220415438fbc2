use folio_types::{Availability, ChangeSet, FileIdentity, SortOrder, VisibleItem};
use std::time::{Duration, SystemTime};

fn item(path: &str, size: u64) -> VisibleItem {
    VisibleItem {
        identity: FileIdentity::new(path),
        size,
        modified: SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000),
        availability: Availability::UpToDate,
        downloading: false,
        has_conflicts: false,
    }
}

// ── Diff classification ──────────────────────────────────────────

#[test]
fn diff_of_identical_snapshots_is_empty() {
    let previous = vec![item("/d/a.note", 10), item("/d/b.note", 20)];
    let current = previous.clone();

    let changes = ChangeSet::diff(&previous, &current);
    assert!(changes.is_empty());
    assert_eq!(changes.len(), 0);
}

#[test]
fn new_identity_classifies_as_inserted() {
    let previous = vec![item("/d/a.note", 10)];
    let current = vec![item("/d/a.note", 10), item("/d/b.note", 20)];

    let changes = ChangeSet::diff(&previous, &current);
    assert_eq!(changes.inserted, vec![FileIdentity::new("/d/b.note")]);
    assert!(changes.updated.is_empty());
    assert!(changes.removed.is_empty());
}

#[test]
fn missing_identity_classifies_as_removed() {
    let previous = vec![item("/d/a.note", 10), item("/d/b.note", 20)];
    let current = vec![item("/d/a.note", 10)];

    let changes = ChangeSet::diff(&previous, &current);
    assert_eq!(changes.removed, vec![FileIdentity::new("/d/b.note")]);
    assert!(changes.inserted.is_empty());
    assert!(changes.updated.is_empty());
}

#[test]
fn changed_snapshot_classifies_as_updated_not_insert_plus_remove() {
    let previous = vec![item("/d/a.note", 10)];
    let current = vec![item("/d/a.note", 99)];

    let changes = ChangeSet::diff(&previous, &current);
    assert!(changes.inserted.is_empty());
    assert!(changes.removed.is_empty());
    assert_eq!(changes.updated, vec![FileIdentity::new("/d/a.note")]);
}

#[test]
fn availability_change_alone_is_an_update() {
    let previous = vec![item("/d/a.note", 10)];
    let mut changed = item("/d/a.note", 10);
    changed.availability = Availability::Outdated;

    let changes = ChangeSet::diff(&previous, &[changed]);
    assert_eq!(changes.updated, vec![FileIdentity::new("/d/a.note")]);
}

#[test]
fn mixed_diff_partitions_correctly() {
    let previous = vec![
        item("/d/stays.note", 1),
        item("/d/grows.note", 2),
        item("/d/goes.note", 3),
    ];
    let current = vec![
        item("/d/stays.note", 1),
        item("/d/grows.note", 22),
        item("/d/arrives.note", 4),
    ];

    let changes = ChangeSet::diff(&previous, &current);
    assert_eq!(changes.inserted, vec![FileIdentity::new("/d/arrives.note")]);
    assert_eq!(changes.updated, vec![FileIdentity::new("/d/grows.note")]);
    assert_eq!(changes.removed, vec![FileIdentity::new("/d/goes.note")]);
    assert_eq!(changes.len(), 3);
}

#[test]
fn diff_from_empty_previous_inserts_everything() {
    let current = vec![item("/d/a.note", 1), item("/d/b.note", 2)];
    let changes = ChangeSet::diff(&[], &current);
    assert_eq!(changes.inserted.len(), 2);
    assert!(!changes.is_empty());
}

// ── Retain ───────────────────────────────────────────────────────

#[test]
fn retain_drops_filtered_identities_from_every_partition() {
    let previous = vec![item("/d/gone.note", 1), item("/d/edit.note", 2)];
    let current = vec![item("/d/edit.note", 22), item("/d/new.note", 3)];

    let muted = FileIdentity::new("/d/edit.note");
    let changes = ChangeSet::diff(&previous, &current).retain(|identity| *identity != muted);

    assert_eq!(changes.inserted, vec![FileIdentity::new("/d/new.note")]);
    assert!(changes.updated.is_empty());
    assert_eq!(changes.removed, vec![FileIdentity::new("/d/gone.note")]);
}

#[test]
fn retain_can_empty_a_change_set() {
    let current = vec![item("/d/a.note", 1)];
    let changes = ChangeSet::diff(&[], &current).retain(|_| false);
    assert!(changes.is_empty());
}

// ── Snapshot helpers ─────────────────────────────────────────────

#[test]
fn visibility_follows_availability() {
    let mut snapshot = item("/d/a.note", 1);
    assert!(snapshot.is_visible());

    snapshot.availability = Availability::Outdated;
    assert!(snapshot.is_visible());

    snapshot.availability = Availability::NotAvailable;
    assert!(!snapshot.is_visible());
}

#[test]
fn download_needed_unless_up_to_date_or_in_flight() {
    let mut snapshot = item("/d/a.note", 1);
    assert!(!snapshot.needs_download());

    snapshot.availability = Availability::Outdated;
    assert!(snapshot.needs_download());

    snapshot.downloading = true;
    assert!(!snapshot.needs_download());

    snapshot.availability = Availability::NotAvailable;
    snapshot.downloading = false;
    assert!(snapshot.needs_download());
}

// ── Sort order ───────────────────────────────────────────────────

#[test]
fn sort_order_applies_direction() {
    use std::cmp::Ordering;
    assert_eq!(SortOrder::Ascending.apply(Ordering::Less), Ordering::Less);
    assert_eq!(SortOrder::Descending.apply(Ordering::Less), Ordering::Greater);
    assert_eq!(SortOrder::Descending.apply(Ordering::Equal), Ordering::Equal);
}

#[test]
fn visible_item_serde_roundtrip() {
    let snapshot = item("/d/a.note", 42);
    let json = serde_json::to_string(&snapshot).unwrap();
    let parsed: VisibleItem = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, snapshot);
}
