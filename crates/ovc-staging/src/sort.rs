//! Sorting of the staged result set.
//!
//! Each [`SortField`] maps to a comparator through [`comparator`]. String
//! fields compare ordinally (byte order, so uppercase sorts before
//! lowercase); time fields compare as instants with missing or unparsable
//! values first. Sorting is stable in both directions.

use std::cmp::Ordering;

use ovc_core::{ManagedObject, SortField, SortSpec};
use tracing::debug;

/// Orders two objects by one field, ascending.
pub type Comparator = fn(&ManagedObject, &ManagedObject) -> Ordering;

fn by_name(a: &ManagedObject, b: &ManagedObject) -> Ordering {
    a.name.as_bytes().cmp(b.name.as_bytes())
}

fn by_type(a: &ManagedObject, b: &ManagedObject) -> Ordering {
    a.object_type
        .as_catalog_str()
        .as_bytes()
        .cmp(b.object_type.as_catalog_str().as_bytes())
}

fn by_status(a: &ManagedObject, b: &ManagedObject) -> Ordering {
    a.status.sort_key().cmp(b.status.sort_key())
}

fn by_user(a: &ManagedObject, b: &ManagedObject) -> Ordering {
    a.held_by.as_bytes().cmp(b.held_by.as_bytes())
}

// `None` orders before any `Some`, which puts missing instants first.
fn by_checkout_time(a: &ManagedObject, b: &ManagedObject) -> Ordering {
    a.checkout_at.cmp(&b.checkout_at)
}

fn by_checkin_time(a: &ManagedObject, b: &ManagedObject) -> Ordering {
    a.checkin_at.cmp(&b.checkin_at)
}

/// Comparator table.
pub fn comparator(field: SortField) -> Comparator {
    match field {
        SortField::Name => by_name,
        SortField::Type => by_type,
        SortField::Status => by_status,
        SortField::User => by_user,
        SortField::CheckoutTime => by_checkout_time,
        SortField::CheckinTime => by_checkin_time,
    }
}

/// Reorder the whole set in place.
///
/// Descending order reverses the comparator rather than the output, so
/// equal keys keep their relative order either way.
pub fn sort_objects(objects: &mut [ManagedObject], spec: SortSpec) {
    let cmp = comparator(spec.field);
    if spec.ascending {
        objects.sort_by(cmp);
    } else {
        objects.sort_by(|a, b| cmp(b, a));
    }
}

/// Sort by a field given by name.
///
/// Unknown field names leave the set untouched and return `false`.
pub fn sort_by_field_name(objects: &mut [ManagedObject], field: &str, ascending: bool) -> bool {
    match field.parse::<SortField>() {
        Ok(field) => {
            sort_objects(objects, SortSpec::new(field, ascending));
            true
        }
        Err(e) => {
            debug!(error = %e, "Ignoring sort on unknown field");
            false
        }
    }
}
