//! Item validation rules: base-kind-dependent required fields, date ordering, reference syntax.
//!
//! Mirrors the Item repository's validation step : every rule here
//! raises a [`Fault::Validation`], never panics, and checks are ordered so
//! the first violation found is the one reported.

use crate::error::Fault;
use crate::id;
use crate::item::{Item, ItemBody, NewItem, TaskFields};

/// Validates a fully-assembled item's base-kind-dependent shape and
/// its date/related invariants. Does not check that `status` names a
/// registered status or that `related` targets exist -- those require the
/// registries and are checked by the caller.
pub fn validate(item: &Item) -> Result<(), Fault> {
    if item.title.trim().is_empty() {
        return Err(Fault::validation("title is required"));
    }

    match &item.body {
        ItemBody::Task(fields) => validate_task_fields(fields)?,
        ItemBody::Plain => {}
    }

    validate_related(&item.type_name, &item.id, &item.related)?;

    Ok(())
}

/// Validates a [`NewItem`] against the base kind the target type declares,
/// before an `Item` (with allocated id and timestamps) exists to check.
pub fn validate_new(new_item: &NewItem, base_kind_is_tasks: bool) -> Result<(), Fault> {
    if new_item.title.trim().is_empty() {
        return Err(Fault::validation("title is required"));
    }

    if base_kind_is_tasks {
        let priority = new_item
            .priority
            .ok_or_else(|| Fault::validation("priority is required for tasks-kind items"))?;
        let status = new_item
            .status
            .as_ref()
            .ok_or_else(|| Fault::validation("status is required for tasks-kind items"))?;
        if status.trim().is_empty() {
            return Err(Fault::validation("status is required for tasks-kind items"));
        }
        let _ = priority;
        validate_date_order(new_item.start_date.as_deref(), new_item.end_date.as_deref())?;
    } else {
        if new_item.priority.is_some() {
            return Err(Fault::validation("priority is forbidden for non-tasks-kind items"));
        }
        if new_item.status.is_some() {
            return Err(Fault::validation("status is forbidden for non-tasks-kind items"));
        }
        if new_item.start_date.is_some() || new_item.end_date.is_some() {
            return Err(Fault::validation(
                "start_date/end_date are forbidden for non-tasks-kind items",
            ));
        }
    }

    Ok(())
}

fn validate_task_fields(fields: &TaskFields) -> Result<(), Fault> {
    if fields.status.trim().is_empty() {
        return Err(Fault::validation("status is required for tasks-kind items"));
    }
    validate_date_order(fields.start_date.as_deref(), fields.end_date.as_deref())
}

fn validate_date_order(start: Option<&str>, end: Option<&str>) -> Result<(), Fault> {
    if let Some(start) = start {
        if !id::is_date(start) {
            return Err(Fault::validation(format!("invalid start_date: {start}")));
        }
    }
    if let Some(end) = end {
        if !id::is_date(end) {
            return Err(Fault::validation(format!("invalid end_date: {end}")));
        }
    }
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(Fault::validation(format!(
                "end_date ({end}) must not be before start_date ({start})"
            )));
        }
    }
    Ok(())
}

/// Validates `related` reference *syntax* (format only, not existence).
/// Rejects self-references.
pub fn validate_related(type_name: &str, own_id: &str, related: &[String]) -> Result<(), Fault> {
    let self_reference = format!("{type_name}-{own_id}");
    for reference in related {
        let (ref_type, ref_id) = id::parse_reference(reference)
            .ok_or_else(|| Fault::validation(format!("malformed reference: {reference}")))?;
        if reference == &self_reference {
            return Err(Fault::validation(format!(
                "item {self_reference} must not reference itself"
            )));
        }
        let _ = (ref_type, ref_id);
    }
    Ok(())
}
