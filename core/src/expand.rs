//! Grouped-column flattening.
//!
//! A declared column whose name is a group prefix never becomes a physical
//! column. Instead each field of the group is resolved as
//! `{prefix}_{field}`, in the field order of the group. That order is
//! shared by every compiled statement.

use crate::resolve::{ResolvedColumn, resolve_column};
use crate::ConstraintSet;

/// Expands `name` into its group's fields, appending them to `resolved`.
///
/// Returns `false` (and leaves `resolved` untouched) when `name` is not a
/// group prefix.
///
/// # Examples
///
/// ```
/// use sqlforge_core::{ColumnGroup, ConstraintSet, expand_column};
///
/// let mut constraints = ConstraintSet::default();
/// constraints.groups.push(ColumnGroup::new("pos").field("x", 0.0).field("y", 0.0));
///
/// let mut resolved = Vec::new();
/// assert!(expand_column("pos", &constraints, &mut resolved));
/// assert_eq!(resolved[0].name, "pos_x");
/// assert_eq!(resolved[1].name, "pos_y");
///
/// assert!(!expand_column("id", &constraints, &mut resolved));
/// assert_eq!(resolved.len(), 2);
/// ```
pub fn expand_column(
    name: &str,
    constraints: &ConstraintSet,
    resolved: &mut Vec<ResolvedColumn>,
) -> bool {
    let Some(group) = constraints.group(name) else {
        return false;
    };
    for field in &group.fields {
        let physical = format!("{}_{}", group.prefix, field.name);
        resolved.push(resolve_column(&physical, &field.default, constraints));
    }
    true
}
