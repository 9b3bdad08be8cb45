//! Whole-table compilation.
//!
//! [`compile_table`] validates a declaration once and produces every
//! artifact for it from a single physical column list, so the column order
//! of CREATE, INSERT, both SELECTs and the UPDATE `SET` list always agree.

use crate::artifact::CompiledTable;
use crate::ddl::{compile_drop, create_unchecked, ensure_valid};
use crate::dml::{
    compile_delete, compile_insert, compile_select_all, compile_select_by_key, compile_update,
};
use crate::error::Result;
use crate::TableDeclaration;

/// Compiles every artifact for `table`.
///
/// Tables without a primary key get CREATE, DROP, INSERT and SELECT_ALL
/// only. A table whose only column is its key gets no UPDATE.
///
/// # Errors
///
/// Returns [`CompileError::Invalid`](crate::CompileError::Invalid) if the
/// declaration fails validation.
///
/// # Examples
///
/// ```
/// use sqlforge_core::{PrimaryKey, TableDeclaration, Verb, compile_table};
///
/// let widget = TableDeclaration::new("WIDGET")
///     .column("id", "")
///     .column("label", "")
///     .primary_key(PrimaryKey::new("id"));
///
/// let compiled = compile_table(&widget).unwrap();
/// assert_eq!(compiled.artifacts.len(), 7);
/// assert_eq!(
///     compiled.artifact(Verb::Delete).unwrap().sql,
///     "DELETE FROM WIDGET WHERE id = ?;"
/// );
/// ```
pub fn compile_table(table: &TableDeclaration) -> Result<CompiledTable> {
    ensure_valid(table)?;

    let name = table.name.as_str();
    let constraints = &table.constraints;
    let (create, columns) = create_unchecked(table);

    let mut artifacts = vec![
        create,
        compile_drop(name),
        compile_insert(name, &columns),
        compile_select_all(name, &columns, &constraints.order_by),
    ];

    let primary_key = constraints.primary_key_column().map(str::to_string);
    if let Some(key) = primary_key.as_deref() {
        artifacts.push(compile_select_by_key(
            name,
            &columns,
            key,
            &constraints.order_by,
        ));
        artifacts.extend(compile_update(name, &columns, key));
        artifacts.push(compile_delete(name, key));
    }

    Ok(CompiledTable {
        table: table.name.clone(),
        columns,
        primary_key,
        artifacts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::select_columns;
    use crate::{ColumnGroup, PrimaryKey, Verb};

    fn ship() -> TableDeclaration {
        TableDeclaration::new("SHIP")
            .column("id", "")
            .column("name", "")
            .column("pos", "")
            .column("hull", 100)
            .group(ColumnGroup::new("pos").field("x", 0.0).field("y", 0.0))
            .primary_key(PrimaryKey::new("id"))
            .order_by("name")
    }

    #[test]
    fn test_column_order_agrees_across_artifacts() {
        let compiled = compile_table(&ship()).unwrap();
        let expected = vec!["id", "name", "pos_x", "pos_y", "hull"];
        assert_eq!(compiled.columns, expected);

        let insert = &compiled.artifact(Verb::Insert).unwrap().sql;
        assert!(insert.starts_with("INSERT INTO SHIP (id, name, pos_x, pos_y, hull) VALUES"));

        for verb in [Verb::SelectAll, Verb::SelectByPk] {
            let sql = &compiled.artifact(verb).unwrap().sql;
            assert_eq!(select_columns(sql).unwrap(), expected);
        }

        let update = &compiled.artifact(Verb::Update).unwrap().sql;
        assert_eq!(
            update,
            "UPDATE SHIP SET name=?, pos_x=?, pos_y=?, hull=? WHERE id = ?;"
        );
        assert_eq!(compiled.update_columns(), vec!["name", "pos_x", "pos_y", "hull"]);

        let create = &compiled.artifact(Verb::Create).unwrap().sql;
        let positions: Vec<usize> = expected
            .iter()
            .map(|c| create.find(&format!("{c} ")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_keyless_table_has_no_keyed_artifacts() {
        let table = TableDeclaration::new("EVENT").column("message", "");
        let compiled = compile_table(&table).unwrap();
        let verbs: Vec<Verb> = compiled.artifacts.iter().map(|a| a.verb).collect();
        assert_eq!(
            verbs,
            vec![Verb::Create, Verb::Drop, Verb::Insert, Verb::SelectAll]
        );
        assert!(compiled.primary_key.is_none());
    }

    #[test]
    fn test_key_only_table_has_no_update() {
        let table = TableDeclaration::new("TAG")
            .column("name", "")
            .primary_key(PrimaryKey::new("name"));
        let compiled = compile_table(&table).unwrap();
        assert!(compiled.artifact(Verb::Update).is_none());
        assert!(compiled.artifact(Verb::Delete).is_some());
    }

    #[test]
    fn test_ordering_applies_to_both_selects() {
        let compiled = compile_table(&ship()).unwrap();
        assert_eq!(
            compiled.artifact(Verb::SelectAll).unwrap().sql,
            "SELECT id, name, pos_x, pos_y, hull FROM SHIP ORDER BY name;"
        );
        assert_eq!(
            compiled.artifact(Verb::SelectByPk).unwrap().sql,
            "SELECT id, name, pos_x, pos_y, hull FROM SHIP WHERE id = ? ORDER BY name;"
        );
    }

    #[test]
    fn test_invalid_table_is_not_compiled() {
        let table = TableDeclaration::new("").column("a", "");
        assert!(compile_table(&table).is_err());
    }
}
