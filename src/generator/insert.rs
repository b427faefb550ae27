use crate::generator::expression::ExpressionGenerator;
use crate::random::Randomly;
use crate::schema::Table;

/// One typed literal per column.
pub fn generate_insert(r: &mut Randomly, table: &Table) -> Option<String> {
    if table.columns.is_empty() {
        return None;
    }
    let mut g = ExpressionGenerator::new(r);

    let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
    let values: Vec<String> = table
        .columns
        .iter()
        .map(|c| g.value_for(Some(c.semantic_type)))
        .collect();

    Some(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.name,
        names.join(", "),
        values.join(", ")
    ))
}

/// Fallback row touching only the first two columns, for when the typed
/// insert was rejected.
pub fn generate_minimal_insert(r: &mut Randomly, table: &Table) -> Option<String> {
    let columns: Vec<_> = table.columns.iter().take(2).collect();
    if columns.is_empty() {
        return None;
    }
    let mut g = ExpressionGenerator::new(r);

    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    let values: Vec<String> = columns
        .iter()
        .map(|c| {
            if c.semantic_type.is_numeric() || c.semantic_type.is_textual() {
                g.value_for(Some(c.semantic_type))
            } else {
                g.constant()
            }
        })
        .collect();

    Some(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.name,
        names.join(", "),
        values.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Column;

    fn table() -> Table {
        Table::new(
            "t",
            vec![
                Column::new("id", "INTEGER").not_null(),
                Column::new("c0", "DATE"),
                Column::new("c1", "BOOLEAN"),
            ],
        )
    }

    #[test]
    fn typed_insert_names_every_column() {
        let mut r = Randomly::new(1);
        let sql = generate_insert(&mut r, &table()).unwrap();
        assert!(sql.starts_with("INSERT INTO t (id, c0, c1) VALUES ("));
        assert!(sql.contains("DATE '"));
        assert!(sql.ends_with("TRUE)") || sql.ends_with("FALSE)"));
    }

    #[test]
    fn minimal_insert_uses_two_columns() {
        let mut r = Randomly::new(1);
        let sql = generate_minimal_insert(&mut r, &table()).unwrap();
        assert!(sql.starts_with("INSERT INTO t (id, c0) VALUES ("));
    }

    #[test]
    fn no_columns_no_insert() {
        let mut r = Randomly::new(1);
        let empty = Table::new("e", vec![]);
        assert!(generate_insert(&mut r, &empty).is_none());
        assert!(generate_minimal_insert(&mut r, &empty).is_none());
    }
}
