//! Changes table contents between oracle checks.

use crate::error::Result;
use crate::generator::expression::ExpressionGenerator;
use crate::state::GlobalState;

/// Runs one `UPDATE <t> SET <c> = <value> WHERE <predicate>`, where the
/// predicate picks the table. A rejected update is logged and reported as
/// `Ok(false)`.
pub fn mutate(state: &mut GlobalState) -> Result<bool> {
    let schema = state.schema();
    let Some((table, filter)) = ExpressionGenerator::new(state.randomly()).random_predicate(&schema)
    else {
        return Ok(false);
    };
    let Some(target) = table.random_column(state.randomly()) else {
        return Ok(false);
    };

    let value = ExpressionGenerator::new(state.randomly()).value_for(Some(target.semantic_type));
    let sql = format!(
        "UPDATE {} SET {} = {} WHERE {}",
        table.name, target.name, value, filter
    );

    match state.execute_statement(&sql) {
        Ok(()) => Ok(true),
        Err(e) if e.is_connectivity() => Err(e),
        Err(e) => {
            state.log().log_exception(&e, Some(sql.as_str()));
            Ok(false)
        }
    }
}
