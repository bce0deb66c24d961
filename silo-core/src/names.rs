/// Maps logical table/column names to the physical identifiers a backend
/// expects, and derives the stored-procedure and scalar-function names used
/// in stored-procedure mode.
///
/// The default methods implement the identity translation and the
/// `<base>_Operation` naming convention; backends override what they need.
/// Quoting stays with the `SqlWriter`: translation produces bare physical
/// names.
pub trait NameTranslator: Send + Sync {
    fn translate_table(&self, table: &str) -> String {
        table.into()
    }

    fn translate_column(&self, column: &str) -> String {
        column.into()
    }

    /// Base name stored-procedure names are derived from.
    fn procedure_base_name(&self, table: &str) -> String {
        self.translate_table(table)
    }

    /// Base name scalar-function names are derived from.
    fn function_base_name(&self, table: &str) -> String {
        self.translate_table(table)
    }

    fn select_list_procedure(&self, table: &str) -> String {
        format!("{}_SelectList", self.procedure_base_name(table))
    }

    fn select_details_procedure(&self, table: &str) -> String {
        format!("{}_SelectDetails", self.procedure_base_name(table))
    }

    fn insert_procedure(&self, table: &str) -> String {
        format!("{}_Insert", self.procedure_base_name(table))
    }

    fn update_procedure(&self, table: &str) -> String {
        format!("{}_Update", self.procedure_base_name(table))
    }

    fn delete_procedure(&self, table: &str) -> String {
        format!("{}_Delete", self.procedure_base_name(table))
    }

    fn id_by_name_function(&self, table: &str) -> String {
        format!("{}_GetIdByName", self.function_base_name(table))
    }
}

/// Identity translation with the default naming conventions.
pub struct DefaultNames;

impl NameTranslator for DefaultNames {}

pub static DEFAULT_NAMES: DefaultNames = DefaultNames;
