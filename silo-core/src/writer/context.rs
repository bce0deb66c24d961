/// The statement fragment currently being rendered. Dialect writers may use
/// it to vary escaping or identifier handling by position.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment {
    #[default]
    None,
    SqlSelect,
    SqlSelectWhere,
    SqlInsertInto,
    SqlInsertIntoValues,
    SqlUpdate,
    SqlUpdateSet,
    SqlUpdateWhere,
    SqlDeleteFrom,
    SqlDeleteFromWhere,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    pub fragment: Fragment,
}

impl Context {
    pub fn new(fragment: Fragment) -> Self {
        Self { fragment }
    }
    pub fn switch_fragment(&self, fragment: Fragment) -> Context {
        Context { fragment }
    }
}
