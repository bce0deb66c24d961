mod column;
mod command;
mod driver;
mod entity;
mod error;
mod expression;
mod names;
mod parameter;
mod repository;
mod row;
mod table_ref;
mod util;
mod value;
mod writer;

pub use column::*;
pub use command::*;
pub use driver::*;
pub use entity::*;
pub use error::*;
pub use expression::*;
pub use names::*;
pub use parameter::*;
pub use repository::*;
pub use row::*;
pub use table_ref::*;
pub use util::*;
pub use value::*;
pub use writer::*;
