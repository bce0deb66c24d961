use crate::decode_type::{TypeDecoded, decode_type};
use proc_macro2::TokenStream;
use syn::{Field, Ident, LitInt, LitStr, Type, parse::ParseBuffer};

pub(crate) struct ColumnMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    pub(crate) name: String,
    pub(crate) value: TokenStream,
    pub(crate) nullable: bool,
    pub(crate) primary_key: bool,
    pub(crate) read_only: bool,
    pub(crate) non_empty: bool,
    pub(crate) max_length: Option<u32>,
    pub(crate) tag: Option<String>,
}

pub(crate) fn decode_column(field: &Field) -> ColumnMetadata {
    let TypeDecoded { value, nullable } = decode_type(&field.ty);
    let ident = field
        .ident
        .clone()
        .expect("Field is expected to have a name");
    let name = ident.to_string();
    let mut metadata = ColumnMetadata {
        ident,
        ty: field.ty.clone(),
        name,
        value,
        nullable,
        primary_key: false,
        read_only: false,
        non_empty: false,
        max_length: None,
        tag: None,
    };
    if metadata.name.starts_with('_') {
        metadata.name.remove(0);
    }
    for attr in &field.attrs {
        let meta = &attr.meta;
        if meta.path().is_ident("silo") {
            let Ok(list) = meta.require_list() else {
                panic!("Error while parsing `silo`, use it like: `#[silo(attribute = value, ...)]`");
            };
            let _ = list.parse_nested_meta(|arg| {
                if arg.path.is_ident("name") {
                    let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!("Error while parsing `name`, use it like: `#[silo(name = \"MyColumn\")]`");
                    };
                    metadata.name = v.value();
                } else if arg.path.is_ident("primary_key") {
                    let Err(..) = arg.value() else {
                        // value() is Err for Meta::Path
                        panic!("Error while parsing `primary_key`, use it like: `#[silo(primary_key)]`");
                    };
                    // Keys never appear in INSERT or UPDATE value lists.
                    metadata.primary_key = true;
                    metadata.read_only = true;
                    metadata.nullable = false;
                } else if arg.path.is_ident("read_only") {
                    let Err(..) = arg.value() else {
                        panic!("Error while parsing `read_only`, use it like: `#[silo(read_only)]`");
                    };
                    metadata.read_only = true;
                } else if arg.path.is_ident("non_empty") {
                    let Err(..) = arg.value() else {
                        panic!("Error while parsing `non_empty`, use it like: `#[silo(non_empty)]`");
                    };
                    metadata.non_empty = true;
                } else if arg.path.is_ident("max_length") {
                    let Ok(v) = arg
                        .value()
                        .and_then(ParseBuffer::parse::<LitInt>)
                        .and_then(|v| v.base10_parse::<u32>())
                    else {
                        panic!("Error while parsing `max_length`, use it like: `#[silo(max_length = 50)]`");
                    };
                    metadata.max_length = Some(v);
                } else if arg.path.is_ident("tag") {
                    let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!("Error while parsing `tag`, use it like: `#[silo(tag = \"Name\")]`");
                    };
                    metadata.tag = Some(v.value());
                } else {
                    panic!(
                        "Unknown attribute `{}` inside silo macro",
                        arg.path
                            .get_ident()
                            .map(ToString::to_string)
                            .unwrap_or_default()
                    );
                }
                Ok(())
            });
        }
    }
    metadata
}
