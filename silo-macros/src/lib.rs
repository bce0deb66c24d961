mod decode_column;
mod decode_type;

use crate::decode_column::{ColumnMetadata, decode_column};
use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemStruct, LitStr, parse::ParseBuffer, parse_macro_input};

/// Derive the `Entity` mapping for a named struct.
///
/// Struct level: `#[silo(table = "MyTable", schema = "MySchema")]`.
/// Field level: `#[silo(name = "MyColumn", primary_key, read_only,
/// non_empty, max_length = 50, tag = "Name")]`.
#[proc_macro_derive(Entity, attributes(silo))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let item: ItemStruct = parse_macro_input!(input as ItemStruct);
    let name = &item.ident;
    let mut table_name = item.ident.to_string();
    let mut schema_name = String::new();
    for attr in &item.attrs {
        let meta = &attr.meta;
        if meta.path().is_ident("silo") {
            let Ok(list) = meta.require_list() else {
                panic!("Error while parsing `silo`, use it like: `#[silo(attribute = value, ...)]`");
            };
            let _ = list.parse_nested_meta(|arg| {
                if arg.path.is_ident("table") {
                    let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!("Error while parsing `table`, use it like: `#[silo(table = \"MyTable\")]`");
                    };
                    table_name = v.value();
                } else if arg.path.is_ident("schema") {
                    let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!("Error while parsing `schema`, use it like: `#[silo(schema = \"MySchema\")]`");
                    };
                    schema_name = v.value();
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
    let columns: Vec<ColumnMetadata> = item.fields.iter().map(decode_column).collect();
    if columns.iter().filter(|c| c.primary_key).count() > 1 {
        panic!("At most one column can be declared as a primary key");
    }
    let count = columns.len();
    let column_defs = columns.iter().map(|c| {
        let column_name = &c.name;
        let value = &c.value;
        let nullable = c.nullable;
        let primary_key = c.primary_key;
        let read_only = c.read_only;
        let non_empty = c.non_empty;
        let max_length = match c.max_length {
            Some(v) => quote!(::std::option::Option::Some(#v)),
            None => quote!(::std::option::Option::None),
        };
        let tag = match &c.tag {
            Some(v) => quote!(::std::option::Option::Some(#v)),
            None => quote!(::std::option::Option::None),
        };
        quote! {
            ::silo::ColumnDef {
                name: #column_name,
                value: #value,
                nullable: #nullable,
                primary_key: #primary_key,
                read_only: #read_only,
                non_empty: #non_empty,
                max_length: #max_length,
                tag: #tag,
            }
        }
    });
    let field_from_row = columns.iter().map(|c| {
        let ident = &c.ident;
        let ty = &c.ty;
        let column_name = &c.name;
        quote! {
            #ident: <#ty as ::silo::AsValue>::try_from_value(
                row.get_column(#column_name)
                    .cloned()
                    .unwrap_or(::silo::Value::Null),
            )?
        }
    });
    let field_load_row = columns.iter().map(|c| {
        let ident = &c.ident;
        let ty = &c.ty;
        let column_name = &c.name;
        quote! {
            self.#ident = <#ty as ::silo::AsValue>::try_from_value(
                row.get_column(#column_name)
                    .cloned()
                    .unwrap_or(::silo::Value::Null),
            )?;
        }
    });
    let field_values = columns.iter().map(|c| {
        let ident = &c.ident;
        quote!(::silo::AsValue::as_value(self.#ident.clone()))
    });
    let primary_key = columns.iter().find(|c| c.primary_key);
    let primary_key_get = match primary_key {
        Some(c) => {
            let ident = &c.ident;
            quote!(::silo::AsValue::as_value(self.#ident.clone()))
        }
        None => quote!(::silo::Value::Null),
    };
    let primary_key_set = match primary_key {
        Some(c) => {
            let ident = &c.ident;
            let ty = &c.ty;
            quote! {
                self.#ident = <#ty as ::silo::AsValue>::try_from_value(value)?;
                Ok(())
            }
        }
        None => quote! {
            let _ = value;
            Err(::silo::Error::Configuration(::std::format!(
                "{} has no primary key column",
                ::std::stringify!(#name)
            )))
        },
    };
    quote! {
        impl ::silo::Entity for #name {
            fn table_ref() -> &'static ::silo::TableRef {
                static TABLE_REF: ::silo::TableRef = ::silo::TableRef {
                    name: ::std::borrow::Cow::Borrowed(#table_name),
                    schema: ::std::borrow::Cow::Borrowed(#schema_name),
                };
                &TABLE_REF
            }

            fn columns() -> &'static [::silo::ColumnDef] {
                static COLUMNS: [::silo::ColumnDef; #count] = [#(#column_defs),*];
                &COLUMNS
            }

            fn from_row(row: &::silo::RowLabeled) -> ::silo::Result<Self> {
                Ok(Self {
                    #(#field_from_row,)*
                })
            }

            fn load_row(&mut self, row: &::silo::RowLabeled) -> ::silo::Result<()> {
                #(#field_load_row)*
                Ok(())
            }

            fn row(&self) -> ::std::vec::Vec<(&'static ::silo::ColumnDef, ::silo::Value)> {
                Self::columns()
                    .iter()
                    .zip([#(#field_values),*])
                    .collect()
            }

            fn primary_key(&self) -> ::silo::Value {
                #primary_key_get
            }

            fn set_primary_key(&mut self, value: ::silo::Value) -> ::silo::Result<()> {
                #primary_key_set
            }
        }
    }
    .into()
}
