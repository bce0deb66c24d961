use proc_macro2::TokenStream;
use quote::quote;
use syn::{GenericArgument, PathArguments, Type};

/// A field type mapped to its column prototype.
pub(crate) struct TypeDecoded {
    /// Expression evaluating to the NULL-carrying `Value` variant for the
    /// type, usable in const context.
    pub(crate) value: TokenStream,
    /// Whether the field can represent absence (`Option<..>`).
    pub(crate) nullable: bool,
}

fn inner_type(arguments: &PathArguments) -> Option<&Type> {
    let PathArguments::AngleBracketed(args) = arguments else {
        return None;
    };
    match args.args.first() {
        Some(GenericArgument::Type(ty)) => Some(ty),
        _ => None,
    }
}

fn is_u8_slice(ty: &Type) -> bool {
    let Type::Slice(slice) = ty else {
        return false;
    };
    matches!(&*slice.elem, Type::Path(p) if p.path.is_ident("u8"))
}

pub(crate) fn decode_type(ty: &Type) -> TypeDecoded {
    let Type::Path(path) = ty else {
        panic!("Unsupported field type, use a scalar type mapped to a column value");
    };
    let Some(segment) = path.path.segments.last() else {
        panic!("Unsupported field type, use a scalar type mapped to a column value");
    };
    let ident = segment.ident.to_string();
    let none = quote!(::std::option::Option::None);
    let value = match ident.as_str() {
        "Option" => {
            let Some(inner) = inner_type(&segment.arguments) else {
                panic!("Error while decoding `Option`, a type argument is expected");
            };
            let inner = decode_type(inner);
            return TypeDecoded {
                value: inner.value,
                nullable: true,
            };
        }
        "bool" => quote!(::silo::Value::Boolean(#none)),
        "i8" => quote!(::silo::Value::Int8(#none)),
        "i16" => quote!(::silo::Value::Int16(#none)),
        "i32" => quote!(::silo::Value::Int32(#none)),
        "i64" => quote!(::silo::Value::Int64(#none)),
        "u8" => quote!(::silo::Value::UInt8(#none)),
        "u16" => quote!(::silo::Value::UInt16(#none)),
        "u32" => quote!(::silo::Value::UInt32(#none)),
        "u64" => quote!(::silo::Value::UInt64(#none)),
        "f32" => quote!(::silo::Value::Float32(#none)),
        "f64" => quote!(::silo::Value::Float64(#none)),
        "String" => quote!(::silo::Value::Varchar(#none)),
        "Decimal" => quote!(::silo::Value::Decimal(#none, 0, 0)),
        "Date" => quote!(::silo::Value::Date(#none)),
        "Time" => quote!(::silo::Value::Time(#none)),
        "PrimitiveDateTime" => quote!(::silo::Value::Timestamp(#none)),
        "Uuid" => quote!(::silo::Value::Uuid(#none)),
        "Vec" | "Box" => {
            let blob = inner_type(&segment.arguments)
                .map(|inner| match inner {
                    Type::Path(p) if p.path.is_ident("u8") => true,
                    other => is_u8_slice(other),
                })
                .unwrap_or(false);
            if !blob {
                panic!("Unsupported field type `{}`, only byte containers (`Vec<u8>`, `Box<[u8]>`) map to a column", ident);
            }
            quote!(::silo::Value::Blob(#none))
        }
        other => panic!(
            "Unsupported field type `{}`, use a scalar type mapped to a column value",
            other
        ),
    };
    TypeDecoded {
        value,
        nullable: false,
    }
}
