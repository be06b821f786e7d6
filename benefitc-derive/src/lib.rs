use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Lit, Meta, Type};

/// Derive macro describing the CSV columns of a record struct.
///
/// A column is:
/// - named after the field, or its `#[serde(rename = "...")]`
/// - optional when the field is an `Option<T>` or carries `#[serde(default)]`
/// - described by the field's doc comment
///
/// Generates `csv_columns() -> &'static [CsvColumn]` and `csv_header() -> String`.
/// `CsvColumn` must be in scope where the derive is used.
#[proc_macro_derive(CsvColumns, attributes(serde))]
pub fn derive_csv_columns(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return syn::Error::new_spanned(name, "CsvColumns requires named fields")
                    .to_compile_error()
                    .into()
            }
        },
        _ => {
            return syn::Error::new_spanned(name, "CsvColumns can only be derived for structs")
                .to_compile_error()
                .into()
        }
    };

    let columns: Vec<(String, bool, String)> = fields
        .iter()
        .filter_map(|field| {
            let ident = field.ident.as_ref()?;
            let column = serde_rename(&field.attrs).unwrap_or_else(|| ident.to_string());
            let required = !is_option(&field.ty) && !has_serde_default(&field.attrs);
            Some((column, required, doc_text(&field.attrs)))
        })
        .collect();

    let header = columns
        .iter()
        .map(|(column, _, _)| column.as_str())
        .collect::<Vec<_>>()
        .join(",");

    let entries = columns.iter().map(|(column, required, description)| {
        quote! {
            CsvColumn {
                name: #column,
                required: #required,
                description: #description,
            }
        }
    });

    let expanded = quote! {
        impl #name {
            pub fn csv_columns() -> &'static [CsvColumn] {
                static COLUMNS: &[CsvColumn] = &[
                    #(#entries),*
                ];
                COLUMNS
            }

            pub fn csv_header() -> String {
                #header.to_string()
            }
        }
    };

    TokenStream::from(expanded)
}

fn serde_args(attrs: &[Attribute]) -> impl Iterator<Item = String> + '_ {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("serde"))
        .filter_map(|attr| match &attr.meta {
            Meta::List(list) => Some(list.tokens.to_string()),
            _ => None,
        })
}

fn serde_rename(attrs: &[Attribute]) -> Option<String> {
    serde_args(attrs).find_map(|tokens| {
        let rest = &tokens[tokens.find("rename")?..];
        let value = rest[rest.find('=')? + 1..].trim().strip_prefix('"')?;
        value.find('"').map(|end| value[..end].to_string())
    })
}

fn has_serde_default(attrs: &[Attribute]) -> bool {
    serde_args(attrs).any(|tokens| {
        tokens
            .split(',')
            .any(|arg| arg.trim().starts_with("default"))
    })
}

fn doc_text(attrs: &[Attribute]) -> String {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(meta) => match &meta.value {
                syn::Expr::Lit(expr) => match &expr.lit {
                    Lit::Str(s) => Some(s.value().trim().to_string()),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_option(ty: &Type) -> bool {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Option"),
        _ => false,
    }
}
