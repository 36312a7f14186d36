//! Rendering: `CodecPlan` → Rust tokens for `impl Codec for <Record>`.
//!
//! One templating pass over the plan. All paths into the runtime and std are
//! fully qualified so the output can be `include!`d into any module.
use proc_macro2::{Ident, Span, TokenStream};
use quote::{format_ident, quote};

use crate::error::StructuralError;
use crate::ir::{ContainerShape, ScalarKind, TypeDesc};
use crate::lower::{CodecPlan, Conversion, FieldPlan, Step};

pub const HEADER: &str = "// This file is generated by rqlgen. DO NOT EDIT!";

pub struct Codegen {
    runtime: syn::Path,
    out: TokenStream,
}

impl Codegen {
    /// `runtime` is the module path generated code calls into, usually `::rqlgen::runtime`.
    pub fn new(runtime: syn::Path) -> Self {
        Codegen { runtime, out: TokenStream::new() }
    }

    pub fn emit(&mut self, plan: &CodecPlan) -> Result<(), StructuralError> {
        let item = RecordGen { rt: &self.runtime, plan }.codec_impl()?;
        self.out.extend(item);
        Ok(())
    }

    pub fn into_tokens(self) -> TokenStream {
        self.out
    }

    pub fn into_string(self) -> String {
        format!("{HEADER}\n\n{}\n", self.out)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// PER-RECORD RENDERING
// ————————————————————————————————————————————————————————————————————————————

struct RecordGen<'a> {
    rt: &'a syn::Path,
    plan: &'a CodecPlan,
}

impl RecordGen<'_> {
    fn codec_impl(&self) -> Result<TokenStream, StructuralError> {
        let rt = self.rt;
        let ty = ident(&self.plan.type_name);
        let alias = self.alias();
        let record = &self.plan.type_name;
        let capacity = self.plan.fields.len();

        let encode_steps = self.plan.fields.iter().map(|f| self.encode_field(f)).collect::<Result<Vec<_>, _>>()?;
        let decode_steps = self.plan.fields.iter().map(|f| self.decode_field(f)).collect::<Result<Vec<_>, _>>()?;

        Ok(quote! {
            #[automatically_derived]
            #[allow(unused_mut, unused_variables, clippy::all)]
            impl #rt::Codec for #ty {
                fn encode(&self) -> ::core::result::Result<#rt::Datum, #rt::CodecError> {
                    let #alias = self;
                    let mut rqlgen_tmp = #rt::Object::with_capacity(#capacity);
                    #(#encode_steps)*
                    ::core::result::Result::Ok(#rt::Datum::Object(rqlgen_tmp))
                }

                fn decode(&mut self, rqlgen_iface: #rt::Datum) -> ::core::result::Result<(), #rt::CodecError> {
                    let #alias = self;
                    let mut rqlgen_tmp = match rqlgen_iface {
                        #rt::Datum::Null => return ::core::result::Result::Ok(()),
                        #rt::Datum::Object(rqlgen_obj) => rqlgen_obj,
                        rqlgen_other => {
                            return ::core::result::Result::Err(#rt::CodecError::type_mismatch(
                                #record,
                                ::core::option::Option::None,
                                "object",
                                rqlgen_other.kind(),
                            ));
                        }
                    };
                    #(#decode_steps)*
                    ::core::result::Result::Ok(())
                }
            }
        })
    }

    fn alias(&self) -> Ident {
        Ident::new(&self.plan.receiver_alias, Span::call_site())
    }

    // ------------------------------- encode -------------------------------- //

    fn encode_field(&self, field: &FieldPlan) -> Result<TokenStream, StructuralError> {
        let rt = self.rt;
        let alias = self.alias();
        let member = ident(&field.name);
        let key = &field.key;

        let tokens = match &field.step {
            Step::Scalar { conversion: Conversion::Direct, .. } => quote! {
                rqlgen_tmp.insert(
                    ::std::string::String::from(#key),
                    #rt::Datum::from(::core::clone::Clone::clone(&#alias.#member)),
                );
            },
            Step::Scalar { kind, conversion: Conversion::Checked } => {
                let value = self.to_canonical(field, *kind, &describe(&field.declared), quote!(&#alias.#member))?;
                quote! {
                    rqlgen_tmp.insert(::std::string::String::from(#key), #value);
                }
            }
            Step::Codec => quote! {
                rqlgen_tmp.insert(::std::string::String::from(#key), #rt::Codec::encode(&#alias.#member)?);
            },
            Step::ContainerScalar { shape, kind, elem, conversion } => {
                let value = match conversion {
                    Conversion::Direct => quote!(#rt::Datum::from(::core::clone::Clone::clone(rqlgen_v))),
                    Conversion::Checked => self.to_canonical(field, *kind, &describe(elem), quote!(rqlgen_v))?,
                };
                self.encode_container(field, *shape, value)
            }
            Step::ContainerCodec { shape, .. } => {
                self.encode_container(field, *shape, quote!(#rt::Codec::encode(rqlgen_v)?))
            }
        };
        Ok(tokens)
    }

    /// `Datum` from a checked `ToCanonical` conversion of `value` (a reference).
    fn to_canonical(
        &self,
        field: &FieldPlan,
        kind: ScalarKind,
        from: &str,
        value: TokenStream,
    ) -> Result<TokenStream, StructuralError> {
        let rt = self.rt;
        let canon = self.canonical_type(field, kind)?;
        let storage_kind = field.kind.to_string();
        let (record, name) = (&self.plan.type_name, &field.name);
        Ok(quote! {
            #rt::Datum::from(
                #rt::ToCanonical::<#canon>::to_canonical(#value)
                    .ok_or_else(|| #rt::CodecError::conversion(#from, #storage_kind, #record, #name))?,
            )
        })
    }

    fn encode_container(&self, field: &FieldPlan, shape: ContainerShape, value: TokenStream) -> TokenStream {
        let rt = self.rt;
        let alias = self.alias();
        let member = ident(&field.name);
        let local = format_ident!("rqlgen_f_{}", field.name);
        let key = &field.key;
        match shape {
            ContainerShape::Array => quote! {
                {
                    let mut #local = ::std::vec::Vec::with_capacity(#alias.#member.len());
                    for rqlgen_v in #alias.#member.iter() {
                        #local.push(#value);
                    }
                    rqlgen_tmp.insert(::std::string::String::from(#key), #rt::Datum::Array(#local));
                }
            },
            ContainerShape::Map => quote! {
                {
                    let mut #local = #rt::Object::with_capacity(#alias.#member.len());
                    for (rqlgen_k, rqlgen_v) in #alias.#member.iter() {
                        #local.insert(::core::clone::Clone::clone(rqlgen_k), #value);
                    }
                    rqlgen_tmp.insert(::std::string::String::from(#key), #rt::Datum::Object(#local));
                }
            },
        }
    }

    // ------------------------------- decode -------------------------------- //

    fn decode_field(&self, field: &FieldPlan) -> Result<TokenStream, StructuralError> {
        let rt = self.rt;
        let alias = self.alias();
        let key = &field.key;
        let record = &self.plan.type_name;

        let absent = if field.optional {
            quote!({})
        } else {
            quote!(return ::core::result::Result::Err(#rt::CodecError::missing_field(#record, #key)))
        };
        let assign = self.decode_assign(field)?;
        let hook = if field.polymorphic {
            quote!(#rt::Polymorphic::mutate(&mut *#alias);)
        } else {
            TokenStream::new()
        };

        Ok(quote! {
            match rqlgen_tmp.swap_remove(#key) {
                ::core::option::Option::None => #absent,
                ::core::option::Option::Some(#rt::Datum::Null) => {}
                ::core::option::Option::Some(rqlgen_val) => {
                    #assign
                }
            }
            #hook
        })
    }

    fn decode_assign(&self, field: &FieldPlan) -> Result<TokenStream, StructuralError> {
        let rt = self.rt;
        let alias = self.alias();
        let member = ident(&field.name);

        let tokens = match &field.step {
            Step::Scalar { kind, conversion } => {
                let value = self.scalar_from_datum(field, *kind, *conversion, &field.declared, quote!(rqlgen_val))?;
                quote! { #alias.#member = #value; }
            }
            Step::Codec => quote! {
                #rt::Codec::decode(&mut #alias.#member, rqlgen_val)?;
            },
            Step::ContainerScalar { shape, kind, elem, conversion } => {
                let value = self.scalar_from_datum(field, *kind, *conversion, elem, quote!(rqlgen_v))?;
                self.decode_container(field, *shape, elem, value)?
            }
            Step::ContainerCodec { shape, elem } => {
                let elem_ty = self.type_tokens(field, elem)?;
                let value = quote! {
                    {
                        let mut rqlgen_elem = <#elem_ty as ::core::default::Default>::default();
                        #rt::Codec::decode(&mut rqlgen_elem, rqlgen_v)?;
                        rqlgen_elem
                    }
                };
                self.decode_container(field, *shape, elem, value)?
            }
        };
        Ok(tokens)
    }

    /// Expression turning the datum bound to `datum` into a value of `declared`,
    /// returning early with a `Conversion` error.
    fn scalar_from_datum(
        &self,
        field: &FieldPlan,
        kind: ScalarKind,
        conversion: Conversion,
        declared: &TypeDesc,
        datum: TokenStream,
    ) -> Result<TokenStream, StructuralError> {
        let rt = self.rt;
        let project = projection(kind);
        let (record, name) = (&self.plan.type_name, &field.name);
        let declared_name = describe(declared);

        let tokens = match conversion {
            Conversion::Direct => quote! {
                #datum.#project().map_err(|rqlgen_got| {
                    #rt::CodecError::conversion(rqlgen_got.kind(), #declared_name, #record, #name)
                })?
            },
            Conversion::Checked => {
                let canon = self.canonical_type(field, kind)?;
                let canon_name = kind.canonical().unwrap_or_default();
                let from_canonical = if declared.is_resolved() {
                    let declared_ty = self.type_tokens(field, declared)?;
                    quote!(<#declared_ty as #rt::FromCanonical<#canon>>::from_canonical)
                } else {
                    // target type comes from the assignment
                    quote!(#rt::FromCanonical::<#canon>::from_canonical)
                };
                quote! {
                    {
                        let rqlgen_raw = #datum.#project().map_err(|rqlgen_got| {
                            #rt::CodecError::conversion(rqlgen_got.kind(), #canon_name, #record, #name)
                        })?;
                        #from_canonical(rqlgen_raw).ok_or_else(|| {
                            #rt::CodecError::conversion(#canon_name, #declared_name, #record, #name)
                        })?
                    }
                }
            }
        };
        Ok(tokens)
    }

    /// Rebuild a container from the datum bound to `rqlgen_val`. `value` turns
    /// one element bound to `rqlgen_v` into the declared element type.
    fn decode_container(
        &self,
        field: &FieldPlan,
        shape: ContainerShape,
        elem: &TypeDesc,
        value: TokenStream,
    ) -> Result<TokenStream, StructuralError> {
        let rt = self.rt;
        let alias = self.alias();
        let member = ident(&field.name);
        let (record, name) = (&self.plan.type_name, &field.name);
        let elem_ty = self.type_tokens(field, elem)?;

        let (project, expected, pattern, item_ty, item) = match shape {
            ContainerShape::Array => (
                quote!(into_array),
                "array",
                quote!(rqlgen_v),
                quote!(#elem_ty),
                quote!(#value),
            ),
            ContainerShape::Map => (
                quote!(into_object),
                "object",
                quote!((rqlgen_k, rqlgen_v)),
                quote!((::std::string::String, #elem_ty)),
                quote!((rqlgen_k, #value)),
            ),
        };

        Ok(quote! {
            let rqlgen_items = rqlgen_val.#project().map_err(|rqlgen_got| {
                #rt::CodecError::type_mismatch(#record, ::core::option::Option::Some(#name), #expected, rqlgen_got.kind())
            })?;
            #alias.#member = rqlgen_items
                .into_iter()
                .map(|#pattern| -> ::core::result::Result<#item_ty, #rt::CodecError> {
                    ::core::result::Result::Ok(#item)
                })
                .collect::<::core::result::Result<_, #rt::CodecError>>()?;
        })
    }

    // ------------------------------- types --------------------------------- //

    /// Canonical runtime type of a scalar kind. Nested codecs have none.
    fn canonical_type(&self, field: &FieldPlan, kind: ScalarKind) -> Result<TokenStream, StructuralError> {
        let rt = self.rt;
        match kind {
            ScalarKind::String => Ok(quote!(::std::string::String)),
            ScalarKind::Number => Ok(quote!(f64)),
            ScalarKind::Bool => Ok(quote!(bool)),
            ScalarKind::Time => Ok(quote!(#rt::Timestamp)),
            ScalarKind::Codec => Err(StructuralError::ShapeMismatch {
                record: self.plan.type_name.clone(),
                field: field.name.clone(),
                ty: field.declared.to_string(),
                kind: field.kind,
            }),
        }
    }

    fn type_tokens(&self, field: &FieldPlan, ty: &TypeDesc) -> Result<syn::Type, StructuralError> {
        syn::parse_str(&ty.to_string()).map_err(|_| StructuralError::UnresolvedType {
            record: self.plan.type_name.clone(),
            field: field.name.clone(),
        })
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// `Datum` projection for a scalar kind.
fn projection(kind: ScalarKind) -> Ident {
    let name = match kind {
        ScalarKind::String => "into_text",
        ScalarKind::Number => "into_number",
        ScalarKind::Bool => "into_bool",
        ScalarKind::Time => "into_time",
        ScalarKind::Codec => "into_object",
    };
    Ident::new(name, Span::call_site())
}

/// Identifier for a field or type name, raw when it is a keyword.
fn ident(name: &str) -> Ident {
    if syn::parse_str::<Ident>(name).is_ok() {
        Ident::new(name, Span::call_site())
    } else {
        Ident::new_raw(name, Span::call_site())
    }
}

fn describe(ty: &TypeDesc) -> String {
    if ty.is_resolved() { ty.to_string() } else { "_".to_owned() }
}
