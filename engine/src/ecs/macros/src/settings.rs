use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    Attribute, Expr, Ident, Path, Token, Visibility, braced, bracketed,
    parse::{Parse, ParseStream},
    parse_macro_input,
    punctuated::Punctuated,
};

struct SignatureDecl {
    attrs: Vec<Attribute>,
    name: Ident,
    members: Vec<Path>,
}

struct SettingsDecl {
    attrs: Vec<Attribute>,
    vis: Visibility,
    name: Ident,
    components: Vec<Path>,
    tags: Vec<Path>,
    signatures: Vec<SignatureDecl>,
    options: Option<Expr>,
}

fn parse_list(input: ParseStream) -> syn::Result<Vec<Path>> {
    let content;
    bracketed!(content in input);
    let items = Punctuated::<Path, Token![,]>::parse_terminated(&content)?;
    Ok(items.into_iter().collect())
}

impl Parse for SignatureDecl {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let name: Ident = input.parse()?;
        input.parse::<Token![:]>()?;
        let members = parse_list(input)?;
        Ok(Self { attrs, name, members })
    }
}

impl Parse for SettingsDecl {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let vis: Visibility = input.parse()?;
        input.parse::<Token![struct]>()?;
        let name: Ident = input.parse()?;

        let body;
        braced!(body in input);

        let mut components = None;
        let mut tags = None;
        let mut signatures = None;
        let mut options = None;

        while !body.is_empty() {
            let field: Ident = body.parse()?;
            body.parse::<Token![:]>()?;
            match field.to_string().as_str() {
                "components" if components.is_none() => components = Some(parse_list(&body)?),
                "tags" if tags.is_none() => tags = Some(parse_list(&body)?),
                "signatures" if signatures.is_none() => {
                    let content;
                    braced!(content in body);
                    let items = Punctuated::<SignatureDecl, Token![,]>::parse_terminated(&content)?;
                    signatures = Some(items.into_iter().collect());
                }
                "options" if options.is_none() => options = Some(body.parse()?),
                "components" | "tags" | "signatures" | "options" => {
                    return Err(syn::Error::new(field.span(), format!("`{field}` given twice")));
                }
                _ => {
                    return Err(syn::Error::new(
                        field.span(),
                        "expected one of `components`, `tags`, `signatures`, `options`",
                    ));
                }
            }
            if body.is_empty() {
                break;
            }
            body.parse::<Token![,]>()?;
        }

        Ok(Self {
            attrs,
            vis,
            name,
            components: components.unwrap_or_default(),
            tags: tags.unwrap_or_default(),
            signatures: signatures.unwrap_or_default(),
            options,
        })
    }
}

fn key(path: &Path) -> String {
    quote!(#path).to_string()
}

fn position(list: &[Path], path: &Path) -> Option<usize> {
    let wanted = key(path);
    list.iter().position(|p| key(p) == wanted)
}

fn check_unique(list: &[Path], what: &str) -> syn::Result<()> {
    for (i, path) in list.iter().enumerate() {
        if position(&list[..i], path).is_some() {
            return Err(syn::Error::new_spanned(path, format!("duplicate {what} `{}`", key(path))));
        }
    }
    Ok(())
}

impl SettingsDecl {
    fn validate(&self) -> syn::Result<()> {
        check_unique(&self.components, "component")?;
        check_unique(&self.tags, "tag")?;

        for tag in &self.tags {
            if position(&self.components, tag).is_some() {
                return Err(syn::Error::new_spanned(
                    tag,
                    format!("`{}` is declared as both a component and a tag", key(tag)),
                ));
            }
        }

        for (i, sig) in self.signatures.iter().enumerate() {
            if self.signatures[..i].iter().any(|other| other.name == sig.name) {
                return Err(syn::Error::new(sig.name.span(), format!("duplicate signature `{}`", sig.name)));
            }
            check_unique(&sig.members, "signature member")?;
            for member in &sig.members {
                if position(&self.components, member).is_none() && position(&self.tags, member).is_none() {
                    return Err(syn::Error::new_spanned(
                        member,
                        format!("`{}` is neither a component nor a tag of `{}`", key(member), self.name),
                    ));
                }
            }
        }
        Ok(())
    }

    fn expand(&self) -> TokenStream2 {
        let Self {
            attrs,
            vis,
            name,
            components,
            tags,
            signatures,
            options,
        } = self;

        let storage = format_ident!("{}Components", name);
        let columns: Vec<Ident> = (0..components.len()).map(|i| format_ident!("c{}", i)).collect();

        let component_count = components.len();
        let tag_count = tags.len();
        let signature_count = signatures.len();

        let sig_names = signatures.iter().map(|sig| &sig.name);
        let sig_attrs = signatures.iter().map(|sig| &sig.attrs);

        let bit_rows = signatures.iter().map(|sig| {
            let bits = sig.members.iter().map(|member| {
                if position(components, member).is_some() {
                    quote!(::meme_engine::ecs::component_bit::<#name, #member>())
                } else {
                    quote!(::meme_engine::ecs::tag_bit::<#name, #member>())
                }
            });
            quote!(&[#(#bits),*] as &[usize])
        });

        let options_fn = options.as_ref().map(|expr| {
            quote! {
                fn options() -> ::meme_engine::ecs::Options {
                    #expr
                }
            }
        });

        let component_impls = components.iter().zip(&columns).enumerate().map(|(id, (ty, column))| {
            quote! {
                impl ::meme_engine::ecs::HasComponent<#ty> for #name {
                    const ID: usize = #id;

                    #[inline]
                    fn column(storage: &#storage) -> &::meme_engine::memory::AllocVec<#ty> {
                        &storage.#column
                    }

                    #[inline]
                    fn column_mut(storage: &mut #storage) -> &mut ::meme_engine::memory::AllocVec<#ty> {
                        &mut storage.#column
                    }
                }
            }
        });

        let tag_impls = tags.iter().enumerate().map(|(id, ty)| {
            quote! {
                impl ::meme_engine::ecs::HasTag<#ty> for #name {
                    const ID: usize = #id;
                }
            }
        });

        let signature_impls = signatures.iter().enumerate().map(|(id, sig)| {
            let sig_name = &sig.name;
            let fetched: Vec<(&Path, &Ident)> = sig
                .members
                .iter()
                .filter_map(|member| position(components, member).map(|i| (member, &columns[i])))
                .collect();
            let types = fetched.iter().map(|(ty, _)| ty);
            let fields: Vec<&Ident> = fetched.iter().map(|(_, column)| *column).collect();

            let (storage_arg, row_arg) = if fields.is_empty() {
                (quote!(_storage), quote!(_row))
            } else {
                (quote!(storage), quote!(row))
            };
            let body = if fields.is_empty() {
                quote!(())
            } else {
                quote! {
                    let #storage { #(#fields,)* .. } = storage;
                    (#(&mut #fields[row],)*)
                }
            };

            quote! {
                impl ::meme_engine::ecs::HasSignature<#sig_name> for #name {
                    const ID: usize = #id;

                    type Fetch<'a> = (#(&'a mut #types,)*);

                    #[inline]
                    fn fetch(#storage_arg: &mut #storage, #row_arg: usize) -> Self::Fetch<'_> {
                        #body
                    }
                }
            }
        });

        let allocator_guard = columns.is_empty().then(|| quote!(let _ = &alloc;));
        let capacity_guard = columns.is_empty().then(|| quote!(let _ = capacity;));

        quote! {
            #(#attrs)*
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
            #vis struct #name;

            #(
                #(#sig_attrs)*
                #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
                #vis struct #sig_names;
            )*

            #[allow(dead_code)]
            #vis struct #storage {
                #(#columns: ::meme_engine::memory::AllocVec<#components>,)*
            }

            impl ::meme_engine::ecs::ComponentStorage for #storage {
                fn new_in(alloc: ::meme_engine::memory::Allocator) -> Self {
                    #allocator_guard
                    Self {
                        #(#columns: ::meme_engine::memory::AllocVec::new_in(alloc.clone()),)*
                    }
                }

                fn grow_to(&mut self, capacity: usize) {
                    #capacity_guard
                    #(
                        self.#columns.reserve_exact(capacity.saturating_sub(self.#columns.len()));
                        while self.#columns.len() < capacity {
                            self.#columns.push(::core::default::Default::default());
                        }
                    )*
                }
            }

            impl ::meme_engine::ecs::Settings for #name {
                type Storage = #storage;
                type Blocks = [u64; ::meme_engine::ecs::words_for(#component_count + #tag_count)];

                const COMPONENT_COUNT: usize = #component_count;
                const TAG_COUNT: usize = #tag_count;
                const SIGNATURE_COUNT: usize = #signature_count;

                fn signature_bitsets() -> &'static ::meme_engine::ecs::SignatureBitsets<Self::Blocks> {
                    static BITSETS: ::std::sync::OnceLock<::meme_engine::ecs::SignatureBitsets<[u64; ::meme_engine::ecs::words_for(#component_count + #tag_count)]>> =
                        ::std::sync::OnceLock::new();
                    BITSETS.get_or_init(|| {
                        let table: &[&[usize]] = &[#(#bit_rows),*];
                        ::meme_engine::ecs::SignatureBitsets::build(
                            <Self as ::meme_engine::ecs::Settings>::BIT_COUNT,
                            table,
                        )
                    })
                }

                #options_fn
            }

            #(#component_impls)*
            #(#tag_impls)*
            #(#signature_impls)*
        }
    }
}

pub fn ecs_settings(input: TokenStream) -> TokenStream {
    let decl = parse_macro_input!(input as SettingsDecl);

    if let Err(err) = decl.validate() {
        return err.to_compile_error().into();
    }

    decl.expand().into()
}
