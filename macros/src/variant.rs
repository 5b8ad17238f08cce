use proc_macro2::TokenStream;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::spanned::Spanned;
use syn::{Attribute, Error, Expr, Ident, LitStr, Result, Token, Type, braced};

pub struct Variant {
    pub attributes: Vec<Attribute>,
    pub message: LitStr,
    pub name: Ident,
    pub fields: Vec<(Ident, Type)>,
    pub level: Expr,
}

pub struct EnumInput {
    pub name: Ident,
    pub variants: Vec<Variant>,
}

impl Parse for EnumInput {
    fn parse(input: ParseStream) -> Result<Self> {
        let name = input.parse::<Ident>()?;

        let content;
        braced!(content in input);

        let mut variants = Vec::new();
        while !content.is_empty() {
            variants.push(content.parse::<Variant>()?);
            if content.peek(Token![,]) {
                content.parse::<Token![,]>()?;
            }
        }

        Ok(EnumInput { name, variants })
    }
}

impl Parse for Variant {
    fn parse(input: ParseStream) -> Result<Self> {
        let attributes = input.call(Attribute::parse_outer)?;

        let error_attr = attributes
            .iter()
            .find(|attr| attr.path().is_ident("error"))
            .ok_or_else(|| Error::new(input.span(), "Missing #[error] attribute"))?;
        let message = match &error_attr.meta {
            syn::Meta::List(list) => syn::parse2::<LitStr>(list.tokens.clone())?,
            _ => {
                return Err(Error::new(
                    error_attr.span(),
                    "Invalid error attribute format",
                ));
            }
        };

        let name = input.parse::<Ident>()?;

        let mut fields = Vec::new();
        if input.peek(syn::token::Brace) {
            let fields_content;
            braced!(fields_content in input);
            while !fields_content.is_empty() {
                let field_name = fields_content.parse::<Ident>()?;
                fields_content.parse::<Token![:]>()?;
                let field_type = fields_content.parse::<Type>()?;
                fields.push((field_name, field_type));
                if fields_content.peek(Token![,]) {
                    fields_content.parse::<Token![,]>()?;
                }
            }
        }

        input.parse::<Token![=>]>()?;
        let level = input.parse::<Expr>()?;

        Ok(Variant {
            attributes,
            message,
            name,
            fields,
            level,
        })
    }
}

impl Variant {
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|attr| attr.path().is_ident(name))
    }

    pub fn docs(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes
            .iter()
            .filter(|attr| attr.path().is_ident("doc"))
    }

    /// `DatabaseConnectFailed` -> `database_connect_failed`
    pub fn constructor_name(&self) -> Ident {
        let source = self.name.to_string();
        let mut snake = String::with_capacity(source.len() + 4);
        for (index, ch) in source.chars().enumerate() {
            if ch.is_uppercase() {
                if index != 0 {
                    snake.push('_');
                }
                snake.extend(ch.to_lowercase());
            } else {
                snake.push(ch);
            }
        }
        Ident::new(&snake, self.name.span())
    }
}

pub fn log_method() -> TokenStream {
    quote! {
        #[allow(dead_code)]
        pub fn log(&self) {
            let message = self.to_string();
            match self.level() {
                tracing::Level::ERROR => tracing::error!("{}", message),
                tracing::Level::WARN => tracing::warn!("{}", message),
                tracing::Level::INFO => tracing::info!("{}", message),
                tracing::Level::DEBUG => tracing::debug!("{}", message),
                tracing::Level::TRACE => tracing::trace!("{}", message),
            }
        }
    }
}
