use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_quote, FnArg, ItemFn, Pat, PatIdent, ReturnType};

/// Proc macro to denote a Probe
///
/// Turns an `async fn` returning `Result<R, E>` into an `async fn` returning
/// `rampload::InvocationOutcome`. The original body is timed; `Ok(r)` becomes an outcome whose
/// status and success flag come from `r` (see `rampload::ProbeStatus`), `Err(e)` becomes a failed
/// outcome carrying `e.to_string()`.
///
/// NOTE: Arguments must be plain identifiers (no destructuring patterns), and methods are not
/// supported.
///
/// # Example
/// ```ignore
/// use rampload::prelude::*;
///
/// #[probe]
/// async fn list_users(client: &reqwest::Client) -> Result<reqwest::StatusCode, reqwest::Error> {
///     let res = client.get("http://localhost:8080/database/users").send().await?;
///     Ok(res.status())
/// }
/// ```
#[proc_macro_attribute]
pub fn probe(attr: TokenStream, item: TokenStream) -> TokenStream {
    probe_internal(attr.into(), item.into())
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn probe_internal(attr: TokenStream2, item: TokenStream2) -> syn::Result<TokenStream2> {
    if !attr.is_empty() {
        return Err(syn::Error::new_spanned(attr, "#[probe] takes no arguments"));
    }

    let input = syn::parse2::<ItemFn>(item)?;
    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = input;

    if sig.asyncness.is_none() {
        return Err(syn::Error::new_spanned(
            sig.fn_token,
            "#[probe] can only be applied to async functions",
        ));
    }

    if matches!(sig.output, ReturnType::Default) {
        return Err(syn::Error::new_spanned(
            &sig,
            "#[probe] functions must return a `Result`",
        ));
    }

    let args = sig
        .inputs
        .iter()
        .map(|arg| match arg {
            FnArg::Receiver(receiver) => Err(syn::Error::new_spanned(
                receiver,
                "#[probe] does not support methods",
            )),
            FnArg::Typed(typed) => match &*typed.pat {
                Pat::Ident(PatIdent { ident, .. }) => Ok(ident.clone()),
                other => Err(syn::Error::new_spanned(
                    other,
                    "#[probe] arguments must be plain identifiers",
                )),
            },
        })
        .collect::<syn::Result<Vec<_>>>()?;

    let inner_name = format_ident!("__rampload_{}", sig.ident);
    let mut inner_sig = sig.clone();
    inner_sig.ident = inner_name.clone();

    let mut probe_sig = sig;
    probe_sig.output = parse_quote!(-> ::rampload::InvocationOutcome);

    Ok(quote! {
        #(#attrs)* #vis #probe_sig {
            ::rampload::probe::measure(#inner_name(#(#args),*)).await
        }

        #[doc(hidden)]
        #vis #inner_sig #block
    })
}
