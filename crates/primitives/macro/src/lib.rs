#![deny(missing_docs)]

//! Procedural macros for the `cairo-abi-primitives` crate.

use num_bigint::BigUint;
use num_traits::{Num, One};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::{parse_macro_input, LitStr, Token};

const DEFAULT_CRATE_PATH: &str = "::cairo_abi_primitives";

/// Input for the `felt!` and `address!` macros.
///
/// Supports two forms:
/// - `felt!("0x1234")` - uses default crate path `::cairo_abi_primitives`
/// - `felt!("0x1234", crate)` - uses custom crate path
struct MacroInput {
    value: LitStr,
    crate_path: TokenStream2,
}

impl Parse for MacroInput {
    fn parse(input: ParseStream<'_>) -> syn::Result<Self> {
        let value: LitStr = input.parse()?;

        let crate_path = if input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
            input.parse::<TokenStream2>()?
        } else {
            DEFAULT_CRATE_PATH.parse().expect("qed; valid path")
        };

        Ok(MacroInput { value, crate_path })
    }
}

/// P = 2^251 + 17 * 2^192 + 1
fn modulus() -> BigUint {
    (BigUint::one() << 251) + (BigUint::from(17u8) << 192) + BigUint::one()
}

fn parse_literal(lit: &LitStr) -> syn::Result<BigUint> {
    let raw = lit.value();
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) if hex.len() <= 64 => BigUint::from_str_radix(hex, 16).ok(),
        Some(_) => None,
        None => BigUint::from_str_radix(&raw, 10).ok(),
    };

    parsed.ok_or_else(|| syn::Error::new(lit.span(), format!("invalid field element literal `{raw}`")))
}

fn expand(input: MacroInput, bound: BigUint, type_name: &str) -> syn::Result<TokenStream2> {
    let MacroInput { value, crate_path } = input;
    let parsed = parse_literal(&value)?;

    if parsed >= bound {
        return Err(syn::Error::new(
            value.span(),
            format!("`{}` is out of range for {type_name}", value.value()),
        ));
    }

    let digits = parsed.to_bytes_be();
    let mut bytes = [0u8; 32];
    bytes[32 - digits.len()..].copy_from_slice(&digits);

    let ident = syn::Ident::new(type_name, proc_macro2::Span::call_site());
    Ok(quote! { #crate_path::#ident::from_raw([#(#bytes),*]) })
}

/// Defines a compile-time constant for a field element from its decimal or hexadecimal
/// representation. Literals that are not smaller than the field prime are rejected at
/// compile time.
///
/// # Examples
///
/// ```ignore
/// use cairo_abi_primitives::felt;
///
/// // From hexadecimal (uses default crate path)
/// let hex_felt = felt!("0x1234");
///
/// // From decimal
/// let dec_felt = felt!("42");
///
/// // With custom crate path (for use inside cairo-abi-primitives itself)
/// let internal_felt = felt!("0x1234", crate);
/// ```
#[proc_macro]
pub fn felt(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as MacroInput);
    expand(input, modulus(), "Felt252").unwrap_or_else(|e| e.to_compile_error()).into()
}

/// Defines a compile-time constant for a contract address from its decimal or hexadecimal
/// representation.
///
/// Contract addresses must be smaller than 2^251; anything else fails to compile.
///
/// # Examples
///
/// ```ignore
/// use cairo_abi_primitives::address;
///
/// const MY_CONTRACT: ContractAddress = address!("0x1234");
/// const INTERNAL: ContractAddress = address!("0x1234", crate);
/// ```
#[proc_macro]
pub fn address(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as MacroInput);
    expand(input, BigUint::one() << 251, "ContractAddress")
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
