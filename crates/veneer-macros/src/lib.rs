// veneer-macros: build-time proxy descriptors
//
// Provides the #[proxyable] attribute, applied to an inherent impl block.
// It registers the type's constructors and methods with the proxy engine and
// generates a typed extension trait for proxy instances.
//
// Example:
// ```
// use veneer_engine::proxyable;
//
// pub struct Bag { items: Vec<String> }
//
// #[proxyable]
// impl Bag {
//     pub fn new() -> Self { Bag { items: Vec::new() } }
//     pub fn add(&mut self, item: String) -> bool { self.items.push(item); true }
//     #[proxy(final)]
//     pub fn len(&self) -> usize { self.items.len() }
// }
// ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, ItemImpl};

mod classify;
mod proxyable;

/// Registers an inherent impl block as a proxy target.
///
/// Generates:
/// - The original impl block, minus any `#[proxy(...)]` method attributes
/// - `impl veneer_engine::Proxyable` describing every constructor and method,
///   with a direct "super" thunk for each method whose types can cross the
///   `Value` boundary
/// - A public extension trait (`<Type>Proxy` by default) implemented for
///   `ProxyInstance<Type, I>` so proxies are called like the original type
///
/// # Attribute arguments
///
/// - `sealed` - the type cannot be proxied
/// - `name = "..."` - qualified name override
/// - `wrapper = Ident` - name of the generated extension trait
///
/// # Method attributes
///
/// - `#[proxy(final)]` - never intercepted
/// - `#[proxy(skip)]` - left out of the declared surface entirely
///
/// # Example
///
/// ```ignore
/// #[proxyable(wrapper = AccountOps)]
/// impl Account {
///     pub fn open(owner: String) -> Self { ... }
///     pub fn deposit(&mut self, amount: u64) -> Result<u64, LimitExceeded> { ... }
///     #[proxy(final)]
///     pub fn owner(&self) -> String { ... }
/// }
/// ```
#[proc_macro_attribute]
pub fn proxyable(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut args = proxyable::ProxyableArgs::default();
    let parser = syn::meta::parser(|meta| args.parse(meta));
    parse_macro_input!(attr with parser);

    let input = parse_macro_input!(item as ItemImpl);
    proxyable::expand_proxyable(args, input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
