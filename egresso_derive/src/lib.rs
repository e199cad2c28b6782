use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, ItemFn};

/// Guards an actix handler behind a valid session.
///
/// The handler needs a `req: HttpRequest` and a `data: web::Data<AppState>`
/// argument and has to return `Result<_, AppError>`. Inside the body the
/// current session is available as `session`.
///
/// ```ignore
/// #[ensure_session]
/// pub async fn me(req: HttpRequest, data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
///     Ok(HttpResponse::Ok().json(session))
/// }
/// ```
#[proc_macro_attribute]
pub fn ensure_session(_attr: TokenStream, item: TokenStream) -> TokenStream {
    ensure_session_impl(item)
}

fn ensure_session_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as ItemFn);

    let ItemFn {
        sig,
        vis,
        block,
        attrs,
    } = input;

    let statements = block.stmts;

    // Reconstruct the function as output using parsed input
    quote!(
        #(#attrs)*
        #vis #sig {
            let session = match egresso::auth::require_session(&req, &data).await {
                Ok(s) => s,
                Err(e) => return Err(e)
            };

            #(#statements)*
        }
    )
    .into()
}
