//! Just a few helper functions for Http Responses

/**
 * Returns a httpResponse with the message attached as json
 *
 * Use it like this:
 * ```ignore
 *  NotFound!("CEP não encontrado")
 *  Unauthorized!("Sessão ausente", "redirect" => "/login")
 * ```
 *
 * Additional `key => value` pairs end up next to the message in the body.
 */
#[macro_use]
pub mod res {
    #[macro_export]
    macro_rules! buildRes {
        ($res_builder:expr, $message:expr) => {
            $res_builder.json(::serde_json::json!({"message": $message}))
        };
        ($res_builder:expr, $message:expr, $($key:literal => $value:expr),+) => {{
            let mut body = ::serde_json::json!({"message": $message});
            $( body[$key] = ::serde_json::json!($value); )+
            $res_builder.json(body)
        }};
    }
    #[macro_export]
    macro_rules! Unauthorized {
        ($($args:tt)+) => {
            $crate::buildRes!(::actix_web::HttpResponse::Unauthorized(), $($args)+)
        };
    }
    #[macro_export]
    macro_rules! NotFound {
        ($($args:tt)+) => {
            $crate::buildRes!(::actix_web::HttpResponse::NotFound(), $($args)+)
        };
    }
    #[macro_export]
    macro_rules! Conflict {
        ($($args:tt)+) => {
            $crate::buildRes!(::actix_web::HttpResponse::Conflict(), $($args)+)
        };
    }
    #[macro_export]
    macro_rules! Forbidden {
        ($($args:tt)+) => {
            $crate::buildRes!(::actix_web::HttpResponse::Forbidden(), $($args)+)
        };
    }
    #[macro_export]
    macro_rules! BadRequest {
        ($($args:tt)+) => {
            $crate::buildRes!(::actix_web::HttpResponse::BadRequest(), $($args)+)
        };
    }
    #[macro_export]
    macro_rules! Unavailable {
        ($($args:tt)+) => {
            $crate::buildRes!(::actix_web::HttpResponse::ServiceUnavailable(), $($args)+)
        };
    }
    #[macro_export]
    macro_rules! InternalServer {
        ($($args:tt)+) => {
            $crate::buildRes!(::actix_web::HttpResponse::InternalServerError(), $($args)+)
        };
    }
}
