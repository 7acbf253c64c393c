/// Request logging
///
/// Each request gets a fresh id. The id is returned in `x-request-id`, used
/// as `error_id` in error bodies and attached to every log event emitted
/// while the request is served.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use log::{debug, info, warn};
use std::rc::Rc;
use std::time::Instant;
use uuid::Uuid;

use crate::auth::RequestUser;
use crate::error::with_request_id;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Logs method, path, status, latency and the authenticated user of every
/// request. Query strings and headers are left out: they can carry
/// credentials.
pub struct LoggerMiddleware;

impl<S, B> Transform<S, ServiceRequest> for LoggerMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = LoggerMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(LoggerMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct LoggerMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for LoggerMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let started = Instant::now();
        let request_id = Uuid::new_v4().to_string();
        let route = format!("{} {}", req.method(), req.path());

        debug!("[{}] {} started", request_id, route);

        let service = self.service.clone();

        Box::pin(async move {
            let mut res = with_request_id(request_id.clone(), service.call(req)).await?;

            let user = res
                .request()
                .extensions()
                .get::<RequestUser>()
                .map(|u| u.0.to_string())
                .unwrap_or_else(|| "-".to_string());
            let status = res.status().as_u16();
            let millis = started.elapsed().as_millis();

            if res.status().is_server_error() {
                warn!("[{}] {} failed: {} user={} ({}ms)", request_id, route, status, user, millis);
            } else {
                info!("[{}] {} -> {} user={} ({}ms)", request_id, route, status, user, millis);
            }

            if let Ok(value) = HeaderValue::from_str(&request_id) {
                res.headers_mut()
                    .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
            }

            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, AuthError};
    use actix_web::{test, web, App, HttpResponse};

    #[actix_web::test]
    async fn test_response_carries_request_id() {
        let app = test::init_service(
            App::new()
                .wrap(LoggerMiddleware)
                .route("/teapot", web::get().to(|| async { HttpResponse::ImATeapot().finish() })),
        )
        .await;

        let req = test::TestRequest::get().uri("/teapot?token=secret").to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status().as_u16(), 418);
        let id = res.headers().get(REQUEST_ID_HEADER).unwrap().to_str().unwrap();
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[actix_web::test]
    async fn test_error_id_matches_request_id_header() {
        let app = test::init_service(App::new().wrap(LoggerMiddleware).route(
            "/fail",
            web::get().to(|| async {
                Err::<HttpResponse, AppError>(AuthError::InvalidCredentials.into())
            }),
        ))
        .await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/fail").to_request()).await;

        assert_eq!(res.status().as_u16(), 401);
        let id = res.headers().get(REQUEST_ID_HEADER).unwrap().to_str().unwrap().to_string();
        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["error_id"], id);
    }
}
