/// Rendered error pages for the ErrorHandlers middleware.
use actix_web::dev::ServiceResponse;
use actix_web::http::header;
use actix_web::middleware::ErrorHandlerResponse;

fn error_page(title: &str, detail: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{title}</title></head>
<body>
    <h1>{title}</h1>
    <p>{detail}</p>
    <p><a href="/">Back to the front page</a></p>
</body>
</html>"#,
        title = title,
        detail = detail,
    )
}

fn render<B>(
    res: ServiceResponse<B>,
    title: &str,
    detail: &str,
) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let (req, res) = res.into_parts();
    let mut res = res.set_body(error_page(title, detail));
    res.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("text/html; charset=utf-8"),
    );

    let res = ServiceResponse::new(req, res)
        .map_into_boxed_body()
        .map_into_right_body();

    Ok(ErrorHandlerResponse::Response(res))
}

pub fn render_400<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    render(
        res,
        "Bad Request",
        "The request could not be understood. Check the form and try again.",
    )
}

pub fn render_404<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    render(
        res,
        "Page Not Found",
        "The page or item you were looking for does not exist.",
    )
}

pub fn render_500<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    render(
        res,
        "Something Went Wrong",
        "An internal error occurred. It has been logged; please try again later.",
    )
}
