use axum::body::to_bytes;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::Response;
use std::time::Duration;

use crate::shared::format::format_number;

fn print_line(status: StatusCode, method: &Method, uri: &Uri, elapsed: Duration, size: &str) {
    // голубой для 200, коричневый для остальных
    let color_code = if status == StatusCode::OK { "36" } else { "33" };
    println!(
        "\x1b[{}m{}\x1b[0m | {:>5}ms | {:>12} | {} {:>6} {}",
        color_code,
        chrono::Local::now().format("%H:%M:%S"),
        elapsed.as_millis(),
        size,
        status.as_u16(),
        method,
        uri.path()
    );
}

/// Middleware для логирования HTTP запросов
///
/// Выводит в консоль локальное время, длительность, размер ответа,
/// статус, метод и путь.
pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let start = std::time::Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();

    let response = next.run(req).await;
    let (parts, body) = response.into_parts();

    // Читаем тело ответа, чтобы узнать реальный размер
    match to_bytes(body, usize::MAX).await {
        Ok(bytes) => {
            print_line(
                parts.status,
                &method,
                &uri,
                start.elapsed(),
                &format_number(bytes.len()),
            );
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(e) => {
            tracing::warn!("Failed to read response body for {}: {}", uri.path(), e);
            print_line(parts.status, &method, &uri, start.elapsed(), "error");
            Response::from_parts(parts, Body::default())
        }
    }
}
