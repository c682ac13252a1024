use middleware::extractor::ExtractionMiddleware;

pub mod middleware {
    pub mod extractor;
}

/// Decodes session tokens and admin keys into request extensions.
pub fn middleware() -> ExtractionMiddleware {
    ExtractionMiddleware::new()
}
