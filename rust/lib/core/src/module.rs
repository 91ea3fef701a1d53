use axum::Router;

/// A service module that contributes HTTP routes.
///
/// The binary collects every module and merges their routers into the
/// application router.
pub trait Module: Send + Sync {
    /// Module name, used for logging.
    fn name(&self) -> &str;

    /// The module's routes, already carrying their own prefix.
    fn routes(&self) -> Router;
}
