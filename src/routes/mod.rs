/// Router Module Index
///
/// Routes are split by the access level their handlers demand. Protection is
/// carried by the handlers' extractors (`AuthUser`, `AdminUser`), so a route
/// cannot be exposed without its guard by mounting it in the wrong router.
/// Routers sharing a path (e.g. `/items`) merge method by method.

/// Anonymous access: health, register/login and read-only listings.
pub mod public;

/// Any authenticated user.
pub mod authenticated;

/// Administrators only: item mutations.
pub mod admin;
