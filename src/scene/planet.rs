//! Selection of the planet whose surface terrain is loaded.

/// Determine which planet's terrain to show.
///
/// On the web the `planet` query parameter of the page URL decides; natively
/// the first command line argument does. When no selection is present this
/// returns the literal string `"null"`, so the subsequent terrain load fails
/// with a clear file name and is logged and skipped like any other missing
/// asset.
#[cfg(target_arch = "wasm32")]
pub fn selected_planet() -> String {
    let param = web_sys::window()
        .and_then(|window| window.location().search().ok())
        .and_then(|search| web_sys::UrlSearchParams::new_with_str(&search).ok())
        .and_then(|params| params.get("planet"));
    param.unwrap_or_else(|| "null".to_string())
}

#[cfg(not(target_arch = "wasm32"))]
pub fn selected_planet() -> String {
    std::env::args()
        .nth(1)
        .unwrap_or_else(|| "null".to_string())
}
