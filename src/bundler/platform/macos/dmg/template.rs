//! Finder layout scripts.
//!
//! Rendered with Handlebars. AppleScript list braces are written with an
//! inner space (`{ {{left}}, ... }`) so they never form a triple-stash.

use crate::bundler::{
    error::{Error, Result},
    settings::Settings,
};
use handlebars::Handlebars;

/// Window presentation: view mode, chrome, bounds, icon options, background.
pub const WINDOW_TEMPLATE: &str = r#"tell application "Finder"
    tell disk "{{volume_name}}"
        open
        set current view of container window to icon view
        set toolbar visible of container window to false
        set statusbar visible of container window to false
        set the bounds of container window to { {{left}}, {{top}}, {{right}}, {{bottom}} }
        set viewOptions to the icon view options of container window
        set arrangement of viewOptions to not arranged
        set icon size of viewOptions to {{icon_size}}
        set background picture of viewOptions to file ".background:{{background}}"
    end tell
end tell
"#;

/// Icon placement for the app bundle and the Applications shortcut.
pub const ICONS_TEMPLATE: &str = r#"tell application "Finder"
    tell disk "{{volume_name}}"
        set position of item "{{app_name}}" of container window to { {{app_x}}, {{app_y}} }
        set position of item "Applications" of container window to { {{applications_x}}, {{applications_y}} }
        update without registering applications
        close
    end tell
end tell
"#;

/// Rendered layout scripts, run in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutScripts {
    pub window: String,
    pub icons: String,
}

/// Escape special characters for AppleScript string literals
///
/// Escapes backslashes and double quotes to prevent script injection
/// and syntax errors when product names contain special characters.
pub fn escape_applescript_string(s: &str) -> String {
    s.replace('\\', r"\\").replace('"', r#"\""#)
}

/// Render both layout scripts from the settings.
pub fn render_layout_scripts(settings: &Settings) -> Result<LayoutScripts> {
    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(true);
    handlebars.register_escape_fn(escape_applescript_string);

    let dmg = settings.dmg();
    let [left, top, right, bottom] = dmg.window_bounds;
    let background_path = settings.background_path();
    let background = background_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            Error::InvalidConfig(format!(
                "background image path {} has no UTF-8 file name",
                background_path.display()
            ))
        })?;

    let data = serde_json::json!({
        "volume_name": settings.product_name(),
        "app_name": settings.app_bundle_name(),
        "left": left,
        "top": top,
        "right": right,
        "bottom": bottom,
        "icon_size": dmg.icon_size,
        "background": background,
        "app_x": dmg.app_position.0,
        "app_y": dmg.app_position.1,
        "applications_x": dmg.applications_position.0,
        "applications_y": dmg.applications_position.1,
    });

    Ok(LayoutScripts {
        window: handlebars.render_template(WINDOW_TEMPLATE, &data)?,
        icons: handlebars.render_template(ICONS_TEMPLATE, &data)?,
    })
}
