use std::sync::Arc;

use eframe::egui;

/// System fonts with CJK coverage, tried in order.
const CJK_FONT_PATHS: &[&str] = &[
    "/System/Library/Fonts/PingFang.ttc",
    "/System/Library/Fonts/STHeiti Light.ttc",
    "C:\\Windows\\Fonts\\msyh.ttc",
    "C:\\Windows\\Fonts\\simhei.ttf",
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
];

/// egui's bundled fonts have no Han glyphs; append the first CJK system font
/// found as a fallback for both families.
pub fn install_cjk_fonts(ctx: &egui::Context) {
    let mut fonts = egui::FontDefinitions::default();

    let Some((path, data)) = CJK_FONT_PATHS
        .iter()
        .find_map(|path| std::fs::read(path).ok().map(|data| (path, data)))
    else {
        log::warn!("No CJK font found; place names may render as boxes");
        return;
    };

    fonts
        .font_data
        .insert("cjk".to_owned(), Arc::new(egui::FontData::from_owned(data)));
    for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
        fonts.families.entry(family).or_default().push("cjk".to_owned());
    }
    log::info!("Using CJK font {path}");
    ctx.set_fonts(fonts);
}
